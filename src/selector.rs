//! Next-task selection.

use crate::catalog::TaskRecord;

/// First non-deferred task in catalog order that is neither passed nor
/// blocked.
///
/// `None` means every eligible task is finished, which callers report
/// differently from an empty catalog.
///
/// # Example
///
/// ```
/// use ralph_ledger::catalog::TaskRecord;
/// use ralph_ledger::selector::next_task;
///
/// let tasks = vec![
///     TaskRecord::new("1.1", "P1", "Build", "Build X"),
///     TaskRecord::new("1.2", "P1", "Later", "Deferred: Y"),
/// ];
/// assert_eq!(next_task(&tasks, "Deferred").unwrap().id, "1.1");
/// ```
#[must_use]
pub fn next_task<'a>(tasks: &'a [TaskRecord], deferred_marker: &str) -> Option<&'a TaskRecord> {
    tasks
        .iter()
        .filter(|t| !t.is_deferred(deferred_marker))
        .find(|t| !t.passes && !t.blocked)
}
