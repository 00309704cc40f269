//! Catalog statistics.
//!
//! Pure functions of a task list. Deferred tasks are counted separately and
//! contribute to nothing else.

use serde::Serialize;

use crate::catalog::TaskRecord;

/// Aggregate task counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// Non-deferred tasks
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub blocked: usize,
    pub deferred: usize,
}

impl TaskStats {
    /// Count a task list.
    ///
    /// Each non-deferred task adds to `total` and to at most one of
    /// `completed`, `blocked`, `in_progress`, checked in that order.
    ///
    /// # Example
    ///
    /// ```
    /// use ralph_ledger::catalog::TaskRecord;
    /// use ralph_ledger::stats::TaskStats;
    ///
    /// let tasks = vec![
    ///     TaskRecord::new("1.1", "P1", "Build", "Build X"),
    ///     TaskRecord::new("1.2", "P1", "Later", "Deferred: Y"),
    /// ];
    /// let stats = TaskStats::compute(&tasks, "Deferred");
    /// assert_eq!((stats.total, stats.deferred, stats.remaining()), (1, 1, 1));
    /// ```
    #[must_use]
    pub fn compute(tasks: &[TaskRecord], deferred_marker: &str) -> Self {
        let mut stats = Self::default();
        for task in tasks {
            if task.is_deferred(deferred_marker) {
                stats.deferred += 1;
                continue;
            }
            stats.total += 1;
            if task.passes {
                stats.completed += 1;
            } else if task.blocked {
                stats.blocked += 1;
            } else if task.in_progress {
                stats.in_progress += 1;
            }
        }
        stats
    }

    /// Tasks neither completed nor blocked
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total - self.completed - self.blocked
    }

    /// Completion percentage, 0.0 for an empty catalog
    #[must_use]
    pub fn completion_pct(&self) -> f64 {
        percent(self.completed, self.total)
    }
}

/// Completion of one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseProgress {
    pub phase: String,
    pub total: usize,
    pub completed: usize,
}

impl PhaseProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }

    #[must_use]
    pub fn completion_pct(&self) -> f64 {
        percent(self.completed, self.total)
    }

    /// Ten-cell progress bar, one filled cell per full 10%.
    ///
    /// ```
    /// use ralph_ledger::stats::PhaseProgress;
    ///
    /// let p = PhaseProgress { phase: "P1".into(), total: 3, completed: 1 };
    /// assert_eq!(p.bar(), "███░░░░░░░");
    /// ```
    #[must_use]
    pub fn bar(&self) -> String {
        let filled = ((self.completion_pct() / 10.0) as usize).min(10);
        format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
    }
}

/// Group non-deferred tasks by phase, in order of first appearance.
#[must_use]
pub fn phase_breakdown(tasks: &[TaskRecord], deferred_marker: &str) -> Vec<PhaseProgress> {
    let mut phases: Vec<PhaseProgress> = Vec::new();
    for task in tasks.iter().filter(|t| !t.is_deferred(deferred_marker)) {
        let idx = match phases.iter().position(|p| p.phase == task.phase) {
            Some(idx) => idx,
            None => {
                phases.push(PhaseProgress {
                    phase: task.phase.clone(),
                    total: 0,
                    completed: 0,
                });
                phases.len() - 1
            }
        };
        phases[idx].total += 1;
        if task.passes {
            phases[idx].completed += 1;
        }
    }
    phases
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, phase: &str, action: &str) -> TaskRecord {
        TaskRecord::new(id, phase, format!("Task {id}"), action)
    }

    fn mixed_catalog() -> Vec<TaskRecord> {
        let mut done = task("1.1", "P1", "a");
        done.passes = true;
        let mut blocked = task("1.2", "P1", "b");
        blocked.blocked = true;
        blocked.in_progress = true;
        let mut running = task("2.1", "P2", "c");
        running.in_progress = true;
        let idle = task("2.2", "P2", "d");
        let mut deferred_done = task("3.1", "P3", "Deferred until v2");
        deferred_done.passes = true;
        vec![done, blocked, running, idle, deferred_done]
    }

    #[test]
    fn test_counts_each_task_once() {
        let stats = TaskStats::compute(&mixed_catalog(), "Deferred");
        assert_eq!(
            stats,
            TaskStats {
                total: 4,
                completed: 1,
                in_progress: 1,
                blocked: 1,
                deferred: 1,
            }
        );
        assert_eq!(stats.remaining(), 2);
    }

    #[test]
    fn test_count_invariants_hold() {
        let catalog = mixed_catalog();
        let stats = TaskStats::compute(&catalog, "Deferred");
        assert!(stats.completed + stats.blocked + stats.in_progress <= stats.total);
        assert_eq!(stats.total + stats.deferred, catalog.len());
    }

    #[test]
    fn test_empty_catalog_percentage_is_zero() {
        let stats = TaskStats::compute(&[], "Deferred");
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_pct(), 0.0);
    }

    #[test]
    fn test_phase_breakdown_order_and_deferred_skip() {
        let phases = phase_breakdown(&mixed_catalog(), "Deferred");
        let names: Vec<_> = phases.iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2"]);
        assert_eq!((phases[0].completed, phases[0].total), (1, 2));
        assert!(!phases[1].is_complete());
    }

    #[test]
    fn test_bar_full_and_empty() {
        let full = PhaseProgress {
            phase: "P".into(),
            total: 2,
            completed: 2,
        };
        assert_eq!(full.bar(), "██████████");
        assert!(full.is_complete());

        let empty = PhaseProgress {
            phase: "P".into(),
            total: 4,
            completed: 0,
        };
        assert_eq!(empty.bar(), "░░░░░░░░░░");
    }
}
