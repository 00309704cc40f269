//! Task-list report generation.
//!
//! The report is a markdown scratchpad rebuilt from scratch after every
//! mutating command. Nothing reads it back; deleting it loses nothing the
//! ledger needs.

use chrono::{DateTime, Local};
use std::fmt::Write as _;

use crate::catalog::{TaskCatalog, TaskRecord, TaskState};
use crate::config::{LedgerConfig, Workspace};
use crate::error::Result;
use crate::state::{HistoryEntry, RunState};
use crate::stats::TaskStats;
use crate::timestamp::Timestamp;

/// The "Current Task" block of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentTaskBlock {
    pub heading: String,
    pub status: String,
    pub notes: String,
    pub blockers: String,
    pub next_steps: String,
}

impl CurrentTaskBlock {
    /// Derive the block from the claimed task, if any.
    ///
    /// # Example
    ///
    /// ```
    /// use ralph_ledger::report::CurrentTaskBlock;
    ///
    /// let idle = CurrentTaskBlock::from_task(None);
    /// assert_eq!(idle.heading, "None");
    /// assert_eq!(idle.status, "Ready to begin");
    /// ```
    #[must_use]
    pub fn from_task(task: Option<&TaskRecord>) -> Self {
        let Some(task) = task else {
            return Self {
                heading: "None".to_string(),
                status: "Ready to begin".to_string(),
                notes: "- Awaiting task assignment".to_string(),
                blockers: "- None".to_string(),
                next_steps: "- Begin next task".to_string(),
            };
        };

        let blocked = task.blocked;
        let status = if blocked {
            TaskState::Blocked.to_string()
        } else if task.in_progress {
            TaskState::InProgress.to_string()
        } else {
            TaskState::Pending.to_string()
        };
        let blockers = if blocked {
            format!("- Task {} requires supervisor review", task.id)
        } else {
            "- None".to_string()
        };

        Self {
            heading: format!("{} - {}", task.id, task.title),
            status,
            notes: format!("- Working on: {}", task.action),
            blockers,
            next_steps: format!("- Complete {}", task.id),
        }
    }
}

/// Everything the report renders, collected up front.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub project_name: String,
    pub milestone: String,
    pub protocol: String,
    pub generated_at: DateTime<Local>,
    pub stats: TaskStats,
    pub phase: String,
    pub current: CurrentTaskBlock,
    /// `(id, title)` of passed tasks in catalog order
    pub completed: Vec<(String, String)>,
    /// Most recent first, already limited
    pub history: Vec<HistoryEntry>,
    pub history_limit: usize,
}

impl ReportData {
    /// Collect report data for the state's active mode.
    #[must_use]
    pub fn collect(
        config: &LedgerConfig,
        state: &RunState,
        catalog: &TaskCatalog,
        generated_at: DateTime<Local>,
    ) -> Self {
        let profile = config.profile(state.mode);
        let stats = TaskStats::compute(&catalog.tasks, &config.deferred_marker);

        let current_task = state.current_task.as_deref().and_then(|id| {
            let found = catalog.get(id);
            if found.is_none() {
                tracing::warn!(task = id, "Current task missing from catalog");
            }
            found
        });

        Self {
            project_name: profile.project_name.clone(),
            milestone: profile.milestone.clone(),
            protocol: config.protocol.clone(),
            generated_at,
            stats,
            phase: state.phase_label().to_string(),
            current: CurrentTaskBlock::from_task(current_task),
            completed: catalog
                .tasks
                .iter()
                .filter(|t| t.passes)
                .map(|t| (t.id.clone(), t.title.clone()))
                .collect(),
            history: state
                .recent_history(config.history_limit)
                .cloned()
                .collect(),
            history_limit: config.history_limit,
        }
    }
}

/// Render the markdown report.
#[must_use]
pub fn render_markdown(data: &ReportData) -> String {
    let stats = &data.stats;
    let completed = if data.completed.is_empty() {
        "_(No tasks completed yet)_".to_string()
    } else {
        data.completed
            .iter()
            .map(|(id, title)| format!("- [x] **{id}**: {title}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut out = format!(
        "# AI Agent Task List (Personal Notes)

**Project:** {project}{br}
**Milestone:** {milestone}{br}
**Protocol:** {protocol}{br}
**Last Updated:** {updated}

---

## Progress Overview
- **Total Tasks:** {total} (excl. {deferred} deferred)
- **Completed:** {done}
- **In Progress:** {running}
- **Blocked:** {blocked}
- **Remaining:** {remaining}

---

## Current Task: {heading}
**Status:** {status}{br}
**Phase:** {phase}

### Implementation Notes:
{notes}

### Blockers:
{blockers}

### Next Steps:
{next_steps}

---

## Completed Tasks Summary:
{completed}

---

## Execution History (Last {limit}):
| Timestamp | Task | Action | Result |
|-----------|------|--------|--------|
",
        project = data.project_name,
        milestone = data.milestone,
        protocol = data.protocol,
        updated = data.generated_at.format("%Y-%m-%d %H:%M"),
        total = stats.total,
        deferred = stats.deferred,
        done = stats.completed,
        running = stats.in_progress,
        blocked = stats.blocked,
        remaining = stats.remaining(),
        heading = data.current.heading,
        status = data.current.status,
        phase = data.phase,
        notes = data.current.notes,
        blockers = data.current.blockers,
        next_steps = data.current.next_steps,
        completed = completed,
        limit = data.history_limit,
        br = "  ",
    );

    for entry in &data.history {
        let ts = entry
            .timestamp
            .as_ref()
            .map(Timestamp::minutes)
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            ts,
            entry.task_label(),
            entry.action,
            entry.result
        );
    }

    if data.history.is_empty() {
        out.push_str("| - | - | Initialized | Ready |\n");
    }

    out
}

/// Regenerate the report for the state's active mode, overwriting it.
pub fn write_report(workspace: &Workspace, state: &RunState, catalog: &TaskCatalog) -> Result<()> {
    let data = ReportData::collect(workspace.config(), state, catalog, Local::now());
    let path = workspace.report_path(state.mode);
    std::fs::write(&path, render_markdown(&data))?;
    tracing::debug!(path = %path.display(), "Regenerated task list report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn catalog() -> TaskCatalog {
        let mut done = TaskRecord::new("1.1", "Phase 1", "Schema", "Create tables");
        done.passes = true;
        let mut current = TaskRecord::new("1.2", "Phase 1", "API", "Wire endpoints");
        current.in_progress = true;
        let deferred = TaskRecord::new("9.1", "Phase 9", "Later", "Deferred: v2");
        TaskCatalog::new(vec![done, current, deferred])
    }

    fn generated() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 1, 12, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_block_for_idle_state() {
        let block = CurrentTaskBlock::from_task(None);
        assert_eq!(block.notes, "- Awaiting task assignment");
        assert_eq!(block.blockers, "- None");
        assert_eq!(block.next_steps, "- Begin next task");
    }

    #[test]
    fn test_block_blocked_overrides_in_progress() {
        let mut task = TaskRecord::new("2.1", "P2", "Auth", "Add login");
        task.in_progress = true;
        task.blocked = true;
        let block = CurrentTaskBlock::from_task(Some(&task));
        assert_eq!(block.heading, "2.1 - Auth");
        assert_eq!(block.status, "BLOCKED");
        assert_eq!(block.blockers, "- Task 2.1 requires supervisor review");
        assert_eq!(block.notes, "- Working on: Add login");
        assert_eq!(block.next_steps, "- Complete 2.1");
    }

    #[test]
    fn test_block_pending_status() {
        let task = TaskRecord::new("2.1", "P2", "Auth", "Add login");
        assert_eq!(CurrentTaskBlock::from_task(Some(&task)).status, "Pending");
    }

    #[test]
    fn test_render_sections() {
        let state = RunState {
            current_task: Some("1.2".into()),
            current_phase: Some("Phase 1".into()),
            ..RunState::default()
        };
        let data = ReportData::collect(&LedgerConfig::default(), &state, &catalog(), generated());
        let text = render_markdown(&data);

        assert!(text.contains("**Project:** TyneBase Frontend-Backend Integration  \n"));
        assert!(text.contains("**Milestone:** 2.5"));
        assert!(text.contains("**Last Updated:** 2025-01-12 09:30"));
        assert!(text.contains("- **Total Tasks:** 2 (excl. 1 deferred)"));
        assert!(text.contains("- **Remaining:** 1"));
        assert!(text.contains("## Current Task: 1.2 - API"));
        assert!(text.contains("**Status:** In Progress"));
        assert!(text.contains("## Execution History (Last 10):"));
        assert!(text.contains("**Phase:** Phase 1"));
        assert!(text.contains("- [x] **1.1**: Schema"));
        assert!(text.ends_with("| - | - | Initialized | Ready |\n"));
    }

    #[test]
    fn test_render_empty_completed_list() {
        let state = RunState::default();
        let data = ReportData::collect(
            &LedgerConfig::default(),
            &state,
            &TaskCatalog::default(),
            generated(),
        );
        let text = render_markdown(&data);
        assert!(text.contains("_(No tasks completed yet)_"));
        assert!(text.contains("## Current Task: None"));
        assert!(text.contains("**Phase:** Unknown"));
    }

    #[test]
    fn test_history_limited_and_most_recent_first() {
        let mut state = RunState::default();
        let base = Utc.with_ymd_and_hms(2025, 1, 12, 8, 0, 0).unwrap();
        for i in 0..15 {
            state.record(HistoryEntry::new(
                base + chrono::Duration::minutes(i),
                Some(format!("task-{i:02}")),
                "started",
                "in_progress",
            ));
        }
        let data = ReportData::collect(&LedgerConfig::default(), &state, &catalog(), generated());
        let text = render_markdown(&data);

        let rows: Vec<_> = text.lines().filter(|l| l.contains("task-")).collect();
        assert_eq!(rows.len(), 10);
        assert!(rows[0].contains("task-14"));
        assert!(rows[9].contains("task-05"));
        assert!(!text.contains("task-04"));
    }

    #[test]
    fn test_history_row_with_unparsed_timestamp() {
        let state: RunState = serde_json::from_str(
            r#"{"execution_history": [
    {"timestamp": "2025-01-10 09:00:00.123", "task_id": "0.1", "action": "started", "result": "in_progress"}
]}"#,
        )
        .unwrap();
        let data = ReportData::collect(&LedgerConfig::default(), &state, &catalog(), generated());
        assert!(render_markdown(&data)
            .contains("| 2025-01-10 09:00 | 0.1 | started | in_progress |\n"));
    }

    #[test]
    fn test_unknown_current_task_renders_idle_block() {
        let state = RunState {
            current_task: Some("7.7".into()),
            ..RunState::default()
        };
        let data = ReportData::collect(&LedgerConfig::default(), &state, &catalog(), generated());
        assert_eq!(data.current, CurrentTaskBlock::from_task(None));
    }
}
