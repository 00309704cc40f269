//! Command layer.
//!
//! Each method is one CLI command run to completion: load the run state and
//! the active catalog, compute, mutate, persist, regenerate the report. The
//! methods return typed outcomes and leave console rendering to the binary.
//!
//! Mutating commands write the catalog, then the run state, then the
//! report. A failure between those writes leaves them out of step; there is
//! no rollback. Nothing guards against two invocations running at once
//! either: each file is rewritten whole and the last writer wins.

use chrono::Utc;

use crate::catalog::{TaskCatalog, TaskRecord};
use crate::config::Workspace;
use crate::error::{LedgerError, Result};
use crate::mode::Mode;
use crate::report;
use crate::selector;
use crate::state::{HistoryEntry, RunState, RunStatus};
use crate::stats::{self, PhaseProgress, TaskStats};

// ============================================================================
// Outcomes
// ============================================================================

/// Snapshot for the `status` command.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub mode: Mode,
    pub label: String,
    pub state: RunState,
    pub stats: TaskStats,
}

/// Result of the `next` command.
#[derive(Debug, Clone, PartialEq)]
pub enum NextTask {
    /// First eligible task in catalog order
    Task(TaskRecord),
    /// Catalog has tasks but none is eligible
    AllDone { milestone: String },
    /// Catalog has no tasks at all
    EmptyCatalog,
}

/// Task transition applied by `start`, `pass` or `fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Start,
    Pass,
    Fail,
}

impl TransitionKind {
    /// Action label written to the history log
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            TransitionKind::Start => "started",
            TransitionKind::Pass => "completed",
            TransitionKind::Fail => "blocked",
        }
    }

    /// Result label written to the history log
    #[must_use]
    pub fn result(&self) -> &'static str {
        match self {
            TransitionKind::Start => "in_progress",
            TransitionKind::Pass => "PASS",
            TransitionKind::Fail => "FAIL - Supervisor review needed",
        }
    }
}

/// Outcome of a task transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub kind: TransitionKind,
    pub mode: Mode,
    /// Task as saved
    pub task: TaskRecord,
    /// Statistics after the transition
    pub stats: TaskStats,
}

/// Outcome of `commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub message: String,
    /// Shortened message as stored in the history entry
    pub preview: String,
    pub task_id: Option<String>,
    pub report_written: bool,
}

/// Outcome of `summary`.
#[derive(Debug, Clone)]
pub struct Summary {
    pub mode: Mode,
    pub label: String,
    pub stats: TaskStats,
    pub phases: Vec<PhaseProgress>,
}

/// Outcome of `mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeSwitch {
    /// Requested mode was already active; nothing written
    AlreadyActive(Mode),
    Switched {
        from: Mode,
        to: Mode,
        catalog_file: String,
        report_file: String,
    },
}

// ============================================================================
// Ledger
// ============================================================================

/// Command entry points over one installation.
///
/// # Example
///
/// ```no_run
/// use ralph_ledger::{Ledger, Workspace};
///
/// let ledger = Ledger::new(Workspace::open(".")?);
/// let outcome = ledger.start("1.1")?;
/// println!("{} is {}", outcome.task.id, outcome.task.state());
/// # Ok::<(), ralph_ledger::LedgerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Ledger {
    workspace: Workspace,
}

impl Ledger {
    #[must_use]
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    fn marker(&self) -> &str {
        &self.workspace.config().deferred_marker
    }

    fn label(&self, mode: Mode) -> String {
        self.workspace.config().profile(mode).label.clone()
    }

    fn load(&self) -> Result<(RunState, TaskCatalog)> {
        let state = RunState::load(&self.workspace)?;
        let catalog = TaskCatalog::load(&self.workspace, state.mode)?;
        Ok((state, catalog))
    }

    /// Current state and progress counts. Read-only.
    pub fn status(&self) -> Result<StatusReport> {
        let (state, catalog) = self.load()?;
        let stats = TaskStats::compute(&catalog.tasks, self.marker());
        Ok(StatusReport {
            mode: state.mode,
            label: self.label(state.mode),
            state,
            stats,
        })
    }

    /// Next eligible task. Read-only.
    pub fn next(&self) -> Result<NextTask> {
        let (state, catalog) = self.load()?;
        if catalog.is_empty() {
            return Ok(NextTask::EmptyCatalog);
        }
        Ok(match selector::next_task(&catalog.tasks, self.marker()) {
            Some(task) => NextTask::Task(task.clone()),
            None => NextTask::AllDone {
                milestone: self.workspace.config().profile(state.mode).milestone.clone(),
            },
        })
    }

    /// Claim a task: `Pending -> InProgress`.
    pub fn start(&self, task_id: &str) -> Result<Transition> {
        self.transition(task_id, TransitionKind::Start)
    }

    /// Complete a task: `-> Passed`. Clears the current task.
    pub fn pass(&self, task_id: &str) -> Result<Transition> {
        self.transition(task_id, TransitionKind::Pass)
    }

    /// Block a task for supervisor review: `-> Blocked`.
    pub fn fail(&self, task_id: &str) -> Result<Transition> {
        self.transition(task_id, TransitionKind::Fail)
    }

    fn transition(&self, task_id: &str, kind: TransitionKind) -> Result<Transition> {
        let (mut state, mut catalog) = self.load()?;
        let mode = state.mode;
        let now = Utc::now();

        let Some(task) = catalog.get_mut(task_id) else {
            tracing::warn!(task = task_id, %mode, "Task not found; nothing changed");
            return Err(LedgerError::task_not_found(task_id));
        };

        match kind {
            TransitionKind::Start => task.start(now),
            TransitionKind::Pass => task.pass(now),
            TransitionKind::Fail => task.fail(now),
        }
        let task = task.clone();

        match kind {
            TransitionKind::Start => {
                state.current_task = Some(task.id.clone());
                state.current_phase = Some(task.phase.clone());
                state.status = RunStatus::Executing;
            }
            TransitionKind::Pass => {
                state.current_task = None;
                state.status = RunStatus::Ready;
            }
            TransitionKind::Fail => {
                state.current_task = Some(task.id.clone());
                state.status = RunStatus::Blocked;
            }
        }
        state.record(HistoryEntry::new(
            now,
            Some(task.id.clone()),
            kind.action(),
            kind.result(),
        ));

        catalog.save(&self.workspace, mode)?;
        state.save(&self.workspace)?;
        report::write_report(&self.workspace, &state, &catalog)?;

        tracing::info!(task = %task.id, action = kind.action(), %mode, "Applied transition");

        Ok(Transition {
            kind,
            mode,
            stats: TaskStats::compute(&catalog.tasks, self.marker()),
            task,
        })
    }

    /// Record a commit message. Git itself is never run.
    ///
    /// The report is refreshed when the active catalog exists; a missing
    /// catalog does not stop the message from being recorded.
    pub fn commit(&self, message: &str) -> Result<CommitRecord> {
        let mut state = RunState::load(&self.workspace)?;
        let preview = commit_preview(message, self.workspace.config().commit_preview_len);
        let task_id = state.current_task.clone();

        state.git.last_commit = Some(message.to_string());
        state.record(HistoryEntry::new(
            Utc::now(),
            task_id.clone(),
            "commit",
            preview.clone(),
        ));
        state.save(&self.workspace)?;

        let report_written = match TaskCatalog::load(&self.workspace, state.mode) {
            Ok(catalog) => {
                report::write_report(&self.workspace, &state, &catalog)?;
                true
            }
            Err(LedgerError::CatalogNotFound { path, .. }) => {
                tracing::warn!(path = %path.display(), "Catalog missing; report not refreshed");
                false
            }
            Err(e) => return Err(e),
        };

        tracing::info!(task = ?task_id, "Recorded commit message");

        Ok(CommitRecord {
            message: message.to_string(),
            preview,
            task_id,
            report_written,
        })
    }

    /// Per-phase completion. Read-only.
    pub fn summary(&self) -> Result<Summary> {
        let (state, catalog) = self.load()?;
        Ok(Summary {
            mode: state.mode,
            label: self.label(state.mode),
            stats: TaskStats::compute(&catalog.tasks, self.marker()),
            phases: stats::phase_breakdown(&catalog.tasks, self.marker()),
        })
    }

    /// Switch the active catalog.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidMode`] for anything but `backend` or
    /// `integration`; checked before any file is read.
    pub fn switch_mode(&self, requested: &str) -> Result<ModeSwitch> {
        let to: Mode = requested.parse()?;
        let mut state = RunState::load(&self.workspace)?;
        let from = state.mode;

        if from == to {
            tracing::debug!(%to, "Mode already active");
            return Ok(ModeSwitch::AlreadyActive(to));
        }

        state.mode = to;
        state.current_task = None;
        state.status = RunStatus::Ready;
        state.save(&self.workspace)?;

        tracing::info!(%from, %to, "Switched mode");

        let profile = self.workspace.config().profile(to);
        Ok(ModeSwitch::Switched {
            from,
            to,
            catalog_file: profile.catalog_file.clone(),
            report_file: profile.report_file.clone(),
        })
    }
}

/// Shorten a commit message for the history log.
///
/// ```
/// use ralph_ledger::ledger::commit_preview;
///
/// assert_eq!(commit_preview("fix: typo", 30), "fix: typo");
/// assert_eq!(commit_preview("abcdef", 3), "abc...");
/// ```
#[must_use]
pub fn commit_preview(message: &str, max_chars: usize) -> String {
    if message.chars().count() > max_chars {
        let head: String = message.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        message.to_string()
    }
}
