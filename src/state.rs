//! Run-state store.
//!
//! The run-state file is a singleton record: active mode, the task currently
//! claimed, the overall status, an append-only history log and the last
//! recorded commit message. It is created by external bootstrap tooling;
//! the ledger only reads and rewrites it.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

use crate::config::Workspace;
use crate::error::{LedgerError, Result};
use crate::mode::Mode;
use crate::timestamp::Timestamp;

/// Overall runner status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Nothing claimed; ready for the next task
    Ready,
    /// A task has been started
    Executing,
    /// The current task failed and needs review
    Blocked,
    /// Missing or unrecognized status
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for RunStatus {
    /// Unrecognized names, `null` and non-string values read as
    /// [`RunStatus::Unknown`].
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw.as_ref().and_then(Value::as_str) {
            Some("ready") => RunStatus::Ready,
            Some("executing") => RunStatus::Executing,
            Some("blocked") => RunStatus::Blocked,
            _ => RunStatus::Unknown,
        })
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Ready => write!(f, "ready"),
            RunStatus::Executing => write!(f, "executing"),
            RunStatus::Blocked => write!(f, "blocked"),
            RunStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One command's effect, appended to the history log.
///
/// Stored timestamps and unknown fields are written back as read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    /// `None` for commits recorded with no task claimed
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub result: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(
        now: DateTime<Utc>,
        task_id: Option<String>,
        action: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Some(now.into()),
            task_id,
            action: action.into(),
            result: result.into(),
            extra: Map::new(),
        }
    }

    /// Task id for display, `-` when absent
    #[must_use]
    pub fn task_label(&self) -> &str {
        self.task_id.as_deref().unwrap_or("-")
    }
}

/// Git bookkeeping. The ledger records messages but never runs git.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitInfo {
    #[serde(default)]
    pub last_commit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Global runner state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Active mode; absent or unrecognized values read as integration
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub current_task: Option<String>,
    /// Display-only mirror of the current task's phase
    #[serde(default)]
    pub current_phase: Option<String>,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub execution_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub last_updated: Option<Timestamp>,
    #[serde(default)]
    pub git: GitInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RunState {
    /// Load the run-state file.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StateNotFound`] when the file is absent. The
    /// ledger does not create it.
    pub fn load(workspace: &Workspace) -> Result<Self> {
        Self::load_from(&workspace.state_path())
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LedgerError::StateNotFound {
                path: path.to_path_buf(),
            });
        }

        let json = std::fs::read_to_string(path)?;
        let state: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse run state {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            mode = %state.mode,
            history = state.execution_history.len(),
            "Loaded run state"
        );
        Ok(state)
    }

    /// Stamp `last_updated` with the current time and save.
    pub fn save(&mut self, workspace: &Workspace) -> Result<()> {
        self.save_at(&workspace.state_path(), Utc::now())
    }

    /// Stamp `last_updated` with `now` and save to an explicit path.
    pub fn save_at(&mut self, path: &Path, now: DateTime<Utc>) -> Result<()> {
        self.last_updated = Some(now.into());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "Saved run state");
        Ok(())
    }

    /// Append to the history log. The log is never truncated.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.execution_history.push(entry);
    }

    /// The last `limit` history entries, most recent first.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::Utc;
    /// use ralph_ledger::state::{HistoryEntry, RunState};
    ///
    /// let mut state = RunState::default();
    /// for i in 0..12 {
    ///     state.record(HistoryEntry::new(Utc::now(), Some(format!("1.{i}")), "started", "in_progress"));
    /// }
    /// let recent: Vec<_> = state.recent_history(10).map(|e| e.task_label()).collect();
    /// assert_eq!(recent.len(), 10);
    /// assert_eq!(recent[0], "1.11");
    /// assert_eq!(recent[9], "1.2");
    /// ```
    pub fn recent_history(&self, limit: usize) -> impl Iterator<Item = &HistoryEntry> {
        let skip = self.execution_history.len().saturating_sub(limit);
        self.execution_history[skip..].iter().rev()
    }

    /// Phase label for display, `Unknown` when unset
    #[must_use]
    pub fn phase_label(&self) -> &str {
        self.current_phase.as_deref().unwrap_or("Unknown")
    }
}
