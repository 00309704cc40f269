//! Task catalog store.
//!
//! A catalog is the ordered task list for one [`Mode`], stored as
//! `{"tasks": [...]}`. Order is authoritative: it drives next-task selection
//! and the order of the report's completed list, so it is never re-sorted.
//!
//! Fields the ledger does not know about (descriptions, validation steps,
//! anything the bootstrap tooling wrote) are kept in `extra` and written
//! back untouched.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

use crate::config::Workspace;
use crate::error::{LedgerError, Result};
use crate::mode::Mode;
use crate::timestamp::Timestamp;

// ============================================================================
// Task State
// ============================================================================

/// State of a task, derived from its flags.
///
/// # State Transitions
///
/// - `Pending` -> `InProgress`: `start`
/// - `Pending` | `InProgress` -> `Passed`: `pass`
/// - `Pending` | `InProgress` -> `Blocked`: `fail`
///
/// `Passed` and `Blocked` are terminal for selection purposes; only an
/// explicit `pass`/`fail` (or an external edit) moves a task out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    InProgress,
    Passed,
    Blocked,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "Pending"),
            TaskState::InProgress => write!(f, "In Progress"),
            TaskState::Passed => write!(f, "Passed"),
            TaskState::Blocked => write!(f, "BLOCKED"),
        }
    }
}

// ============================================================================
// Task Record
// ============================================================================

/// One task in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub passes: bool,
    #[serde(default)]
    pub in_progress: bool,
    #[serde(default)]
    pub blocked: bool,
    /// Explicit deferral. When absent, the deferred marker in `action` decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deferred: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskRecord {
    /// Create a pending task.
    ///
    /// # Example
    ///
    /// ```
    /// use ralph_ledger::catalog::{TaskRecord, TaskState};
    ///
    /// let task = TaskRecord::new("1.1", "Phase 1: Setup", "Init", "Create the schema");
    /// assert_eq!(task.state(), TaskState::Pending);
    /// ```
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        phase: impl Into<String>,
        title: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            phase: phase.into(),
            title: title.into(),
            action: action.into(),
            passes: false,
            in_progress: false,
            blocked: false,
            deferred: None,
            started_at: None,
            completed_at: None,
            failed_at: None,
            extra: Map::new(),
        }
    }

    /// Current state. A blocked flag outranks in-progress.
    #[must_use]
    pub fn state(&self) -> TaskState {
        if self.passes {
            TaskState::Passed
        } else if self.blocked {
            TaskState::Blocked
        } else if self.in_progress {
            TaskState::InProgress
        } else {
            TaskState::Pending
        }
    }

    /// Whether this task is excluded from statistics and selection.
    ///
    /// ```
    /// use ralph_ledger::catalog::TaskRecord;
    ///
    /// let legacy = TaskRecord::new("14.1", "Phase 14", "Later", "Deferred: wait for v2");
    /// assert!(legacy.is_deferred("Deferred"));
    ///
    /// let mut explicit = TaskRecord::new("14.2", "Phase 14", "Now", "Deferred work resumed");
    /// explicit.deferred = Some(false);
    /// assert!(!explicit.is_deferred("Deferred"));
    /// ```
    #[must_use]
    pub fn is_deferred(&self, marker: &str) -> bool {
        self.deferred.unwrap_or_else(|| self.action.contains(marker))
    }

    /// Claim the task.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.in_progress = true;
        self.started_at = Some(now.into());
    }

    /// Mark the task completed. Clears in-progress and any earlier block.
    pub fn pass(&mut self, now: DateTime<Utc>) {
        self.passes = true;
        self.blocked = false;
        self.in_progress = false;
        self.completed_at = Some(now.into());
    }

    /// Mark the task blocked. Clears in-progress and any earlier pass.
    pub fn fail(&mut self, now: DateTime<Utc>) {
        self.blocked = true;
        self.passes = false;
        self.in_progress = false;
        self.failed_at = Some(now.into());
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Ordered task list for one mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskCatalog {
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskCatalog {
    /// Create a catalog from tasks, keeping their order.
    #[must_use]
    pub fn new(tasks: Vec<TaskRecord>) -> Self {
        Self {
            tasks,
            extra: Map::new(),
        }
    }

    /// Load the catalog for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::CatalogNotFound`] when the mode's file is absent.
    pub fn load(workspace: &Workspace, mode: Mode) -> Result<Self> {
        let path = workspace.catalog_path(mode);
        Self::load_from(&path, mode)
    }

    /// Load a catalog from an explicit path.
    pub fn load_from(path: &Path, mode: Mode) -> Result<Self> {
        if !path.exists() {
            return Err(LedgerError::CatalogNotFound {
                path: path.to_path_buf(),
                mode,
            });
        }

        let json = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse task catalog {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            tasks = catalog.tasks.len(),
            "Loaded task catalog"
        );
        Ok(catalog)
    }

    /// Save the catalog for `mode`, replacing the file.
    pub fn save(&self, workspace: &Workspace, mode: Mode) -> Result<()> {
        self.save_to(&workspace.catalog_path(mode))
    }

    /// Save to an explicit path, pretty-printed with 2-space indentation.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "Saved task catalog");
        Ok(())
    }

    /// Find a task by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Find a task by id for mutation
    pub fn get_mut(&mut self, id: &str) -> Option<&mut TaskRecord> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
