//! Ralph Ledger - task progress tracking for scripted runner loops
//!
//! Keeps the progress of a multi-phase task list across repeated CLI
//! invocations: claim a task, pass it or block it, record commit messages,
//! and switch between two task sets.
//!
//! # Architecture
//!
//! - [`catalog`] - Task catalog store and per-task transitions
//! - [`state`] - Run-state store and history log
//! - [`stats`] - Aggregate and per-phase counts
//! - [`selector`] - Next eligible task
//! - [`report`] - Regenerated markdown task list
//! - [`ledger`] - Command layer tying the stores together
//! - [`config`] - Installation layout and `ralph_ledger.toml`
//! - [`error`] - Error types and exit codes
//!
//! # Example
//!
//! ```rust,no_run
//! use ralph_ledger::{Ledger, NextTask, Workspace};
//!
//! let ledger = Ledger::new(Workspace::open("/srv/runner")?);
//! if let NextTask::Task(task) = ledger.next()? {
//!     ledger.start(&task.id)?;
//!     ledger.commit("feat: scaffold service")?;
//!     ledger.pass(&task.id)?;
//! }
//! # Ok::<(), ralph_ledger::LedgerError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod mode;
pub mod report;
pub mod selector;
pub mod state;
pub mod stats;
pub mod timestamp;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use catalog::{TaskCatalog, TaskRecord, TaskState};
pub use config::{LedgerConfig, ModeProfile, Workspace};
pub use error::{LedgerError, Result};
pub use ledger::{
    CommitRecord, Ledger, ModeSwitch, NextTask, StatusReport, Summary, Transition,
    TransitionKind,
};
pub use mode::Mode;
pub use state::{HistoryEntry, RunState, RunStatus};
pub use stats::{PhaseProgress, TaskStats};
