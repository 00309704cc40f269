//! Custom error types for the ledger.
//!
//! Errors fall into three groups: missing bootstrap files (fatal), lookups
//! that the command layer reports and recovers from, and wrapped I/O or
//! serialization failures.

use std::path::PathBuf;
use thiserror::Error;

use crate::mode::Mode;

/// Main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    // =========================================================================
    // Missing Files
    // =========================================================================
    /// Run-state file is absent. The ledger never creates it.
    #[error("Run-state file not found: {}", path.display())]
    StateNotFound { path: PathBuf },

    /// Catalog file for the active mode is absent
    #[error("Tasks file not found: {} (mode: {mode})", path.display())]
    CatalogNotFound { path: PathBuf, mode: Mode },

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// No task with the given id in the active catalog
    #[error("Task '{id}' not found")]
    TaskNotFound { id: String },

    /// Mode name outside `backend` / `integration`
    #[error("Invalid mode: {value}")]
    InvalidMode { value: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LedgerError {
    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a task-not-found error
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::TaskNotFound { id: id.into() }
    }

    /// Check if the command layer reports this error and carries on.
    ///
    /// Unknown ids and invalid modes leave every file untouched and the
    /// process still exits 0.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TaskNotFound { .. } | Self::InvalidMode { .. })
    }

    /// Check if this error means the installation has not been bootstrapped
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            Self::StateNotFound { .. } | Self::CatalogNotFound { .. }
        )
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        if self.is_recoverable() {
            0
        } else if self.is_missing_file() {
            6
        } else if matches!(self, Self::Config { .. }) {
            7
        } else {
            1
        }
    }
}

/// Type alias for ledger results
pub type Result<T> = std::result::Result<T, LedgerError>;
