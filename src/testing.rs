//! Test fixtures for building temporary installations.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::catalog::{TaskCatalog, TaskRecord};
use crate::config::{LedgerConfig, Workspace};
use crate::ledger::Ledger;
use crate::mode::Mode;
use crate::state::RunState;

/// A temporary installation root with a run-state file and both catalogs.
///
/// Automatically cleans up when dropped.
pub struct LedgerFixture {
    temp_dir: TempDir,
    workspace: Workspace,
}

impl LedgerFixture {
    /// Integration mode active, nothing started.
    ///
    /// Integration catalog: `1.1`, `1.2` (phase 1), `2.1` (phase 2) and a
    /// deferred `9.1`. Backend catalog: `B-1`, `B-2`.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or files cannot be created.
    #[must_use]
    pub fn standard() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let workspace = Workspace::with_config(temp_dir.path(), LedgerConfig::default());

        std::fs::write(workspace.state_path(), Self::initial_state())
            .expect("Failed to write run state");

        let fixture = Self {
            temp_dir,
            workspace,
        };
        fixture.write_catalog(Mode::Integration, &Self::integration_catalog());
        fixture.write_catalog(Mode::Backend, &Self::backend_catalog());
        fixture
    }

    fn initial_state() -> &'static str {
        r#"{
  "mode": "integration",
  "current_task": null,
  "current_phase": "Phase 1: Foundations",
  "status": "ready",
  "execution_history": [],
  "last_updated": "2025-01-10T09:00:00",
  "git": {
    "last_commit": null
  }
}"#
    }

    fn integration_catalog() -> TaskCatalog {
        TaskCatalog::new(vec![
            TaskRecord::new(
                "1.1",
                "Phase 1: Foundations",
                "Scaffold service",
                "Create the service skeleton",
            ),
            TaskRecord::new(
                "1.2",
                "Phase 1: Foundations",
                "Wire config",
                "Load environment configuration",
            ),
            TaskRecord::new("2.1", "Phase 2: API", "Search endpoint", "Expose search"),
            TaskRecord::new(
                "9.1",
                "Phase 9: Later",
                "Analytics",
                "Deferred: needs product sign-off",
            ),
        ])
    }

    fn backend_catalog() -> TaskCatalog {
        TaskCatalog::new(vec![
            TaskRecord::new("B-1", "Phase 1: Data", "Schema", "Create tables"),
            TaskRecord::new("B-2", "Phase 1: Data", "Seed", "Seed fixtures"),
        ])
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn root(&self) -> &std::path::Path {
        self.temp_dir.path()
    }

    #[must_use]
    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.workspace.clone())
    }

    pub fn state_path(&self) -> PathBuf {
        self.workspace.state_path()
    }

    pub fn catalog_path(&self, mode: Mode) -> PathBuf {
        self.workspace.catalog_path(mode)
    }

    pub fn report_path(&self, mode: Mode) -> PathBuf {
        self.workspace.report_path(mode)
    }

    /// Replace a mode's catalog file.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_catalog(&self, mode: Mode, catalog: &TaskCatalog) {
        catalog
            .save(&self.workspace, mode)
            .expect("Failed to write catalog");
    }

    /// # Panics
    ///
    /// Panics if the run-state file cannot be loaded.
    #[must_use]
    pub fn state(&self) -> RunState {
        RunState::load(&self.workspace).expect("Failed to load run state")
    }

    /// # Panics
    ///
    /// Panics if the catalog cannot be loaded or lacks the task.
    #[must_use]
    pub fn task(&self, mode: Mode, id: &str) -> TaskRecord {
        TaskCatalog::load(&self.workspace, mode)
            .expect("Failed to load catalog")
            .get(id)
            .cloned()
            .expect("Task missing from catalog")
    }

    /// Run-state file bytes, for asserting that nothing was written.
    #[must_use]
    pub fn raw_state(&self) -> String {
        std::fs::read_to_string(self.state_path()).expect("Failed to read run state")
    }

    #[must_use]
    pub fn raw_catalog(&self, mode: Mode) -> String {
        std::fs::read_to_string(self.catalog_path(mode)).expect("Failed to read catalog")
    }

    #[must_use]
    pub fn report(&self, mode: Mode) -> String {
        std::fs::read_to_string(self.report_path(mode)).expect("Failed to read report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_fixture_layout() {
        let fixture = LedgerFixture::standard();
        assert!(fixture.state_path().exists());
        assert!(fixture.catalog_path(Mode::Integration).exists());
        assert!(fixture.catalog_path(Mode::Backend).exists());
        assert!(!fixture.report_path(Mode::Integration).exists());
        assert_eq!(fixture.state().mode, Mode::Integration);
        assert!(fixture.root().join("prd_integration.json").exists());
        assert_eq!(fixture.workspace().root(), fixture.root());
    }
}
