//! Installation layout and configuration.
//!
//! A [`Workspace`] pairs the installation root with a [`LedgerConfig`] and
//! answers every "which file?" question. It is built once per invocation and
//! passed into the command layer, so no path depends on global state.
//!
//! The optional `ralph_ledger.toml` in the root overrides file names and
//! report headings:
//!
//! ```toml
//! state_file = "ralph_state.json"
//! deferred_marker = "Deferred"
//!
//! [backend]
//! catalog_file = "PRD.json"
//! report_file = "tasklist.md"
//!
//! [integration]
//! project_name = "Storefront Integration"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LedgerError, Result};
use crate::mode::Mode;

/// Name of the optional configuration file in the installation root.
pub const CONFIG_FILE_NAME: &str = "ralph_ledger.toml";

/// Per-mode file names and report headings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeProfile {
    /// Catalog JSON file, relative to the root
    pub catalog_file: String,
    /// Report markdown file, relative to the root
    pub report_file: String,
    /// Project title shown in the report header
    pub project_name: String,
    /// Milestone shown in the report header
    pub milestone: String,
    /// Short label used by `status` and `summary`
    pub label: String,
}

impl ModeProfile {
    /// Defaults for a mode.
    #[must_use]
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Backend => Self {
                catalog_file: "PRD.json".to_string(),
                report_file: "tasklist.md".to_string(),
                project_name: "TyneBase Backend - Milestone 2".to_string(),
                milestone: "2".to_string(),
                label: "Backend (M2)".to_string(),
            },
            Mode::Integration => Self {
                catalog_file: "prd_integration.json".to_string(),
                report_file: "tasklist_integration.md".to_string(),
                project_name: "TyneBase Frontend-Backend Integration".to_string(),
                milestone: "2.5".to_string(),
                label: "Integration (M2.5)".to_string(),
            },
        }
    }

    fn apply(&mut self, overrides: ProfileOverrides) {
        if let Some(v) = overrides.catalog_file {
            self.catalog_file = v;
        }
        if let Some(v) = overrides.report_file {
            self.report_file = v;
        }
        if let Some(v) = overrides.project_name {
            self.project_name = v;
        }
        if let Some(v) = overrides.milestone {
            self.milestone = v;
        }
        if let Some(v) = overrides.label {
            self.label = v;
        }
    }
}

/// Resolved ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerConfig {
    /// Run-state JSON file, relative to the root
    pub state_file: String,
    /// Protocol label shown in the report header
    pub protocol: String,
    /// Substring in a task's `action` that marks it deferred when the task
    /// carries no explicit `deferred` flag
    pub deferred_marker: String,
    /// Number of history entries rendered in the report
    pub history_limit: usize,
    /// Characters of a commit message kept in its history entry
    pub commit_preview_len: usize,
    pub backend: ModeProfile,
    pub integration: ModeProfile,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            state_file: "ralph_state.json".to_string(),
            protocol: "RALPH v2.0".to_string(),
            deferred_marker: "Deferred".to_string(),
            history_limit: 10,
            commit_preview_len: 30,
            backend: ModeProfile::for_mode(Mode::Backend),
            integration: ModeProfile::for_mode(Mode::Integration),
        }
    }
}

/// On-disk shape of `ralph_ledger.toml`; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    state_file: Option<String>,
    protocol: Option<String>,
    deferred_marker: Option<String>,
    history_limit: Option<usize>,
    commit_preview_len: Option<usize>,
    #[serde(default)]
    backend: ProfileOverrides,
    #[serde(default)]
    integration: ProfileOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileOverrides {
    catalog_file: Option<String>,
    report_file: Option<String>,
    project_name: Option<String>,
    milestone: Option<String>,
    label: Option<String>,
}

impl LedgerConfig {
    /// Load configuration from an installation root.
    ///
    /// Returns the defaults when no configuration file exists.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content).map_err(|e| match e {
            LedgerError::Config { message, .. } => LedgerError::config_with_path(message, path),
            other => other,
        })
    }

    /// Parse configuration text, layering it over the defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| LedgerError::Config {
            message: e.to_string(),
            path: None,
        })?;

        let mut config = Self::default();
        if let Some(v) = file.state_file {
            config.state_file = v;
        }
        if let Some(v) = file.protocol {
            config.protocol = v;
        }
        if let Some(v) = file.deferred_marker {
            config.deferred_marker = v;
        }
        if let Some(v) = file.history_limit {
            config.history_limit = v;
        }
        if let Some(v) = file.commit_preview_len {
            config.commit_preview_len = v;
        }
        config.backend.apply(file.backend);
        config.integration.apply(file.integration);

        if config.deferred_marker.is_empty() {
            return Err(LedgerError::Config {
                message: "deferred_marker must not be empty".to_string(),
                path: None,
            });
        }
        Ok(config)
    }

    /// Get the configuration file path for a root
    pub fn config_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE_NAME)
    }

    /// Profile for a mode
    #[must_use]
    pub fn profile(&self, mode: Mode) -> &ModeProfile {
        match mode {
            Mode::Backend => &self.backend,
            Mode::Integration => &self.integration,
        }
    }
}

/// Installation root plus configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    config: LedgerConfig,
}

impl Workspace {
    /// Open a workspace, reading `ralph_ledger.toml` if present.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = LedgerConfig::load(&root)?;
        Ok(Self { root, config })
    }

    /// Build a workspace with an explicit configuration.
    #[must_use]
    pub fn with_config(root: impl Into<PathBuf>, config: LedgerConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Path of the run-state file
    pub fn state_path(&self) -> PathBuf {
        self.root.join(&self.config.state_file)
    }

    /// Path of the catalog file for a mode
    pub fn catalog_path(&self, mode: Mode) -> PathBuf {
        self.root.join(&self.config.profile(mode).catalog_file)
    }

    /// Path of the report file for a mode
    pub fn report_path(&self, mode: Mode) -> PathBuf {
        self.root.join(&self.config.profile(mode).report_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_layout() {
        let ws = Workspace::with_config("/install", LedgerConfig::default());
        assert_eq!(ws.state_path(), PathBuf::from("/install/ralph_state.json"));
        assert_eq!(ws.catalog_path(Mode::Backend), PathBuf::from("/install/PRD.json"));
        assert_eq!(
            ws.catalog_path(Mode::Integration),
            PathBuf::from("/install/prd_integration.json")
        );
        assert_eq!(ws.report_path(Mode::Backend), PathBuf::from("/install/tasklist.md"));
        assert_eq!(
            ws.report_path(Mode::Integration),
            PathBuf::from("/install/tasklist_integration.md")
        );
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config = LedgerConfig::from_toml(
            r#"
history_limit = 5

[integration]
project_name = "Storefront"
"#,
        )
        .unwrap();

        assert_eq!(config.history_limit, 5);
        assert_eq!(config.integration.project_name, "Storefront");
        assert_eq!(config.integration.catalog_file, "prd_integration.json");
        assert_eq!(config.backend, ModeProfile::for_mode(Mode::Backend));
        assert_eq!(config.deferred_marker, "Deferred");
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = LedgerConfig::from_toml("colour = \"red\"").unwrap_err();
        assert!(matches!(err, LedgerError::Config { .. }));
    }

    #[test]
    fn test_empty_marker_rejected() {
        let err = LedgerConfig::from_toml("deferred_marker = \"\"").unwrap_err();
        assert!(err.to_string().contains("deferred_marker"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = LedgerConfig::load(temp.path()).unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "state_file = [").unwrap();

        let err = LedgerConfig::load(temp.path()).unwrap_err();
        match err {
            LedgerError::Config { path, .. } => {
                assert_eq!(path, Some(temp.path().join(CONFIG_FILE_NAME)));
            }
            other => panic!("Wrong error variant: {other:?}"),
        }
    }

    #[test]
    fn test_workspace_open_applies_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "state_file = \"state.json\"\n[backend]\ncatalog_file = \"backend.json\"\n",
        )
        .unwrap();

        let ws = Workspace::open(temp.path()).unwrap();
        assert_eq!(ws.state_path(), temp.path().join("state.json"));
        assert_eq!(ws.catalog_path(Mode::Backend), temp.path().join("backend.json"));
    }
}
