//! Task-set selection.
//!
//! The ledger tracks two independent catalogs. [`Mode`] picks which one (and
//! which report document) is active.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;

/// Active task set.
///
/// # Example
///
/// ```
/// use ralph_ledger::Mode;
///
/// let mode: Mode = "backend".parse().unwrap();
/// assert_eq!(mode, Mode::Backend);
/// assert_eq!(Mode::default(), Mode::Integration);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Backend milestone tasks
    Backend,
    /// Frontend/backend integration tasks
    #[default]
    Integration,
}

impl Mode {
    /// Lower-case name as stored in the run-state file.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Backend => "backend",
            Mode::Integration => "integration",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backend" => Ok(Mode::Backend),
            "integration" => Ok(Mode::Integration),
            other => Err(LedgerError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Mode {
    /// Anything other than a known mode name (including `null`) reads as
    /// [`Mode::Integration`].
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default())
    }
}
