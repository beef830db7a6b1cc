//! Lifecycle tag carried by every tracked row.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Persistence intent of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Persisted and unchanged since the last load or commit
    Clean,
    /// Never persisted; will be created on save
    New,
    /// Persisted and changed locally; will be updated on save
    Modified,
    /// Persisted and removed locally; tombstone kept until save
    Deleted,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Clean => "clean",
            LifecycleState::New => "new",
            LifecycleState::Modified => "modified",
            LifecycleState::Deleted => "deleted",
        }
    }

    /// Whether a save has anything to do for a row in this state.
    pub fn is_pending(&self) -> bool {
        !matches!(self, LifecycleState::Clean)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown lifecycle state: {0}")]
pub struct UnknownLifecycleState(pub String);

impl FromStr for LifecycleState {
    type Err = UnknownLifecycleState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clean" => Ok(LifecycleState::Clean),
            "new" => Ok(LifecycleState::New),
            "modified" => Ok(LifecycleState::Modified),
            "deleted" => Ok(LifecycleState::Deleted),
            other => Err(UnknownLifecycleState(other.to_string())),
        }
    }
}
