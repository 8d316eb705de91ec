//! Updater state and status payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skiff_utils_git::VersionHandle;

/// Phase of the check state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPhase {
    /// Nothing pending, no check in flight.
    #[default]
    Idle,
    /// A check cycle is running.
    Checking,
    /// A newer remote head has been recorded and not yet applied.
    UpdateAvailable,
    /// The subsystem is turned off (not a git install).
    Disabled,
}

/// Current version of the running install, or the sentinel for an install
/// without version-control metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurrentVersion {
    /// Head commit of the local clone.
    Known(VersionHandle),
    /// No git metadata (running from a source distribution).
    Unknown,
}

impl CurrentVersion {
    /// The handle, when one is known.
    pub fn handle(&self) -> Option<&VersionHandle> {
        match self {
            Self::Known(handle) => Some(handle),
            Self::Unknown => None,
        }
    }
}

/// Mutable updater state. Owned by the [`crate::Updater`] behind a single
/// lock; the embedding scheduler serializes check/apply, other threads only
/// read it through the status surface.
#[derive(Debug, Default)]
pub struct UpdateState {
    /// Cached local head; `None` until first resolved.
    pub current_version: Option<VersionHandle>,
    /// Discovered but not yet applied update.
    pub pending_update: Option<VersionHandle>,
    /// When the last check cycle finished.
    pub last_check: Option<DateTime<Utc>>,
    /// A previous apply failed; suppresses automatic apply until reset.
    pub update_failed: bool,
    /// The last apply failure was conflict-class rather than transient.
    pub last_apply_failure_permanent: bool,
    /// Current phase of the check state machine.
    pub phase: CheckPhase,
}

/// Serializable status payload returned by the query surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterInfo {
    /// Repository identifier ("owner/name").
    pub repository: String,
    /// When the last check cycle finished, if any.
    pub last_check: Option<DateTime<Utc>>,
    /// Discovered but unapplied update, if any.
    pub pending_update: Option<VersionHandle>,
    /// Local head, or `Unknown` for a source-only install.
    pub current_version: CurrentVersion,
}
