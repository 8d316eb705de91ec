//! Skiff Update - git-based self-update subsystem for the Skiff server
//!
//! Periodically compares the local head of the install clone against the
//! remote head of the same branch and, when the remote is strictly newer,
//! either applies the update in place (stash, fast-forward pull, stale
//! artifact cleanup, restart request) or notifies the embedder that one is
//! available.
//!
//! # Example
//!
//! ```rust,ignore
//! use skiff_update::{ArtifactRule, Updater, UpdaterConfig, restart_channel};
//!
//! let (restart, restart_rx) = restart_channel();
//! let updater = Updater::new(
//!     UpdaterConfig::default(),
//!     "/opt/skiff",
//!     ArtifactRule::new("lua", "luac"),
//!     restart,
//! );
//!
//! updater.check();
//! if updater.trigger_update() {
//!     // restart_rx now holds a RestartRequest
//! }
//! ```

mod backend;
mod cleaner;
mod config;
mod error;
mod events;
mod manager;
mod state;

pub use backend::VersionControl;
pub use cleaner::{ArtifactRule, CleanupStats, StaleArtifactCleaner};
pub use config::{DEFAULT_REPOSITORY, UpdaterConfig};
pub use error::{UpdateError, UpdateResult};
pub use events::{Notifier, NullNotifier, RestartHandle, RestartRequest, Scheduler, restart_channel};
pub use manager::Updater;
pub use state::{CheckPhase, CurrentVersion, UpdateState, UpdaterInfo};

pub use skiff_utils_git::{GitClient, GitError, RemoteBranch, VersionHandle};

/// Remote the updater tracks.
pub const DEFAULT_REMOTE: &str = "origin";
