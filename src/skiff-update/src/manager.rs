//! Updater - main API driving the check and apply cycles.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use skiff_utils_git::{GitClient, VersionHandle};

use crate::DEFAULT_REMOTE;
use crate::backend::VersionControl;
use crate::cleaner::{ArtifactRule, StaleArtifactCleaner};
use crate::config::UpdaterConfig;
use crate::error::UpdateResult;
use crate::events::{Notifier, NullNotifier, RestartHandle, Scheduler};
use crate::state::{CheckPhase, CurrentVersion, UpdateState, UpdaterInfo};

/// Self-update subsystem for a git-clone install.
///
/// The embedding scheduler invokes [`Updater::check`] periodically and at
/// startup; check and apply never run concurrently with each other. Status
/// queries may come from any thread and never fail.
pub struct Updater {
    backend: Box<dyn VersionControl>,
    config: UpdaterConfig,
    cleaner: StaleArtifactCleaner,
    notifier: Box<dyn Notifier>,
    restart: RestartHandle,
    state: Mutex<UpdateState>,
}

impl Updater {
    /// Create an updater over the application's install directory, shelling
    /// out to the configured git command.
    pub fn new(
        config: UpdaterConfig,
        app_dir: impl Into<PathBuf>,
        rule: ArtifactRule,
        restart: RestartHandle,
    ) -> Self {
        let app_dir = app_dir.into();
        let backend = GitClient::with_command(&app_dir, &config.git_command);
        Self::with_backend(Box::new(backend), config, app_dir, rule, restart)
    }

    /// Create with an explicit backend (tests inject fakes here).
    pub fn with_backend(
        backend: Box<dyn VersionControl>,
        config: UpdaterConfig,
        app_dir: impl Into<PathBuf>,
        rule: ArtifactRule,
        restart: RestartHandle,
    ) -> Self {
        let mut state = UpdateState::default();
        if !config.enabled {
            state.phase = CheckPhase::Disabled;
        }
        Self {
            backend,
            config,
            cleaner: StaleArtifactCleaner::new(app_dir, rule),
            notifier: Box::new(NullNotifier),
            restart,
            state: Mutex::new(state),
        }
    }

    /// Replace the notifier (builder style).
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The configuration in effect.
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Current phase of the check state machine.
    pub fn phase(&self) -> CheckPhase {
        self.state.lock().phase
    }

    /// Whether a previous apply failed.
    pub fn update_failed(&self) -> bool {
        self.state.lock().update_failed
    }

    /// Whether the last apply failure was conflict-class (needs manual
    /// repair) rather than a transient network fault.
    pub fn last_apply_failure_permanent(&self) -> bool {
        self.state.lock().last_apply_failure_permanent
    }

    /// Clear the failure flags, re-enabling automatic apply.
    pub fn reset_failure(&self) {
        let mut state = self.state.lock();
        state.update_failed = false;
        state.last_apply_failure_permanent = false;
    }

    /// Register the periodic and startup checks onto the embedder's
    /// scheduler.
    pub fn register(self: &Arc<Self>, scheduler: &mut dyn Scheduler) {
        let period = Duration::from_secs(self.config.check_interval_hours * 3600);

        let updater = Arc::clone(self);
        scheduler.register_interval("updater.check", period, Box::new(move || updater.check()));

        let updater = Arc::clone(self);
        scheduler.register_startup(Box::new(move || updater.check()));
    }

    /// Run one check cycle.
    ///
    /// Short-circuits while the subsystem is disabled or an update is
    /// already pending (no fetch, no compare - avoids redundant network
    /// calls and racing an in-flight apply). Backend failures are logged
    /// and swallowed; this never propagates an error.
    pub fn check(&self) {
        {
            let mut state = self.state.lock();
            if !self.config.enabled {
                state.phase = CheckPhase::Disabled;
                return;
            }
            if state.pending_update.is_some() {
                return;
            }
            state.phase = CheckPhase::Checking;
        }

        tracing::info!(repository = %self.config.repository, "checking for a new version");
        let outcome = self.run_check();

        let mut state = self.state.lock();
        state.last_check = Some(Utc::now());
        match outcome {
            Ok(Some(remote)) => {
                state.pending_update = Some(remote.clone());
                state.phase = CheckPhase::UpdateAvailable;
                let auto_apply = self.config.automatic && !state.update_failed;
                drop(state);

                if auto_apply {
                    if self.apply() {
                        self.restart.request();
                    }
                } else if self.config.notification {
                    self.notifier.update_available(&remote);
                }
            }
            Ok(None) => {
                state.phase = CheckPhase::Idle;
            }
            Err(e) => {
                tracing::error!(error = %e, "update check failed");
                state.phase = CheckPhase::Idle;
            }
        }
    }

    /// Fetch, resolve the current branch and compare heads.
    fn run_check(&self) -> UpdateResult<Option<VersionHandle>> {
        if !self.config.dev {
            if let Err(e) = self.backend.fetch(DEFAULT_REMOTE) {
                // Transient: compare against whatever remote state we
                // already have locally.
                tracing::warn!(error = %e, "fetch failed, using last known remote state");
            }
        }

        let branch = self.backend.current_branch()?;
        let local = self.backend.local_head()?;
        self.state.lock().current_version = Some(local.clone());

        for remote_branch in self.backend.remote_branches(DEFAULT_REMOTE)? {
            if remote_branch.name != branch {
                continue;
            }
            tracing::info!(
                local = %local.hash,
                remote = %remote_branch.head.hash,
                branch = %branch,
                "comparing versions"
            );
            // Strictly newer only: equal timestamps count as "no update",
            // even when the hashes differ.
            if local.timestamp < remote_branch.head.timestamp {
                return Ok(Some(remote_branch.head));
            }
            return Ok(None);
        }

        // No remote branch matches the local one; nothing to compare.
        Ok(None)
    }

    /// Apply the pending update: stash, pull, clean stale artifacts.
    ///
    /// Returns whether the update succeeded. On failure the working tree is
    /// left as the backend left it (no rollback); `update_failed` blocks
    /// further automatic attempts until [`Updater::reset_failure`].
    pub fn apply(&self) -> bool {
        match self.try_apply() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed updating via git");
                let mut state = self.state.lock();
                state.update_failed = true;
                state.last_apply_failure_permanent = !e.is_transient();
                false
            }
        }
    }

    fn try_apply(&self) -> UpdateResult<()> {
        tracing::debug!("stashing local changes");
        self.backend.stash_save()?;

        // Snapshot before the pull moves the head; the notification carries
        // the state of the world the update was decided on.
        let info = self.info();

        tracing::info!("updating to latest version");
        self.backend.pull()?;

        let stats = self.cleaner.clean();
        if stats.artifacts_removed > 0 || stats.dirs_removed > 0 {
            tracing::info!(
                artifacts = stats.artifacts_removed,
                dirs = stats.dirs_removed,
                "removed stale build artifacts"
            );
        }

        {
            let mut state = self.state.lock();
            state.pending_update = None;
            // Head moved; resolve again on the next query.
            state.current_version = None;
            state.phase = CheckPhase::Idle;
        }

        let message = match &info.pending_update {
            Some(version) => format!(
                "Updated to a new version with hash \"{}\", this version is from {}",
                version.hash,
                version.timestamp.format("%Y-%m-%d %H:%M"),
            ),
            None => "Updated to the latest version".to_string(),
        };
        self.notifier.updated(&message, &info);

        Ok(())
    }

    /// Local head of the install, resolved lazily and cached. A clone
    /// without git metadata reports `Unknown` instead of failing.
    pub fn current_version(&self) -> CurrentVersion {
        if let Some(version) = self.state.lock().current_version.clone() {
            return CurrentVersion::Known(version);
        }

        match self.backend.local_head() {
            Ok(version) => {
                tracing::debug!(hash = %version.hash, "resolved local head");
                self.state.lock().current_version = Some(version.clone());
                CurrentVersion::Known(version)
            }
            Err(e) => {
                tracing::error!(error = %e, "no git metadata, running from a source distribution?");
                CurrentVersion::Unknown
            }
        }
    }

    /// Status snapshot; never fails.
    pub fn info(&self) -> UpdaterInfo {
        let current_version = self.current_version();
        let state = self.state.lock();
        UpdaterInfo {
            repository: self.config.repository.clone(),
            last_check: state.last_check,
            pending_update: state.pending_update.clone(),
            current_version,
        }
    }

    /// Run a check synchronously, then return the status snapshot.
    pub fn check_now(&self) -> UpdaterInfo {
        self.check();
        self.info()
    }

    /// Apply on demand; returns success.
    pub fn trigger_update(&self) -> bool {
        self.apply()
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
