//! Typed seams toward the embedding application: update notifications,
//! restart requests and periodic scheduling.

use std::time::Duration;

use skiff_utils_git::VersionHandle;

use crate::state::UpdaterInfo;

/// Observer for update events, injected at construction.
pub trait Notifier: Send + Sync {
    /// An update was discovered but not applied (`update.available`).
    fn update_available(&self, update: &VersionHandle);

    /// An update was applied (`update.updated`). `info` is the status
    /// snapshot taken just before the pull moved the head.
    fn updated(&self, message: &str, info: &UpdaterInfo);
}

/// Notifier that drops everything; the default when the embedder does not
/// care about update events.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn update_available(&self, _update: &VersionHandle) {}
    fn updated(&self, _message: &str, _info: &UpdaterInfo) {}
}

/// Marker sent when the updater wants the process restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRequest;

/// One-shot restart signal: a single-slot channel the embedding process
/// drains after `apply()` has returned.
pub fn restart_channel() -> (RestartHandle, flume::Receiver<RestartRequest>) {
    let (tx, rx) = flume::bounded(1);
    (RestartHandle { tx }, rx)
}

/// Sender half of the restart signal. Requests are fire-and-forget; the
/// updater never waits for teardown.
#[derive(Debug, Clone)]
pub struct RestartHandle {
    tx: flume::Sender<RestartRequest>,
}

impl RestartHandle {
    /// Request a restart. A request already in flight (or a gone embedder)
    /// is logged and otherwise ignored.
    pub fn request(&self) {
        if let Err(e) = self.tx.try_send(RestartRequest) {
            tracing::warn!(error = %e, "restart request not delivered");
        }
    }
}

/// Periodic work registration offered by the embedding application.
pub trait Scheduler {
    /// Run `callback` every `period`, never overlapping invocations.
    fn register_interval(&mut self, name: &str, period: Duration, callback: Box<dyn Fn() + Send + Sync>);

    /// Run `callback` once at application startup.
    fn register_startup(&mut self, callback: Box<dyn Fn() + Send + Sync>);
}
