//! Version-control backend seam.

use skiff_utils_git::{GitClient, GitResult, RemoteBranch, VersionHandle};

/// Commit-graph operations the updater needs from a version-control backend.
///
/// [`GitClient`] is the production implementation; tests drive the state
/// machine through in-memory fakes.
pub trait VersionControl: Send + Sync {
    /// Name of the currently checked-out branch.
    fn current_branch(&self) -> GitResult<String>;

    /// Fetch the given remote.
    fn fetch(&self, remote: &str) -> GitResult<()>;

    /// Branches of the remote with their head commits.
    fn remote_branches(&self, remote: &str) -> GitResult<Vec<RemoteBranch>>;

    /// Head commit of the local branch.
    fn local_head(&self) -> GitResult<VersionHandle>;

    /// Stash away local modifications.
    fn stash_save(&self) -> GitResult<()>;

    /// Fast-forward the local branch to the remote head.
    fn pull(&self) -> GitResult<()>;
}

impl VersionControl for GitClient {
    fn current_branch(&self) -> GitResult<String> {
        GitClient::current_branch(self)
    }

    fn fetch(&self, remote: &str) -> GitResult<()> {
        GitClient::fetch(self, remote)
    }

    fn remote_branches(&self, remote: &str) -> GitResult<Vec<RemoteBranch>> {
        GitClient::remote_branches(self, remote)
    }

    fn local_head(&self) -> GitResult<VersionHandle> {
        GitClient::local_head(self)
    }

    fn stash_save(&self) -> GitResult<()> {
        GitClient::stash_save(self)
    }

    fn pull(&self) -> GitResult<()> {
        GitClient::pull(self)
    }
}
