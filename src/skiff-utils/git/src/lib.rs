//! Git utilities for Skiff.
//!
//! [`GitClient`] shells out to the git CLI against the application's install
//! directory and exposes the handful of commit-graph operations the
//! self-updater needs: branch/head queries, fetch, stash and fast-forward
//! pull. Operations block until git finishes; no timeout is imposed here, so
//! a hung remote hangs the calling worker.

mod error;

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::{GitError, GitResult};

/// Length of the abbreviated commit hash carried in a [`VersionHandle`].
pub const SHORT_HASH_LEN: usize = 8;

/// Identifying tuple for a commit: abbreviated hash plus committer timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionHandle {
    /// 8-character lowercase hex prefix of the commit hash.
    pub hash: String,
    /// Committer timestamp of the commit.
    pub timestamp: DateTime<Utc>,
}

impl VersionHandle {
    /// Build a handle from a full (or already abbreviated) hash.
    pub fn new(hash: &str, timestamp: DateTime<Utc>) -> Self {
        let mut hash = hash.trim().to_lowercase();
        hash.truncate(SHORT_HASH_LEN);
        Self { hash, timestamp }
    }
}

impl std::fmt::Display for VersionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.hash, self.timestamp.format("%Y-%m-%d"))
    }
}

/// A branch on a remote, with the commit its head points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBranch {
    /// Branch name with the remote prefix stripped (e.g. "main").
    pub name: String,
    /// Head commit of the branch.
    pub head: VersionHandle,
}

/// Adapter over the git CLI for a single working tree.
#[derive(Debug, Clone)]
pub struct GitClient {
    command: String,
    workdir: PathBuf,
}

impl GitClient {
    /// Create a client using the default `git` binary.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self::with_command(workdir, "git")
    }

    /// Create a client with a custom git invocation command.
    pub fn with_command(workdir: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            workdir: workdir.into(),
        }
    }

    /// The working tree this client operates on.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Get the name of the currently checked-out branch.
    pub fn current_branch(&self) -> GitResult<String> {
        let out = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = out.trim();
        if name.is_empty() {
            return Err(GitError::UnexpectedOutput {
                args: "rev-parse --abbrev-ref HEAD".to_string(),
                output: out,
            });
        }
        Ok(name.to_string())
    }

    /// Fetch the given remote.
    pub fn fetch(&self, remote: &str) -> GitResult<()> {
        tracing::debug!(remote, "fetching remote");
        self.run(&["fetch", remote]).map(|_| ())
    }

    /// Enumerate the branches of a remote with their head commits.
    ///
    /// The symbolic `HEAD` ref of the remote is skipped.
    pub fn remote_branches(&self, remote: &str) -> GitResult<Vec<RemoteBranch>> {
        let pattern = format!("refs/remotes/{remote}");
        let out = self.run(&[
            "for-each-ref",
            "--format=%(refname:short) %(objectname) %(committerdate:unix)",
            &pattern,
        ])?;

        let mut branches = Vec::new();
        for line in out.lines().filter(|l| !l.trim().is_empty()) {
            let Some((name, head)) = parse_ref_line(line, remote) else {
                tracing::warn!(line, "skipping unparseable remote ref");
                continue;
            };
            if name == "HEAD" {
                continue;
            }
            branches.push(RemoteBranch { name, head });
        }
        Ok(branches)
    }

    /// Get the head commit of the local branch.
    pub fn local_head(&self) -> GitResult<VersionHandle> {
        let args = ["log", "-1", "--format=%H %ct"];
        let out = self.run(&args)?;
        parse_head_line(out.trim()).ok_or_else(|| GitError::UnexpectedOutput {
            args: args.join(" "),
            output: out,
        })
    }

    /// Stash away local modifications to tracked files.
    ///
    /// A clean tree is not an error; git reports "No local changes to save"
    /// and exits successfully.
    pub fn stash_save(&self) -> GitResult<()> {
        self.run(&["stash", "push"]).map(|_| ())
    }

    /// Fast-forward the local branch to the remote head.
    pub fn pull(&self) -> GitResult<()> {
        self.run(&["pull", "--ff-only"]).map(|_| ())
    }

    /// Run a git subcommand, returning stdout on success.
    fn run(&self, args: &[&str]) -> GitResult<String> {
        let output = Command::new(&self.command)
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|source| GitError::Launch {
                command: self.command.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            tracing::debug!(args = args.join(" "), code, %stderr, "git command failed");
            Err(error::classify_failure(&self.workdir, args, code, &stderr))
        }
    }
}

/// Parse one `<hash> <epoch>` head line.
fn parse_head_line(line: &str) -> Option<VersionHandle> {
    let (hash, epoch) = line.split_once(' ')?;
    let secs: i64 = epoch.trim().parse().ok()?;
    let timestamp = DateTime::<Utc>::from_timestamp(secs, 0)?;
    Some(VersionHandle::new(hash, timestamp))
}

/// Parse one `for-each-ref` line: `<remote>/<branch> <hash> <epoch>`.
fn parse_ref_line(line: &str, remote: &str) -> Option<(String, VersionHandle)> {
    let mut parts = line.split_whitespace();
    let refname = parts.next()?;
    let hash = parts.next()?;
    let epoch: i64 = parts.next()?.parse().ok()?;

    let name = refname.strip_prefix(remote)?.strip_prefix('/')?;
    let timestamp = DateTime::<Utc>::from_timestamp(epoch, 0)?;
    Some((name.to_string(), VersionHandle::new(hash, timestamp)))
}
