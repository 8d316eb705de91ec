//! Error types for git operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for git operations.
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Errors surfaced by the git CLI adapter.
#[derive(Debug, Error)]
pub enum GitError {
    /// The working tree is not a usable clone (no repository metadata, or a
    /// repository without any commit history). Source-only installs land here.
    #[error("no usable git metadata in {path}")]
    BackendUnavailable { path: PathBuf },

    /// The remote could not be reached.
    #[error("network failure talking to the remote: {stderr}")]
    Network { stderr: String },

    /// A pull could not fast-forward (divergent history).
    #[error("pull cannot fast-forward: {stderr}")]
    MergeConflict { stderr: String },

    /// Local modifications block the operation (stash or pull rejected).
    #[error("local changes block the operation: {stderr}")]
    LocalChanges { stderr: String },

    /// The configured git binary could not be launched at all.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Unclassified non-zero exit.
    #[error("`git {args}` exited with status {code}: {stderr}")]
    CommandFailed {
        args: String,
        code: i32,
        stderr: String,
    },

    /// Command output did not parse as expected.
    #[error("unexpected output from `git {args}`: {output}")]
    UnexpectedOutput { args: String, output: String },
}

impl GitError {
    /// Transient failures are worth retrying on the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Map a failed git invocation onto the error taxonomy by inspecting stderr.
///
/// Patterns are matched case-insensitively. Anything unrecognized becomes
/// [`GitError::CommandFailed`] with the full stderr preserved.
pub(crate) fn classify_failure(
    workdir: &std::path::Path,
    args: &[&str],
    code: i32,
    stderr: &str,
) -> GitError {
    let lower = stderr.to_lowercase();

    const UNAVAILABLE: &[&str] = &[
        "not a git repository",
        "does not have any commits",
        "bad default revision",
        "unknown revision",
        "ambiguous argument 'head'",
    ];
    const LOCAL_CHANGES: &[&str] = &[
        "would be overwritten by",
        "uncommitted changes",
        "please commit your changes",
        "cannot stash",
        "unmerged entries",
    ];
    const MERGE_CONFLICT: &[&str] = &[
        "merge conflict",
        "not possible to fast-forward",
        "needs merge",
        "have diverged",
        "automatic merge failed",
        "fix conflicts",
    ];
    const NETWORK: &[&str] = &[
        "could not resolve host",
        "unable to access",
        "could not read from remote",
        "connection timed out",
        "connection refused",
        "network is unreachable",
        "operation timed out",
        "early eof",
        "remote end hung up",
    ];

    let matches_any = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

    if matches_any(UNAVAILABLE) {
        GitError::BackendUnavailable {
            path: workdir.to_path_buf(),
        }
    } else if matches_any(LOCAL_CHANGES) {
        GitError::LocalChanges {
            stderr: stderr.trim().to_string(),
        }
    } else if matches_any(MERGE_CONFLICT) {
        GitError::MergeConflict {
            stderr: stderr.trim().to_string(),
        }
    } else if matches_any(NETWORK) {
        GitError::Network {
            stderr: stderr.trim().to_string(),
        }
    } else {
        GitError::CommandFailed {
            args: args.join(" "),
            code,
            stderr: stderr.trim().to_string(),
        }
    }
}
