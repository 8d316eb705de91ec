//! Integration tests against a real git binary.
//!
//! Each test builds throwaway repositories under a temp directory. When git
//! is not installed the tests return early instead of failing.

use std::path::Path;
use std::process::Command;

use assert_matches::assert_matches;
use chrono::{DateTime, Utc};
use skiff_utils_git::{GitClient, GitError};
use tempfile::TempDir;

const T0: i64 = 1_700_000_000;
const T1: i64 = 1_700_086_400;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_SYSTEM", "/dev/null")
        .status()
        .expect("failed to launch git");
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

fn commit(dir: &Path, message: &str, epoch: i64) {
    let date = format!("{epoch} +0000");
    let status = Command::new("git")
        .args(["commit", "--allow-empty", "-m", message])
        .current_dir(dir)
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .env("GIT_CONFIG_SYSTEM", "/dev/null")
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", &date)
        .env("GIT_COMMITTER_DATE", &date)
        .status()
        .expect("failed to launch git");
    assert!(status.success(), "commit failed in {}", dir.display());
}

fn init_repo(dir: &Path) {
    git(dir, &["init", "-b", "main"]);
    git(dir, &["config", "user.name", "test"]);
    git(dir, &["config", "user.email", "test@example.com"]);
}

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

#[test]
fn current_branch_and_local_head() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    init_repo(tmp.path());
    commit(tmp.path(), "initial", T0);

    let client = GitClient::new(tmp.path());
    assert_eq!(client.current_branch().unwrap(), "main");

    let head = client.local_head().unwrap();
    assert_eq!(head.hash.len(), 8);
    assert_eq!(head.timestamp, ts(T0));
}

#[test]
fn non_repository_is_backend_unavailable() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    let client = GitClient::new(tmp.path());

    assert_matches!(client.current_branch(), Err(GitError::BackendUnavailable { .. }));
    assert_matches!(client.local_head(), Err(GitError::BackendUnavailable { .. }));
}

#[test]
fn empty_repository_has_no_head() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    init_repo(tmp.path());

    let client = GitClient::new(tmp.path());
    assert_matches!(client.local_head(), Err(GitError::BackendUnavailable { .. }));
}

#[test]
fn missing_binary_is_launch_error() {
    let tmp = TempDir::new().unwrap();
    let client = GitClient::with_command(tmp.path(), "skiff-no-such-git-binary");
    assert_matches!(client.current_branch(), Err(GitError::Launch { .. }));
}

#[test]
fn fetch_remote_branches_and_pull() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    let upstream = tmp.path().join("upstream");
    let clone = tmp.path().join("clone");
    std::fs::create_dir(&upstream).unwrap();

    init_repo(&upstream);
    commit(&upstream, "initial", T0);
    git(
        tmp.path(),
        &["clone", upstream.to_str().unwrap(), clone.to_str().unwrap()],
    );

    // Upstream moves ahead by one commit.
    commit(&upstream, "newer", T1);

    let client = GitClient::new(&clone);
    client.fetch("origin").unwrap();

    let branches = client.remote_branches("origin").unwrap();
    let main = branches.iter().find(|b| b.name == "main").expect("main branch");
    assert_eq!(main.head.timestamp, ts(T1));
    assert!(branches.iter().all(|b| b.name != "HEAD"));

    let local = client.local_head().unwrap();
    assert!(local.timestamp < main.head.timestamp);

    client.pull().unwrap();
    assert_eq!(client.local_head().unwrap(), main.head);
}

#[test]
fn stash_save_clears_local_modifications() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    init_repo(tmp.path());
    std::fs::write(tmp.path().join("app.conf"), "port = 5050\n").unwrap();
    git(tmp.path(), &["add", "app.conf"]);
    commit(tmp.path(), "initial", T0);

    std::fs::write(tmp.path().join("app.conf"), "port = 5051\n").unwrap();

    let client = GitClient::new(tmp.path());
    client.stash_save().unwrap();

    let content = std::fs::read_to_string(tmp.path().join("app.conf")).unwrap();
    assert_eq!(content, "port = 5050\n");
}

#[test]
fn stash_save_on_clean_tree_is_ok() {
    if !git_available() {
        return;
    }
    let tmp = TempDir::new().unwrap();
    init_repo(tmp.path());
    commit(tmp.path(), "initial", T0);

    let client = GitClient::new(tmp.path());
    client.stash_save().unwrap();
}
