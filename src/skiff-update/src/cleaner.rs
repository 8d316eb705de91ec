//! Stale compiled-artifact cleanup after a pull.
//!
//! A pull that removes or renames source files leaves their compiled
//! artifacts behind. The cleaner walks the install tree, deletes artifacts
//! whose source is gone, then prunes directories the deletions emptied.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Pairs compiled artifacts 1:1 with source files by file stem within the
/// same directory (e.g. `plugin.lua` ↔ `plugin.luac`).
#[derive(Debug, Clone)]
pub struct ArtifactRule {
    /// Extension of source files (without dot).
    pub source_ext: String,
    /// Extension of compiled artifacts (without dot).
    pub artifact_ext: String,
}

impl ArtifactRule {
    /// Create a rule from a source/artifact extension pair.
    pub fn new(source_ext: impl Into<String>, artifact_ext: impl Into<String>) -> Self {
        Self {
            source_ext: source_ext.into(),
            artifact_ext: artifact_ext.into(),
        }
    }
}

/// Counters reported by a cleanup pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupStats {
    /// Artifact files deleted.
    pub artifacts_removed: usize,
    /// Emptied directories deleted.
    pub dirs_removed: usize,
}

/// Best-effort cleaner; every failed deletion is logged and skipped, a pass
/// never fails as a whole.
#[derive(Debug)]
pub struct StaleArtifactCleaner {
    root: PathBuf,
    rule: ArtifactRule,
}

impl StaleArtifactCleaner {
    /// Create a cleaner for the given install root.
    pub fn new(root: impl Into<PathBuf>, rule: ArtifactRule) -> Self {
        Self {
            root: root.into(),
            rule,
        }
    }

    /// Run one cleanup pass over the whole tree.
    ///
    /// Directories are visited children-first so that pruning an emptied
    /// subdirectory can in turn empty (and prune) its parent. The root
    /// itself is never deleted.
    pub fn clean(&self) -> CleanupStats {
        let mut stats = CleanupStats::default();

        let walker = WalkDir::new(&self.root).contents_first(true).into_iter();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry during cleanup");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            self.clean_dir(entry.path(), &mut stats);

            if entry.path() != self.root && is_empty_dir(entry.path()) {
                match std::fs::remove_dir(entry.path()) {
                    Ok(()) => {
                        tracing::debug!(path = %entry.path().display(), "removed empty directory");
                        stats.dirs_removed += 1;
                    }
                    Err(e) => {
                        tracing::error!(path = %entry.path().display(), error = %e, "couldn't remove empty directory");
                    }
                }
            }
        }

        stats
    }

    /// Delete artifacts in one directory whose source file no longer exists.
    fn clean_dir(&self, dir: &Path, stats: &mut CleanupStats) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "couldn't list directory during cleanup");
                return;
            }
        };

        let mut artifacts: Vec<PathBuf> = Vec::new();
        let mut source_stems: HashSet<std::ffi::OsString> = HashSet::new();

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if has_ext(&path, &self.rule.artifact_ext) {
                artifacts.push(path);
            } else if has_ext(&path, &self.rule.source_ext) {
                if let Some(stem) = path.file_stem() {
                    source_stems.insert(stem.to_os_string());
                }
            }
        }

        for artifact in artifacts {
            let excess = artifact
                .file_stem()
                .is_none_or(|stem| !source_stems.contains(stem));
            if !excess {
                continue;
            }
            tracing::debug!(path = %artifact.display(), "removing stale artifact");
            match std::fs::remove_file(&artifact) {
                Ok(()) => stats.artifacts_removed += 1,
                Err(e) => {
                    tracing::error!(path = %artifact.display(), error = %e, "couldn't remove stale artifact");
                }
            }
        }
    }
}

fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension() == Some(OsStr::new(ext))
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rule() -> ArtifactRule {
        ArtifactRule::new("src", "compiled")
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_keeps_artifact_with_matching_source() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("foo.src"));
        touch(&tmp.path().join("foo.compiled"));
        touch(&tmp.path().join("bar.compiled"));

        let stats = StaleArtifactCleaner::new(tmp.path(), rule()).clean();

        assert_eq!(stats.artifacts_removed, 1);
        assert!(tmp.path().join("foo.compiled").exists());
        assert!(tmp.path().join("foo.src").exists());
        assert!(!tmp.path().join("bar.compiled").exists());
    }

    #[test]
    fn test_prunes_directory_emptied_by_cleanup() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("old_module");
        std::fs::create_dir(&sub).unwrap();
        touch(&sub.join("gone.compiled"));

        let stats = StaleArtifactCleaner::new(tmp.path(), rule()).clean();

        assert_eq!(stats, CleanupStats { artifacts_removed: 1, dirs_removed: 1 });
        assert!(!sub.exists());
        assert!(tmp.path().exists());
    }

    #[test]
    fn test_prunes_nested_empty_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let inner = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&inner).unwrap();
        touch(&inner.join("gone.compiled"));

        let stats = StaleArtifactCleaner::new(tmp.path(), rule()).clean();

        assert_eq!(stats.artifacts_removed, 1);
        assert_eq!(stats.dirs_removed, 2);
        assert!(!tmp.path().join("a").exists());
    }

    #[test]
    fn test_never_deletes_non_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("module");
        std::fs::create_dir(&sub).unwrap();
        touch(&sub.join("keep.src"));
        touch(&sub.join("gone.compiled"));

        let stats = StaleArtifactCleaner::new(tmp.path(), rule()).clean();

        assert_eq!(stats.dirs_removed, 0);
        assert!(sub.exists());
        assert!(sub.join("keep.src").exists());
    }

    #[test]
    fn test_ignores_unrelated_files() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("README.md"));
        touch(&tmp.path().join("data.bin"));

        let stats = StaleArtifactCleaner::new(tmp.path(), rule()).clean();

        assert_eq!(stats, CleanupStats::default());
        assert!(tmp.path().join("README.md").exists());
    }

    #[test]
    fn test_empty_directory_without_artifacts_is_pruned() {
        // A directory left empty by the pull itself, not by artifact removal.
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("husk")).unwrap();

        let stats = StaleArtifactCleaner::new(tmp.path(), rule()).clean();

        assert_eq!(stats.dirs_removed, 1);
    }
}
