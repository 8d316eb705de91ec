//! Updater configuration types.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Repository the updater tracks by default.
pub const DEFAULT_REPOSITORY: &str = "skiff-app/skiff";

/// User configuration for the self-updater.
///
/// Read-only at runtime; the embedding application loads or constructs this
/// once and hands it to [`crate::Updater`] at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Repository identifier ("owner/name"), informational only.
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Git invocation command (default: "git").
    #[serde(default = "default_git_command")]
    pub git_command: String,

    /// Apply updates without asking as soon as they are discovered.
    #[serde(default)]
    pub automatic: bool,

    /// Emit an `update.available` notification when not auto-applying.
    #[serde(default = "default_true")]
    pub notification: bool,

    /// Development mode: skip the remote fetch and compare against whatever
    /// remote state is already known locally.
    #[serde(default)]
    pub dev: bool,

    /// Whether the install is a git clone at all. When false the subsystem
    /// is disabled and never touches the backend.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hours between periodic checks (default: 6).
    #[serde(default = "default_interval_hours")]
    pub check_interval_hours: u64,
}

fn default_repository() -> String {
    DEFAULT_REPOSITORY.to_string()
}

fn default_git_command() -> String {
    "git".to_string()
}

fn default_true() -> bool {
    true
}

fn default_interval_hours() -> u64 {
    6
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            git_command: default_git_command(),
            automatic: false,
            notification: true,
            dev: false,
            enabled: true,
            check_interval_hours: default_interval_hours(),
        }
    }
}

impl UpdaterConfig {
    /// Load config from a JSON file, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        if let Ok(content) = std::fs::read_to_string(path) {
            match serde_json::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring malformed updater config");
                }
            }
        }
        Self::default()
    }

    /// Save config to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = UpdaterConfig::default();
        assert_eq!(config.git_command, "git");
        assert!(!config.automatic);
        assert!(config.notification);
        assert!(config.enabled);
        assert_eq!(config.check_interval_hours, 6);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = UpdaterConfig::load(&tmp.path().join("nope.json"));
        assert_eq!(config.repository, DEFAULT_REPOSITORY);
    }

    #[test]
    fn test_partial_json_uses_field_defaults() {
        let config: UpdaterConfig = serde_json::from_str(r#"{"automatic": true}"#).unwrap();
        assert!(config.automatic);
        assert_eq!(config.git_command, "git");
        assert!(config.enabled);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("conf").join("updater.json");

        let config = UpdaterConfig {
            automatic: true,
            git_command: "/usr/local/bin/git".to_string(),
            ..UpdaterConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = UpdaterConfig::load(&path);
        assert!(loaded.automatic);
        assert_eq!(loaded.git_command, "/usr/local/bin/git");
    }
}
