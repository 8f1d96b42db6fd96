use crate::domain::{ProjectRoot, TagMode};
use crate::error::Result;
use crate::ledger::VersionLedger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "release-ledger.toml";

/// Represents the complete configuration for release-ledger.
///
/// Contains the ledger location, project roots, tag mode and behavior options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_ledger_path")]
    pub ledger: PathBuf,

    #[serde(default)]
    pub mode: TagMode,

    #[serde(default)]
    pub changelog_dir: Option<PathBuf>,

    #[serde(default = "default_remote")]
    pub remote: String,

    /// Project id -> path prefix. Empty means every ledger project under `src/{id}/`.
    #[serde(default)]
    pub projects: BTreeMap<String, String>,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

/// Returns the default ledger file path.
fn default_ledger_path() -> PathBuf {
    PathBuf::from("versions.json")
}

/// Returns the default remote name.
fn default_remote() -> String {
    "origin".to_string()
}

/// Returns the default number of extra attempts after a ledger write conflict.
fn default_conflict_retries() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Configuration for behavior customization.
///
/// Controls side effects of a release without affecting version computation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BehaviorConfig {
    #[serde(default = "default_true")]
    pub create_tags: bool,

    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            create_tags: true,
            conflict_retries: default_conflict_retries(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ledger: default_ledger_path(),
            mode: TagMode::default(),
            changelog_dir: None,
            remote: default_remote(),
            projects: BTreeMap::new(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl Config {
    /// Project roots used for change detection.
    ///
    /// Explicitly configured projects win; otherwise every project in the
    /// ledger is assumed to live under `src/{id}/`.
    pub fn project_roots(&self, ledger: &VersionLedger) -> Vec<ProjectRoot> {
        if self.projects.is_empty() {
            ledger.projects().map(ProjectRoot::conventional).collect()
        } else {
            self.projects
                .iter()
                .map(|(id, prefix)| ProjectRoot::new(id.as_str(), prefix.as_str()))
                .collect()
        }
    }

    /// Root of a single project, falling back to the conventional layout
    pub fn project_root(&self, project: &str) -> ProjectRoot {
        match self.projects.get(project) {
            Some(prefix) => ProjectRoot::new(project, prefix.as_str()),
            None => ProjectRoot::conventional(project),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release-ledger.toml` in current directory
/// 3. `.release-ledger.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);

    let source = if let Some(path) = config_path {
        Some(path.to_path_buf())
    } else if local.exists() {
        Some(local)
    } else {
        dirs::config_dir()
            .map(|dir| dir.join(format!(".{}", CONFIG_FILE_NAME)))
            .filter(|path| path.exists())
    };

    match source {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            let config_str = fs::read_to_string(&path)?;
            Ok(toml::from_str(&config_str)?)
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ledger, PathBuf::from("versions.json"));
        assert_eq!(config.mode, TagMode::Multi);
        assert!(config.behavior.create_tags);
        assert_eq!(config.behavior.conflict_retries, 1);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_project_roots_follow_ledger_order() {
        let ledger =
            VersionLedger::from_json(r#"{"b":{"version":"0.1.0"},"a":{"version":"0.1.0"}}"#)
                .unwrap();
        let roots = Config::default().project_roots(&ledger);
        assert_eq!(
            roots,
            vec![ProjectRoot::conventional("b"), ProjectRoot::conventional("a")]
        );
    }

    #[test]
    fn test_project_roots_from_config() {
        let config: Config = toml::from_str(
            r#"
[projects]
web = "apps/web"
"#,
        )
        .unwrap();
        let roots = config.project_roots(&VersionLedger::new());
        assert_eq!(roots, vec![ProjectRoot::new("web", "apps/web/")]);
        assert_eq!(config.project_root("web").prefix, "apps/web/");
        assert_eq!(config.project_root("other").prefix, "src/other/");
    }
}
