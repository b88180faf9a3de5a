use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "GIT_SIGSTASH_CONFIG";
/// Environment variable overriding the git executable
pub const GIT_ENV: &str = "GIT_SIGSTASH_GIT";

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str() {
        if let Some(stripped) = s.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if s == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Configuration for git-sigstash
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigstashConfig {
    /// Git executable used for fast-export and fast-import
    #[serde(default = "defaults::git_binary")]
    pub git_binary: PathBuf,
    /// Ref selectors exported when none are given on the command line
    #[serde(default = "defaults::default_refs")]
    pub default_refs: Vec<String>,
    /// Pass --force to git fast-import so rewritten branches may move
    #[serde(default = "defaults::enabled")]
    pub force_import: bool,
    /// Pass --show-original-ids to git fast-export
    #[serde(default = "defaults::enabled")]
    pub show_original_ids: bool,
}

impl Default for SigstashConfig {
    fn default() -> Self {
        Self {
            git_binary: defaults::git_binary(),
            default_refs: defaults::default_refs(),
            force_import: defaults::enabled(),
            show_original_ids: defaults::enabled(),
        }
    }
}

impl SigstashConfig {
    /// Load configuration from the config file (if any) and environment variables
    pub fn load() -> Result<Self> {
        Self::load_with_env(|key| env::var(key).ok())
    }

    /// Load configuration, resolving environment variables through `lookup`
    pub fn load_with_env<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = match lookup(CONFIG_ENV) {
            Some(path) => expand_tilde(Path::new(&path)),
            None => Self::config_file_path()?,
        };
        tracing::debug!("loading git-sigstash config from {:?}", config_path);

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            tracing::debug!("no config file at {:?}, using defaults", config_path);
            Self::default()
        };

        if let Some(git) = lookup(GIT_ENV) {
            config.git_binary = expand_tilde(Path::new(&git));
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: SigstashConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.git_binary = expand_tilde(&config.git_binary);
        if config.default_refs.is_empty() {
            anyhow::bail!("default_refs in {:?} must name at least one ref", path);
        }

        Ok(config)
    }

    /// Get default config file path
    pub fn config_file_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".config/git-sigstash/config.yaml"))
            .context("Could not determine home directory for config file")
    }
}

mod defaults {
    use std::path::PathBuf;

    pub(crate) fn git_binary() -> PathBuf {
        PathBuf::from("git")
    }

    pub(crate) fn default_refs() -> Vec<String> {
        vec!["--all".to_string()]
    }

    pub(crate) fn enabled() -> bool {
        true
    }
}
