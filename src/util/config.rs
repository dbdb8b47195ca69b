//! Configuration file support for Dockyard.
//!
//! Two locations are read:
//! - Global: `~/.dockyard/config.toml` - user-wide defaults
//! - Project: `.dockyard/config.toml` next to the manifest - overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::platform::PlatformTarget;

/// Dockyard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Evaluation settings
    pub evaluation: EvaluationConfig,

    /// Terminal output settings
    pub output: OutputConfig,
}

/// Evaluation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Platform used for projects without targets (triple or alias).
    /// Detected from the running machine when unset.
    pub host: Option<String>,
}

/// Terminal output settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Colored diagnostics (default: true)
    pub color: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
            Self::default()
        })
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.evaluation.host.is_some() {
            self.evaluation.host = other.evaluation.host;
        }
        if other.output.color.is_some() {
            self.output.color = other.output.color;
        }
    }

    /// The configured host platform, or the detected one.
    pub fn host(&self) -> Result<PlatformTarget> {
        match &self.evaluation.host {
            Some(id) => id
                .parse()
                .with_context(|| format!("invalid `evaluation.host` in config: {}", id)),
            None => Ok(PlatformTarget::host()),
        }
    }

    pub fn color(&self) -> bool {
        self.output.color.unwrap_or(true)
    }
}

/// Load merged configuration from global and project locations.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global) = global_path {
        config.merge(Config::load_or_default(global));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global dockyard config directory (~/.dockyard).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".dockyard"))
}

/// Get the global config path (~/.dockyard/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.dockyard/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".dockyard").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.evaluation.host.is_none());
        assert!(config.color());
        assert_eq!(config.host().unwrap(), PlatformTarget::host());
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = project_config_path(tmp.path());
        std::fs::create_dir_all(project.parent().unwrap()).unwrap();

        std::fs::write(
            &global,
            r#"
[evaluation]
host = "linux-aarch64"

[output]
color = false
"#,
        )
        .unwrap();
        std::fs::write(&project, "[evaluation]\nhost = \"wasm-wasi\"\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(config.host().unwrap(), PlatformTarget::Wasm32Wasip1);
        assert!(!config.color());
    }

    #[test]
    fn test_broken_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[evaluation\n").unwrap();

        assert_eq!(Config::load_or_default(&path), Config::default());
    }

    #[test]
    fn test_invalid_host() {
        let config = Config {
            evaluation: EvaluationConfig {
                host: Some("linux-x64".to_string()),
            },
            ..Config::default()
        };
        assert!(config.host().is_err());
    }
}
