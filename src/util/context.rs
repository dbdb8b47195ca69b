//! Global context for Dockyard operations.
//!
//! Holds the working directory and merged configuration, and knows how to
//! find the manifest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::errors::EvalError;
use crate::core::manifest::find_manifest;
use crate::core::orchestrator::RecordingOrchestrator;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged global and project configuration
    config: Config,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a context for the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a context for a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let config = load_config(global_config_path().as_deref(), &project_config_path(&cwd));
        let color = config.color();
        GlobalContext { cwd, config, color }
    }

    /// Replace the configuration (the manifest directory may carry its own).
    pub fn with_config(mut self, config: Config) -> Self {
        self.color = config.color();
        self.config = config;
        self
    }

    /// Disable colored output.
    pub fn disable_color(&mut self) {
        self.color = false;
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Find the manifest starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, EvalError> {
        let mut current = self.cwd.clone();
        loop {
            match find_manifest(&current) {
                Err(EvalError::ManifestNotFound { .. }) => {
                    if !current.pop() {
                        return Err(EvalError::ManifestNotFound {
                            dir: self.cwd.clone(),
                        });
                    }
                }
                found => return found,
            }
        }
    }

    /// An orchestrator for this context, honouring a configured host.
    pub fn orchestrator(&self) -> Result<RecordingOrchestrator> {
        Ok(RecordingOrchestrator::new().with_host(self.config.host()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::MANIFEST_NAME;
    use crate::core::platform::PlatformTarget;
    use crate::core::orchestrator::Orchestrator;
    use tempfile::TempDir;

    #[test]
    fn test_find_manifest_upward() {
        let tmp = TempDir::new().unwrap();
        let manifest = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&manifest, "").unwrap();
        let nested = tmp.path().join("crates").join("core");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = GlobalContext::with_cwd(nested);
        assert_eq!(ctx.find_manifest().unwrap(), manifest);
    }

    #[test]
    fn test_find_manifest_missing() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        // A manifest in an ancestor of the temp dir would be found instead.
        if let Err(err) = ctx.find_manifest() {
            assert!(matches!(err, EvalError::ManifestNotFound { ref dir } if dir == tmp.path()));
        }
    }

    #[test]
    fn test_project_config_sets_host() {
        let tmp = TempDir::new().unwrap();
        let config_path = project_config_path(tmp.path());
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(&config_path, "[evaluation]\nhost = \"macos-aarch64\"\n").unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        let orch = ctx.orchestrator().unwrap();
        assert_eq!(orch.host(), PlatformTarget::Aarch64Darwin);
    }
}
