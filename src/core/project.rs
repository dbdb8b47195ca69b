//! Project declarations and the composed descriptor.
//!
//! A project names one source package, points at the directory holding its
//! build manifest, and attaches native dependencies to two stages: building
//! its dependency graph (`deps_config`) and building the package itself
//! (`build_config`). The two are usually the same set but can be overridden
//! independently.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::EvalError;
use crate::core::native_deps::DependencySet;
use crate::core::platform::PlatformTarget;
use crate::core::profile::ProfileSelector;
use crate::core::target_matrix::TargetMatrix;

/// A non-empty package name, stored without surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    pub fn new(name: impl Into<String>) -> Result<Self, EvalError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EvalError::EmptyName { field: "name" });
        }
        Ok(PackageName(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input to a project declaration.
///
/// `build_config` falls back to `deps_config` when it is not set.
#[derive(Debug, Clone)]
pub struct ProjectDeclaration {
    name: PackageName,
    path: PathBuf,
    deps_config: DependencySet,
    build_config: Option<DependencySet>,
    targets: TargetMatrix,
}

impl ProjectDeclaration {
    pub fn new(name: PackageName, path: impl Into<PathBuf>) -> Self {
        ProjectDeclaration {
            name,
            path: path.into(),
            deps_config: DependencySet::new(),
            build_config: None,
            targets: TargetMatrix::new(),
        }
    }

    /// Native dependencies for the dependency-graph build stage.
    pub fn deps_config(mut self, deps: DependencySet) -> Self {
        self.deps_config = deps;
        self
    }

    /// Native dependencies for the package's own build stage.
    pub fn build_config(mut self, build: DependencySet) -> Self {
        self.build_config = Some(build);
        self
    }

    /// Add a target. See [`TargetMatrix::insert`].
    pub fn target(mut self, platform: PlatformTarget, selector: ProfileSelector) -> Self {
        self.targets.insert(platform, selector);
        self
    }

    pub fn targets(mut self, targets: TargetMatrix) -> Self {
        self.targets = targets;
        self
    }

    pub fn name(&self) -> &PackageName {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve into a descriptor, anchoring relative paths at `root`.
    pub(crate) fn into_descriptor(self, root: &Path) -> ProjectDescriptor {
        let path = if self.path.is_relative() {
            root.join(&self.path)
        } else {
            self.path
        };
        let build_config = self
            .build_config
            .unwrap_or_else(|| self.deps_config.clone());

        ProjectDescriptor {
            name: self.name,
            path,
            deps_config: self.deps_config,
            build_config,
            targets: self.targets,
        }
    }
}

/// The composed build descriptor handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDescriptor {
    name: PackageName,
    path: PathBuf,
    deps_config: DependencySet,
    build_config: DependencySet,
    targets: TargetMatrix,
}

impl ProjectDescriptor {
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// Directory holding the package's build manifest.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn deps_config(&self) -> &DependencySet {
        &self.deps_config
    }

    pub fn build_config(&self) -> &DependencySet {
        &self.build_config
    }

    /// Targets as declared. May be empty; see [`Self::effective_targets`].
    pub fn targets(&self) -> &TargetMatrix {
        &self.targets
    }

    pub fn effective_targets(&self, host: &PlatformTarget) -> TargetMatrix {
        self.targets.effective(host)
    }

    /// Return the descriptor with `platform` set to `selector`.
    ///
    /// Setting a platform again replaces its selector.
    pub fn add_target(mut self, platform: PlatformTarget, selector: ProfileSelector) -> Self {
        self.set_target(platform, selector);
        self
    }

    pub(crate) fn set_target(&mut self, platform: PlatformTarget, selector: ProfileSelector) {
        self.targets.insert(platform, selector);
    }

    pub(crate) fn set_deps_config(&mut self, deps: DependencySet) {
        self.deps_config = deps;
    }

    pub(crate) fn set_build_config(&mut self, build: DependencySet) {
        self.build_config = build;
    }

    /// The descriptor with its implicit host target materialized.
    pub(crate) fn composed(&self, host: &PlatformTarget) -> ProjectDescriptor {
        ProjectDescriptor {
            targets: self.effective_targets(host),
            ..self.clone()
        }
    }
}
