//! Orchestrator trait - the build system consuming descriptors.
//!
//! Descriptors are only ever read by the orchestrator. It decides whether a
//! path exists, which platform is the host, and what to do with native
//! dependencies at each stage.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::Result;

use crate::core::errors::EvalError;
use crate::core::native_deps::DependencySet;
use crate::core::platform::PlatformTarget;
use crate::core::project::{PackageName, ProjectDescriptor};
use crate::core::registration::CrateRegistration;

/// Build stage a dependency set is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Building the project's transitive dependencies
    Deps,
    /// Building the project itself
    Build,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Deps => write!(f, "deps"),
            Stage::Build => write!(f, "build"),
        }
    }
}

/// A build orchestrator.
///
/// Implementations are expected to be deterministic: the same descriptor
/// always gets the same answer.
pub trait Orchestrator {
    /// Check that `path` is an existing directory.
    fn resolve_path(&self, path: &Path) -> bool;

    /// The platform evaluations run on.
    fn host(&self) -> PlatformTarget {
        PlatformTarget::host()
    }

    /// Reject profile selectors a platform cannot express.
    ///
    /// `descriptor` has its implicit host target already materialized.
    fn check_profiles(&self, descriptor: &ProjectDescriptor) -> Result<(), EvalError> {
        match descriptor.targets().unsupported().next() {
            Some((platform, selector)) => Err(EvalError::UnsupportedProfileSelector {
                project: descriptor.name().to_string(),
                platform: platform.to_string(),
                selector: selector.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Accept a composed descriptor.
    fn register_project(&mut self, descriptor: &ProjectDescriptor) -> Result<()>;

    /// Make native dependencies available for one stage of a project.
    fn install_native_dependencies(
        &mut self,
        project: &PackageName,
        deps: &DependencySet,
        stage: Stage,
    ) -> Result<()>;

    /// Expose a registered project as a crate.
    fn register_crate(
        &mut self,
        registration: &CrateRegistration,
        descriptor: &ProjectDescriptor,
    ) -> Result<()>;

    /// Undo a hand-off of `project` that failed part way, or that belongs to
    /// an evaluation that failed later.
    ///
    /// `previous` is the descriptor registered before the failed attempt;
    /// when present the orchestrator should return to it, otherwise forget
    /// the project. Orchestrators that stage their state until the end of an
    /// evaluation can keep the default, which does nothing.
    fn rollback(
        &mut self,
        project: &PackageName,
        previous: Option<&ProjectDescriptor>,
    ) -> Result<()> {
        let _ = (project, previous);
        Ok(())
    }
}

/// One call to [`Orchestrator::install_native_dependencies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub project: PackageName,
    pub stage: Stage,
    pub deps: DependencySet,
}

/// An orchestrator that records what it is handed.
///
/// Paths are checked against the real filesystem. Used by the CLI to show
/// what a build system would receive, and by tests.
#[derive(Debug, Default)]
pub struct RecordingOrchestrator {
    host: Option<PlatformTarget>,
    projects: BTreeMap<PackageName, ProjectDescriptor>,
    crates: Vec<CrateRegistration>,
    installations: Vec<Installation>,
}

impl RecordingOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend to run on `host` instead of the detected platform.
    pub fn with_host(mut self, host: PlatformTarget) -> Self {
        self.host = Some(host);
        self
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectDescriptor> {
        self.projects.values()
    }

    pub fn project(&self, name: &str) -> Option<&ProjectDescriptor> {
        self.projects.get(name)
    }

    pub fn crates(&self) -> &[CrateRegistration] {
        &self.crates
    }

    pub fn installations(&self) -> &[Installation] {
        &self.installations
    }
}

impl Orchestrator for RecordingOrchestrator {
    fn resolve_path(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn host(&self) -> PlatformTarget {
        self.host.clone().unwrap_or_else(PlatformTarget::host)
    }

    fn register_project(&mut self, descriptor: &ProjectDescriptor) -> Result<()> {
        self.projects
            .insert(descriptor.name().clone(), descriptor.clone());
        Ok(())
    }

    fn install_native_dependencies(
        &mut self,
        project: &PackageName,
        deps: &DependencySet,
        stage: Stage,
    ) -> Result<()> {
        self.installations.push(Installation {
            project: project.clone(),
            stage,
            deps: deps.clone(),
        });
        Ok(())
    }

    fn register_crate(
        &mut self,
        registration: &CrateRegistration,
        _descriptor: &ProjectDescriptor,
    ) -> Result<()> {
        if !self.crates.contains(registration) {
            self.crates.push(registration.clone());
        }
        Ok(())
    }

    fn rollback(
        &mut self,
        project: &PackageName,
        previous: Option<&ProjectDescriptor>,
    ) -> Result<()> {
        self.installations.retain(|i| &i.project != project);
        match previous {
            Some(descriptor) => {
                self.projects.insert(project.clone(), descriptor.clone());
                for (deps, stage) in [
                    (descriptor.deps_config(), Stage::Deps),
                    (descriptor.build_config(), Stage::Build),
                ] {
                    self.installations.push(Installation {
                        project: project.clone(),
                        stage,
                        deps: deps.clone(),
                    });
                }
            }
            None => {
                self.projects.remove(project);
                self.crates.retain(|c| &c.name != project);
            }
        }
        Ok(())
    }
}

/// Records like [`RecordingOrchestrator`] but refuses to install native
/// dependencies for one project and stage.
#[cfg(test)]
pub(crate) struct FailingOrchestrator {
    inner: RecordingOrchestrator,
    fail_on: Option<(String, Stage)>,
}

#[cfg(test)]
impl FailingOrchestrator {
    pub(crate) fn new(project: &str, stage: Stage) -> Self {
        let mut orch = FailingOrchestrator {
            inner: RecordingOrchestrator::new().with_host(PlatformTarget::X86_64LinuxGnu),
            fail_on: None,
        };
        orch.fail_on(project, stage);
        orch
    }

    pub(crate) fn fail_on(&mut self, project: &str, stage: Stage) {
        self.fail_on = Some((project.to_string(), stage));
    }

    pub(crate) fn succeed(&mut self) {
        self.fail_on = None;
    }

    pub(crate) fn inner(&self) -> &RecordingOrchestrator {
        &self.inner
    }
}

#[cfg(test)]
impl Orchestrator for FailingOrchestrator {
    fn resolve_path(&self, path: &Path) -> bool {
        self.inner.resolve_path(path)
    }

    fn host(&self) -> PlatformTarget {
        self.inner.host()
    }

    fn register_project(&mut self, descriptor: &ProjectDescriptor) -> Result<()> {
        self.inner.register_project(descriptor)
    }

    fn install_native_dependencies(
        &mut self,
        project: &PackageName,
        deps: &DependencySet,
        stage: Stage,
    ) -> Result<()> {
        if self
            .fail_on
            .as_ref()
            .is_some_and(|(p, s)| p == project.as_str() && *s == stage)
        {
            anyhow::bail!("cannot install {} dependencies", stage);
        }
        self.inner.install_native_dependencies(project, deps, stage)
    }

    fn register_crate(
        &mut self,
        registration: &CrateRegistration,
        descriptor: &ProjectDescriptor,
    ) -> Result<()> {
        self.inner.register_crate(registration, descriptor)
    }

    fn rollback(
        &mut self,
        project: &PackageName,
        previous: Option<&ProjectDescriptor>,
    ) -> Result<()> {
        self.inner.rollback(project, previous)
    }
}
