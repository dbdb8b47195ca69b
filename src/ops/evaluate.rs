//! One evaluation: declare projects, compose targets, register crates.
//!
//! Declarations only touch the evaluation's own table. The orchestrator sees
//! nothing until [`Evaluation::register`] has validated the whole descriptor.
//! When the orchestrator itself rejects part of a hand-off, the project is
//! rolled back through [`Orchestrator::rollback`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::errors::EvalError;
use crate::core::native_deps::DependencySet;
use crate::core::orchestrator::{Orchestrator, Stage};
use crate::core::platform::PlatformTarget;
use crate::core::profile::ProfileSelector;
use crate::core::project::{PackageName, ProjectDeclaration, ProjectDescriptor};
use crate::core::registration::{CrateRegistration, RegistrationOutcome};

/// Table of declared and registered projects for a single evaluation.
#[derive(Debug)]
pub struct Evaluation {
    root: PathBuf,
    declared: BTreeMap<PackageName, ProjectDescriptor>,
    registered: BTreeMap<PackageName, ProjectDescriptor>,
}

impl Evaluation {
    /// Start an evaluation. Relative project paths resolve against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Evaluation {
            root: root.into(),
            declared: BTreeMap::new(),
            registered: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Declare a project.
    ///
    /// # Errors
    ///
    /// * [`EvalError::DuplicateProject`] if the name is already declared.
    /// * [`EvalError::InvalidPath`] if the path is not an existing directory.
    pub fn declare_project<O>(
        &mut self,
        orchestrator: &O,
        declaration: ProjectDeclaration,
    ) -> Result<&ProjectDescriptor, EvalError>
    where
        O: Orchestrator + ?Sized,
    {
        let name = declaration.name().clone();
        if self.declared.contains_key(&name) {
            return Err(EvalError::DuplicateProject {
                project: name.to_string(),
            });
        }

        let descriptor = declaration.into_descriptor(&self.root);
        if !orchestrator.resolve_path(descriptor.path()) {
            return Err(EvalError::InvalidPath {
                project: name.to_string(),
                path: descriptor.path().to_path_buf(),
            });
        }

        tracing::debug!(
            "declared project `{}` at {}",
            name,
            descriptor.path().display()
        );
        Ok(self.declared.entry(name).or_insert(descriptor))
    }

    /// Set a target on a declared project. Last write wins per platform.
    pub fn add_target(
        &mut self,
        name: &str,
        platform: PlatformTarget,
        selector: ProfileSelector,
    ) -> Result<(), EvalError> {
        tracing::debug!("target {} = {} for `{}`", platform, selector, name);
        self.declared_mut(name)?.set_target(platform, selector);
        Ok(())
    }

    /// Replace the dependency-stage native dependencies of a project.
    pub fn override_deps_config(&mut self, name: &str, deps: DependencySet) -> Result<(), EvalError> {
        self.declared_mut(name)?.set_deps_config(deps);
        Ok(())
    }

    /// Replace the build-stage native dependencies of a project.
    pub fn override_build_config(
        &mut self,
        name: &str,
        build: DependencySet,
    ) -> Result<(), EvalError> {
        self.declared_mut(name)?.set_build_config(build);
        Ok(())
    }

    /// A declared project, as declared.
    pub fn project(&self, name: &str) -> Option<&ProjectDescriptor> {
        self.declared.get(name)
    }

    pub fn projects(&self) -> impl Iterator<Item = &ProjectDescriptor> {
        self.declared.values()
    }

    /// The descriptor last handed to the orchestrator for `name`.
    pub fn registered(&self, name: &str) -> Option<&ProjectDescriptor> {
        self.registered.get(name)
    }

    /// Declared projects never registered as crates.
    pub fn unregistered(&self) -> impl Iterator<Item = &PackageName> {
        self.declared
            .keys()
            .filter(|name| !self.registered.contains_key(*name))
    }

    /// Compose the descriptor for `name` and validate it, without side effects.
    pub fn prepare<O>(&self, name: &str, orchestrator: &O) -> Result<ProjectDescriptor, EvalError>
    where
        O: Orchestrator + ?Sized,
    {
        let descriptor = self
            .project(name)
            .ok_or_else(|| self.unknown_project(name))?
            .composed(&orchestrator.host());
        orchestrator.check_profiles(&descriptor)?;
        Ok(descriptor)
    }

    /// Register a declared project as a crate.
    ///
    /// Registering an unchanged descriptor again does nothing. A changed
    /// descriptor replaces the previous registration. If any orchestrator
    /// call fails, the orchestrator is rolled back to the previous
    /// registration (or to none).
    pub fn register<O>(
        &mut self,
        name: &str,
        orchestrator: &mut O,
    ) -> Result<RegistrationOutcome, EvalError>
    where
        O: Orchestrator + ?Sized,
    {
        let descriptor = self.prepare(name, orchestrator)?;
        let name = descriptor.name().clone();

        let outcome = match self.registered.get(&name) {
            Some(previous) if *previous == descriptor => {
                tracing::debug!("`{}` already registered, unchanged", name);
                return Ok(RegistrationOutcome::Unchanged);
            }
            Some(_) => RegistrationOutcome::Replaced,
            None => RegistrationOutcome::Registered,
        };

        if let Err(err) = hand_off(orchestrator, &descriptor) {
            let previous = self.registered.get(&name);
            if let Err(undo) = orchestrator.rollback(&name, previous) {
                tracing::warn!("failed to roll back `{}`: {:#}", name, undo);
            }
            return Err(EvalError::Orchestrator {
                project: name.to_string(),
                message: format!("{:#}", err),
            });
        }

        tracing::info!(
            "registered crate `{}` for {} target(s)",
            name,
            descriptor.targets().len()
        );
        self.registered.insert(name, descriptor);
        Ok(outcome)
    }

    /// Withdraw every registration this evaluation handed over.
    pub fn roll_back<O>(&mut self, orchestrator: &mut O)
    where
        O: Orchestrator + ?Sized,
    {
        while let Some((name, _)) = self.registered.pop_last() {
            tracing::debug!("rolling back `{}`", name);
            if let Err(err) = orchestrator.rollback(&name, None) {
                tracing::warn!("failed to roll back `{}`: {:#}", name, err);
            }
        }
    }

    fn declared_mut(&mut self, name: &str) -> Result<&mut ProjectDescriptor, EvalError> {
        let err = self.unknown_project(name);
        self.declared.get_mut(name).ok_or(err)
    }

    fn unknown_project(&self, name: &str) -> EvalError {
        EvalError::UnknownProject {
            project: name.to_string(),
            declared: self.declared.keys().map(|n| n.to_string()).collect(),
        }
    }
}

/// Pass a validated descriptor to the orchestrator, stopping at the first
/// failing call.
fn hand_off<O>(orchestrator: &mut O, descriptor: &ProjectDescriptor) -> anyhow::Result<()>
where
    O: Orchestrator + ?Sized,
{
    let name = descriptor.name();
    orchestrator.register_project(descriptor)?;
    orchestrator.install_native_dependencies(name, descriptor.deps_config(), Stage::Deps)?;
    orchestrator.install_native_dependencies(name, descriptor.build_config(), Stage::Build)?;
    orchestrator.register_crate(&CrateRegistration::new(name.clone()), descriptor)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::native_deps::{DependencyRole, NativeDependencySpec};
    use crate::core::orchestrator::{FailingOrchestrator, RecordingOrchestrator};
    use tempfile::TempDir;

    fn name(s: &str) -> PackageName {
        PackageName::new(s).unwrap()
    }

    fn native_deps() -> DependencySet {
        DependencySet::new()
            .with(NativeDependencySpec::new(DependencyRole::BuildAndLink, ["openssl"]).unwrap())
            .with(NativeDependencySpec::new(DependencyRole::BuildTimeOnly, ["pkg-config"]).unwrap())
    }

    fn linux_host() -> RecordingOrchestrator {
        RecordingOrchestrator::new().with_host(PlatformTarget::X86_64LinuxGnu)
    }

    #[test]
    fn test_declare_then_register_round_trips_configs() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());
        let build = DependencySet::declare(DependencyRole::BuildTimeOnly, ["protobuf"]).unwrap();

        eval.declare_project(
            &orch,
            ProjectDeclaration::new(name("core"), ".")
                .deps_config(native_deps())
                .build_config(build.clone()),
        )
        .unwrap();
        eval.register("core", &mut orch).unwrap();

        let registered = orch.project("core").unwrap();
        assert_eq!(registered.deps_config(), &native_deps());
        assert_eq!(registered.build_config(), &build);
        assert_eq!(registered.path(), tmp.path().join("."));
    }

    #[test]
    fn test_duplicate_project_rejected() {
        let tmp = TempDir::new().unwrap();
        let orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap();
        let err = eval
            .declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap_err();
        assert!(matches!(err, EvalError::DuplicateProject { ref project } if project == "core"));
    }

    #[test]
    fn test_duplicate_wins_over_invalid_path() {
        let tmp = TempDir::new().unwrap();
        let orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap();
        let err = eval
            .declare_project(&orch, ProjectDeclaration::new(name("core"), "missing"))
            .unwrap_err();
        assert!(matches!(err, EvalError::DuplicateProject { .. }));
    }

    #[test]
    fn test_invalid_path_registers_nothing() {
        let tmp = TempDir::new().unwrap();
        let orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        let err = eval
            .declare_project(&orch, ProjectDeclaration::new(name("core"), "does-not-exist"))
            .unwrap_err();

        assert!(matches!(err, EvalError::InvalidPath { ref path, .. } if path.ends_with("does-not-exist")));
        assert!(eval.project("core").is_none());
        assert_eq!(orch.projects().count(), 0);
    }

    #[test]
    fn test_path_to_file_is_invalid() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("Cargo.toml"), "").unwrap();
        let orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        let err = eval
            .declare_project(&orch, ProjectDeclaration::new(name("core"), "Cargo.toml"))
            .unwrap_err();
        assert!(matches!(err, EvalError::InvalidPath { .. }));
    }

    #[test]
    fn test_register_unknown_project() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        let err = eval.register("ghost", &mut orch).unwrap_err();
        assert!(matches!(err, EvalError::UnknownProject { ref project, .. } if project == "ghost"));
        assert!(orch.crates().is_empty());
    }

    #[test]
    fn test_add_target_last_write_wins() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap();
        eval.add_target("core", PlatformTarget::Wasm32Unknown, ProfileSelector::all())
            .unwrap();
        eval.add_target(
            "core",
            PlatformTarget::Wasm32Unknown,
            ProfileSelector::from_names(["release"]).unwrap().unwrap(),
        )
        .unwrap();
        eval.register("core", &mut orch).unwrap();

        let targets = orch.project("core").unwrap().targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(
            targets.get(&PlatformTarget::Wasm32Unknown),
            ProfileSelector::from_names(["release"]).unwrap().as_ref()
        );
    }

    #[test]
    fn test_add_target_to_unknown_project() {
        let mut eval = Evaluation::new("/work");
        let err = eval
            .add_target("ghost", PlatformTarget::Wasm32Unknown, ProfileSelector::Default)
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownProject { .. }));
    }

    #[test]
    fn test_omitted_targets_mean_host_default() {
        let tmp = TempDir::new().unwrap();
        let mut orch = RecordingOrchestrator::new().with_host(PlatformTarget::Aarch64Darwin);
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap();
        eval.register("core", &mut orch).unwrap();

        let mut expected = crate::core::target_matrix::TargetMatrix::new();
        expected.insert(PlatformTarget::Aarch64Darwin, ProfileSelector::Default);
        assert_eq!(orch.project("core").unwrap().targets(), &expected);
    }

    #[test]
    fn test_freenet_core_scenario() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(
            &orch,
            ProjectDeclaration::new(name("freenet-core"), tmp.path()).deps_config(native_deps()),
        )
        .unwrap();
        eval.add_target(
            "freenet-core",
            "linux-x86_64".parse().unwrap(),
            ProfileSelector::Default,
        )
        .unwrap();
        eval.add_target(
            "freenet-core",
            "wasm-generic".parse().unwrap(),
            ProfileSelector::all(),
        )
        .unwrap();

        let outcome = eval.register("freenet-core", &mut orch).unwrap();
        assert_eq!(outcome, RegistrationOutcome::Registered);

        let descriptor = orch.project("freenet-core").unwrap();
        assert_eq!(descriptor.targets().len(), 2);
        assert_eq!(descriptor.deps_config(), descriptor.build_config());
        assert_eq!(orch.crates().len(), 1);

        let stages: Vec<Stage> = orch.installations().iter().map(|i| i.stage).collect();
        assert_eq!(stages, [Stage::Deps, Stage::Build]);
    }

    #[test]
    fn test_register_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap();
        assert_eq!(
            eval.register("core", &mut orch).unwrap(),
            RegistrationOutcome::Registered
        );
        assert_eq!(
            eval.register("core", &mut orch).unwrap(),
            RegistrationOutcome::Unchanged
        );
        assert_eq!(orch.installations().len(), 2);
    }

    #[test]
    fn test_register_changed_descriptor_replaces() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap();
        eval.register("core", &mut orch).unwrap();

        eval.override_build_config("core", native_deps()).unwrap();
        assert_eq!(
            eval.register("core", &mut orch).unwrap(),
            RegistrationOutcome::Replaced
        );
        assert_eq!(orch.project("core").unwrap().build_config(), &native_deps());
        assert!(orch.project("core").unwrap().deps_config().is_empty());
        assert_eq!(orch.crates().len(), 1);
    }

    #[test]
    fn test_rejected_hand_off_is_rolled_back() {
        let tmp = TempDir::new().unwrap();
        let mut orch = FailingOrchestrator::new("core", Stage::Build);
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(
            &orch,
            ProjectDeclaration::new(name("core"), ".").deps_config(native_deps()),
        )
        .unwrap();
        let err = eval.register("core", &mut orch).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Orchestrator { ref project, ref message }
                if project == "core" && message.contains("build")
        ));

        assert!(eval.registered("core").is_none());
        assert_eq!(eval.unregistered().count(), 1);
        let inner = orch.inner();
        assert!(inner.project("core").is_none());
        assert!(inner.installations().is_empty());
        assert!(inner.crates().is_empty());
    }

    #[test]
    fn test_rejected_replacement_restores_previous() {
        let tmp = TempDir::new().unwrap();
        let mut orch = FailingOrchestrator::new("core", Stage::Build);
        orch.succeed();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap();
        eval.register("core", &mut orch).unwrap();
        let previous = eval.registered("core").unwrap().clone();

        eval.override_build_config("core", native_deps()).unwrap();
        orch.fail_on("core", Stage::Build);
        assert!(eval.register("core", &mut orch).is_err());

        assert_eq!(eval.registered("core"), Some(&previous));
        let inner = orch.inner();
        assert_eq!(inner.project("core"), Some(&previous));
        assert_eq!(inner.installations().len(), 2);
        assert!(inner.installations().iter().all(|i| i.deps.is_empty()));
        assert_eq!(inner.crates().len(), 1);

        orch.succeed();
        assert_eq!(
            eval.register("core", &mut orch).unwrap(),
            RegistrationOutcome::Replaced
        );
        assert_eq!(orch.inner().project("core").unwrap().build_config(), &native_deps());
    }

    #[test]
    fn test_deps_config_overridable_alone() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());
        let vendored = DependencySet::declare(DependencyRole::BuildTimeOnly, ["cmake"]).unwrap();

        eval.declare_project(
            &orch,
            ProjectDeclaration::new(name("core"), ".").deps_config(native_deps()),
        )
        .unwrap();
        eval.override_deps_config("core", vendored.clone()).unwrap();
        eval.register("core", &mut orch).unwrap();

        let registered = orch.project("core").unwrap();
        assert_eq!(registered.deps_config(), &vendored);
        assert_eq!(registered.build_config(), &native_deps());
    }

    #[test]
    fn test_unsupported_profile_selector_blocks_registration() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("core"), "."))
            .unwrap();
        eval.add_target(
            "core",
            PlatformTarget::X86_64LinuxGnu,
            ProfileSelector::from_names(["release"]).unwrap().unwrap(),
        )
        .unwrap();

        let err = eval.register("core", &mut orch).unwrap_err();
        assert!(matches!(
            err,
            EvalError::UnsupportedProfileSelector { ref platform, .. }
                if platform == "x86_64-unknown-linux-gnu"
        ));
        assert_eq!(orch.projects().count(), 0);
        assert!(orch.installations().is_empty());
    }

    #[test]
    fn test_unregistered_projects() {
        let tmp = TempDir::new().unwrap();
        let mut orch = linux_host();
        let mut eval = Evaluation::new(tmp.path());

        eval.declare_project(&orch, ProjectDeclaration::new(name("a"), "."))
            .unwrap();
        eval.declare_project(&orch, ProjectDeclaration::new(name("b"), "."))
            .unwrap();
        eval.register("a", &mut orch).unwrap();

        let pending: Vec<&str> = eval.unregistered().map(|n| n.as_str()).collect();
        assert_eq!(pending, ["b"]);
    }
}
