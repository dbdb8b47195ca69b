//! Dockyard.toml parsing and schema.
//!
//! The manifest is the declarative source of an evaluation. Named dependency
//! sets are declared once and folded into any number of projects; each
//! project carries its own target matrix; `[[crate]]` entries register
//! projects with the orchestrator.
//!
//! ```toml
//! [dependency-sets.native]
//! build = ["pkg-config"]
//! link = ["openssl"]
//!
//! [[project]]
//! name = "freenet-core"
//! path = "."
//! deps = "native"
//!
//! [project.targets]
//! linux-x86_64 = true
//! wasm-generic = ["*"]
//!
//! [[crate]]
//! name = "freenet-core"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::errors::EvalError;
use crate::core::native_deps::{DependencyRole, DependencySet, NativeDependencySpec};
use crate::core::orchestrator::Orchestrator;
use crate::core::platform::{CustomPlatform, PlatformTarget};
use crate::core::profile::ProfileSelector;
use crate::core::project::{PackageName, ProjectDeclaration};
use crate::core::registration::CrateRegistration;
use crate::core::target_matrix::TargetMatrix;
use crate::ops::evaluate::Evaluation;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Dockyard.toml";

/// Lowercase alias for the manifest file name.
pub const MANIFEST_ALIAS: &str = "dockyard.toml";

/// Find the manifest in `dir`.
///
/// Having both the canonical name and the alias in one directory is an error.
pub fn find_manifest(dir: &Path) -> Result<PathBuf, EvalError> {
    let primary = dir.join(MANIFEST_NAME);
    let alias = dir.join(MANIFEST_ALIAS);

    // Case-insensitive filesystems report both names for a single file.
    let both = primary.is_file()
        && alias.is_file()
        && std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        let name = e.file_name();
                        name == MANIFEST_NAME || name == MANIFEST_ALIAS
                    })
                    .count()
                    == 2
            })
            .unwrap_or(false);

    if both {
        Err(EvalError::AmbiguousManifest { primary, alias })
    } else if primary.is_file() {
        Ok(primary)
    } else if alias.is_file() {
        Ok(alias)
    } else {
        Err(EvalError::ManifestNotFound {
            dir: dir.to_path_buf(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawManifest {
    #[serde(default)]
    dependency_sets: BTreeMap<String, RawDependencySet>,
    #[serde(default)]
    platforms: BTreeMap<String, RawPlatform>,
    #[serde(default, rename = "project")]
    projects: Vec<RawProject>,
    #[serde(default, rename = "crate")]
    crates: Vec<RawCrate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDependencySet {
    #[serde(default)]
    build: Vec<String>,
    #[serde(default)]
    link: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDependencyRef {
    Named(String),
    Inline(RawDependencySet),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPlatform {
    triple: String,
    #[serde(default)]
    profiles: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSelector {
    Flag(bool),
    Profiles(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    name: String,
    path: PathBuf,
    #[serde(default)]
    deps: Option<RawDependencyRef>,
    #[serde(default)]
    build: Option<RawDependencyRef>,
    #[serde(default)]
    targets: BTreeMap<String, RawSelector>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCrate {
    name: String,
}

/// A parsed and validated manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Named dependency sets
    pub dependency_sets: BTreeMap<String, DependencySet>,

    /// Platforms declared outside the known set
    pub platforms: Vec<CustomPlatform>,

    /// Project declarations in file order
    pub projects: Vec<ProjectDeclaration>,

    /// Crate registrations in file order
    pub crates: Vec<CrateRegistration>,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

impl Manifest {
    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EvalError::ManifestMissing {
                path: path.to_path_buf(),
            },
            _ => EvalError::ManifestRead {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::parse(&contents, path, dir)
    }

    /// Parse manifest text. `path` is only used in error messages.
    pub fn parse(contents: &str, path: &Path, manifest_dir: &Path) -> Result<Self, EvalError> {
        let raw: RawManifest = toml::from_str(contents).map_err(|e| EvalError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        let mut dependency_sets = BTreeMap::new();
        for (name, set) in raw.dependency_sets {
            dependency_sets.insert(name, set.into_dependency_set()?);
        }

        let mut platforms: Vec<CustomPlatform> = Vec::new();
        for (alias, platform) in raw.platforms {
            let platform = CustomPlatform::new(platform.triple, platform.profiles)?.with_alias(alias);
            platform.check_conflicts(&platforms)?;
            platforms.push(platform);
        }

        let mut projects = Vec::new();
        for project in raw.projects {
            projects.push(project.into_declaration(&dependency_sets, &platforms)?);
        }

        let crates = raw
            .crates
            .into_iter()
            .map(|c| PackageName::new(c.name).map(CrateRegistration::new))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "parsed {}: {} project(s), {} crate(s)",
            path.display(),
            projects.len(),
            crates.len()
        );

        Ok(Manifest {
            dependency_sets,
            platforms,
            projects,
            crates,
            manifest_dir: manifest_dir.to_path_buf(),
        })
    }

    /// Run a full evaluation against `orchestrator`.
    ///
    /// All projects are declared and every crate is validated before the
    /// first registration reaches the orchestrator. If the orchestrator
    /// rejects a crate, the crates handed over before it are rolled back.
    pub fn evaluate<O>(&self, orchestrator: &mut O) -> Result<Evaluation, EvalError>
    where
        O: Orchestrator + ?Sized,
    {
        let mut eval = Evaluation::new(&self.manifest_dir);

        for declaration in &self.projects {
            eval.declare_project(orchestrator, declaration.clone())?;
        }

        for registration in &self.crates {
            eval.prepare(&registration.name, orchestrator)?;
        }

        for registration in &self.crates {
            if let Err(err) = eval.register(&registration.name, orchestrator) {
                eval.roll_back(orchestrator);
                return Err(err);
            }
        }

        Ok(eval)
    }
}

impl RawDependencySet {
    fn into_dependency_set(self) -> Result<DependencySet, EvalError> {
        Ok(DependencySet::new()
            .with(NativeDependencySpec::new(DependencyRole::BuildTimeOnly, self.build)?)
            .with(NativeDependencySpec::new(DependencyRole::BuildAndLink, self.link)?))
    }
}

impl RawProject {
    fn into_declaration(
        self,
        sets: &BTreeMap<String, DependencySet>,
        platforms: &[CustomPlatform],
    ) -> Result<ProjectDeclaration, EvalError> {
        let name = PackageName::new(self.name)?;

        let resolve = |field: &'static str, r: RawDependencyRef| match r {
            RawDependencyRef::Named(set) => {
                sets.get(&set)
                    .cloned()
                    .ok_or_else(|| EvalError::UnknownDependencySet {
                        project: name.to_string(),
                        field,
                        set,
                    })
            }
            RawDependencyRef::Inline(raw) => raw.into_dependency_set(),
        };

        let deps = self.deps.map(|r| resolve("deps", r)).transpose()?;
        let build = self.build.map(|r| resolve("build", r)).transpose()?;

        let mut targets = TargetMatrix::new();
        for (id, raw) in self.targets {
            let platform = PlatformTarget::parse(&id, platforms)?;
            let selector = match raw {
                RawSelector::Flag(flag) => ProfileSelector::from_flag(flag),
                RawSelector::Profiles(names) => ProfileSelector::from_names(names)?,
            };
            if let Some(selector) = selector {
                targets.insert(platform, selector);
            }
        }

        let mut declaration = ProjectDeclaration::new(name, self.path)
            .deps_config(deps.unwrap_or_default())
            .targets(targets);
        if let Some(build) = build {
            declaration = declaration.build_config(build);
        }
        Ok(declaration)
    }
}
