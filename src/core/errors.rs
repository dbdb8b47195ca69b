//! Evaluation error types and diagnostics.
//!
//! Every error is fatal to the evaluation that raised it. Nothing is
//! registered with the orchestrator once one of these has been returned.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised while composing or registering build descriptors.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum EvalError {
    #[error("path `{}` for project `{project}` is not an existing directory", path.display())]
    #[diagnostic(code(dockyard::eval::invalid_path))]
    InvalidPath { project: String, path: PathBuf },

    #[error("project `{project}` is declared more than once")]
    #[diagnostic(code(dockyard::eval::duplicate_project))]
    DuplicateProject { project: String },

    #[error("no project named `{project}` has been declared")]
    #[diagnostic(code(dockyard::eval::unknown_project))]
    UnknownProject {
        project: String,
        declared: Vec<String>,
    },

    #[error("platform `{platform}` of project `{project}` does not support profile selector `{selector}`")]
    #[diagnostic(
        code(dockyard::eval::unsupported_profile_selector),
        help("only `true` is accepted for platforms without build profiles")
    )]
    UnsupportedProfileSelector {
        project: String,
        platform: String,
        selector: String,
    },

    #[error("`{field}` must not be empty")]
    #[diagnostic(code(dockyard::eval::empty_name))]
    EmptyName { field: &'static str },

    #[error("empty package identifier in `{role}` dependencies")]
    #[diagnostic(code(dockyard::eval::empty_dependency))]
    EmptyDependency { role: String },

    #[error("unknown platform `{platform}`")]
    #[diagnostic(code(dockyard::eval::unknown_platform))]
    UnknownPlatform {
        platform: String,
        known: Vec<String>,
    },

    #[error("platform `{id}` is already defined as `{existing}`")]
    #[diagnostic(code(dockyard::eval::platform_conflict))]
    PlatformConflict { id: String, existing: String },

    #[error("`{field}` of project `{project}` refers to undefined dependency set `{set}`")]
    #[diagnostic(code(dockyard::eval::unknown_dependency_set))]
    UnknownDependencySet {
        project: String,
        field: &'static str,
        set: String,
    },

    #[error("could not find Dockyard.toml in `{}` or any parent directory", dir.display())]
    #[diagnostic(code(dockyard::manifest::not_found))]
    ManifestNotFound { dir: PathBuf },

    #[error("manifest `{}` does not exist", path.display())]
    #[diagnostic(code(dockyard::manifest::missing))]
    ManifestMissing { path: PathBuf },

    #[error("failed to read `{}`: {message}", path.display())]
    #[diagnostic(code(dockyard::manifest::read))]
    ManifestRead { path: PathBuf, message: String },

    #[error("both `{}` and `{}` exist", primary.display(), alias.display())]
    #[diagnostic(code(dockyard::manifest::ambiguous))]
    AmbiguousManifest { primary: PathBuf, alias: PathBuf },

    #[error("failed to parse `{}`: {message}", path.display())]
    #[diagnostic(code(dockyard::manifest::parse))]
    Parse { path: PathBuf, message: String },

    #[error("orchestrator rejected project `{project}`: {message}")]
    #[diagnostic(code(dockyard::eval::orchestrator))]
    Orchestrator { project: String, message: String },
}

impl EvalError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EvalError::InvalidPath { project, path } => Diagnostic::error(format!(
                "invalid path for project `{}`",
                project
            ))
            .with_context(format!("`{}` is not an existing directory", path.display()))
            .with_suggestion("Relative paths are resolved against the directory of Dockyard.toml"),

            EvalError::DuplicateProject { project } => {
                Diagnostic::error(format!("project `{}` is declared more than once", project))
                    .with_suggestion("Rename one of the projects or merge the declarations")
            }

            EvalError::UnknownProject { project, declared } => {
                let mut diag = Diagnostic::error(format!(
                    "cannot register `{}`: no such project",
                    project
                ));
                if !declared.is_empty() {
                    diag = diag.with_context(format!("declared projects: {}", declared.join(", ")));
                }
                diag.with_suggestion(suggestions::DECLARE_PROJECT)
            }

            EvalError::UnsupportedProfileSelector {
                project,
                platform,
                selector,
            } => Diagnostic::error(format!(
                "unsupported profile selector for `{}` on `{}`",
                project, platform
            ))
            .with_context(format!("`{}` cannot build profiles, got `{}`", platform, selector))
            .with_suggestion(format!("Use `{} = true` to build the default output", platform)),

            EvalError::EmptyName { field } => {
                Diagnostic::error(format!("`{}` must not be empty", field))
            }

            EvalError::EmptyDependency { role } => Diagnostic::error(format!(
                "empty package identifier in `{}` dependencies",
                role
            ))
            .with_suggestion("Remove the empty entry"),

            EvalError::UnknownPlatform { platform, known } => {
                let mut diag = Diagnostic::error(format!("unknown platform `{}`", platform));
                if !known.is_empty() {
                    diag = diag.with_context(format!("known platforms: {}", known.join(", ")));
                }
                diag.with_suggestion(suggestions::CUSTOM_PLATFORM)
            }

            EvalError::PlatformConflict { id, existing } => Diagnostic::error(format!(
                "platform `{}` is already defined",
                id
            ))
            .with_context(format!("`{}` names `{}`", id, existing))
            .with_suggestion("Target built-in platforms by their triple or alias instead of redeclaring them")
            .with_suggestion("Give each `[platforms.*]` entry a distinct name and triple"),

            EvalError::UnknownDependencySet {
                project,
                field,
                set,
            } => Diagnostic::error(format!(
                "undefined dependency set `{}` in project `{}`",
                set, project
            ))
            .with_context(format!("referenced by `{}`", field))
            .with_suggestion(format!("Add a `[dependency-sets.{}]` table", set)),

            EvalError::ManifestNotFound { dir } => Diagnostic::error(format!(
                "could not find Dockyard.toml in {} or any parent directory",
                dir.display()
            ))
            .with_suggestion(suggestions::NO_MANIFEST),

            EvalError::ManifestMissing { path } => {
                Diagnostic::error(format!("manifest {} does not exist", path.display()))
                    .with_suggestion("Check the `--manifest` argument or `DOCKYARD_MANIFEST`")
            }

            EvalError::ManifestRead { path, message } => {
                Diagnostic::error(format!("failed to read {}", path.display()))
                    .with_context(message.clone())
                    .with_location(path.clone())
            }

            EvalError::AmbiguousManifest { primary, alias } => {
                Diagnostic::error("ambiguous manifest")
                    .with_context(format!("found both {} and {}", primary.display(), alias.display()))
                    .with_suggestion("Remove one of the two files")
            }

            EvalError::Parse { path, message } => Diagnostic::error(format!(
                "failed to parse {}",
                path.display()
            ))
            .with_context(message.clone())
            .with_location(path.clone()),

            EvalError::Orchestrator { project, message } => Diagnostic::error(format!(
                "orchestrator rejected project `{}`",
                project
            ))
            .with_context(message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_project_diagnostic() {
        let err = EvalError::UnknownProject {
            project: "freenet-cor".to_string(),
            declared: vec!["freenet-core".to_string()],
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("cannot register `freenet-cor`"));
        assert!(output.contains("declared projects: freenet-core"));
        assert!(output.contains("help: consider:"));
    }

    #[test]
    fn test_unsupported_profile_selector_diagnostic() {
        let err = EvalError::UnsupportedProfileSelector {
            project: "freenet-core".to_string(),
            platform: "x86_64-unknown-linux-gnu".to_string(),
            selector: "[release]".to_string(),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("x86_64-unknown-linux-gnu"));
        assert!(output.contains("[release]"));
        assert!(output.contains("x86_64-unknown-linux-gnu = true"));
    }

    #[test]
    fn test_platform_conflict_diagnostic() {
        let err = EvalError::PlatformConflict {
            id: "linux-x86_64".to_string(),
            existing: "x86_64-unknown-linux-gnu".to_string(),
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("platform `linux-x86_64` is already defined"));
        assert!(output.contains("x86_64-unknown-linux-gnu"));
    }

    #[test]
    fn test_diagnostic_codes() {
        let err = EvalError::DuplicateProject {
            project: "a".to_string(),
        };
        let code = MietteDiagnostic::code(&err).map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("dockyard::eval::duplicate_project"));
    }
}
