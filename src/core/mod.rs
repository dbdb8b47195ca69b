//! Core data structures for Dockyard.
//!
//! - Native dependency sets and their roles
//! - Platforms, profile selectors and the target matrix
//! - Project declarations and descriptors
//! - The orchestrator interface descriptors are handed to
//! - The Dockyard.toml manifest

pub mod errors;
pub mod manifest;
pub mod native_deps;
pub mod orchestrator;
pub mod platform;
pub mod profile;
pub mod project;
pub mod registration;
pub mod target_matrix;

pub use errors::EvalError;
pub use manifest::{find_manifest, Manifest, MANIFEST_ALIAS, MANIFEST_NAME};
pub use native_deps::{DependencyRole, DependencySet, NativeDependencySpec};
pub use orchestrator::{Orchestrator, RecordingOrchestrator, Stage};
pub use platform::{CustomPlatform, PlatformTarget};
pub use profile::{Profile, ProfileSelector, ALL_PROFILES};
pub use project::{PackageName, ProjectDeclaration, ProjectDescriptor};
pub use registration::{CrateRegistration, RegistrationOutcome};
pub use target_matrix::TargetMatrix;
