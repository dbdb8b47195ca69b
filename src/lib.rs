//! Dockyard - typed project and crate declarations for build orchestrators
//!
//! This crate models the declarative side of incorporating a source package
//! into a larger build: where the package lives, which native libraries and
//! tools its build stages need, and which platforms and profiles it is built
//! for. Declarations compose into a [`ProjectDescriptor`] that is handed to an
//! [`Orchestrator`] when the package is registered as a crate.

pub mod core;
pub mod ops;
pub mod util;

pub use core::{
    errors::EvalError, manifest::Manifest, native_deps::DependencySet,
    orchestrator::Orchestrator, platform::PlatformTarget, profile::ProfileSelector,
    project::ProjectDescriptor,
};

pub use ops::evaluate::Evaluation;
pub use util::context::GlobalContext;
