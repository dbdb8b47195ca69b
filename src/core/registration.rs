//! Crate registration markers.

use serde::Serialize;

use crate::core::project::PackageName;

/// Marks a declared project for registration with the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrateRegistration {
    pub name: PackageName,
}

impl CrateRegistration {
    pub fn new(name: PackageName) -> Self {
        CrateRegistration { name }
    }
}

/// What a call to register did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// First registration of this name
    Registered,
    /// The descriptor changed since the last registration and replaced it
    Replaced,
    /// Same descriptor as the last registration; nothing was handed over
    Unchanged,
}
