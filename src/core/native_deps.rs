//! Native dependency declarations.
//!
//! Native dependencies are libraries and tools that the build graph does not
//! produce itself (a system TLS library, `pkg-config`, ...). They are grouped
//! by role: needed only while building, or needed to build and link.
//! Identifiers are opaque here; acquiring them is the orchestrator's job.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::errors::EvalError;

/// When a native dependency is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DependencyRole {
    /// Needed while building only (code generators, `pkg-config`)
    #[serde(rename = "build")]
    BuildTimeOnly,

    /// Needed to build and to link/run (system libraries)
    #[serde(rename = "link")]
    BuildAndLink,
}

impl DependencyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyRole::BuildTimeOnly => "build",
            DependencyRole::BuildAndLink => "link",
        }
    }
}

impl fmt::Display for DependencyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A list of native packages sharing one role.
///
/// Packages have set semantics: duplicates collapse and two specs with the
/// same members compare equal regardless of order.
#[derive(Debug, Clone, Eq)]
pub struct NativeDependencySpec {
    role: DependencyRole,
    packages: Vec<String>,
}

impl NativeDependencySpec {
    /// Create a spec, rejecting empty package identifiers.
    pub fn new<I, S>(role: DependencyRole, packages: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = NativeDependencySpec {
            role,
            packages: Vec::new(),
        };
        for package in packages {
            spec.insert(package.into())?;
        }
        Ok(spec)
    }

    fn insert(&mut self, package: String) -> Result<(), EvalError> {
        let package = package.trim();
        if package.is_empty() {
            return Err(EvalError::EmptyDependency {
                role: self.role.to_string(),
            });
        }
        if !self.contains(package) {
            self.packages.push(package.to_string());
        }
        Ok(())
    }

    pub fn role(&self) -> DependencyRole {
        self.role
    }

    /// Packages in first-seen order.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn contains(&self, package: &str) -> bool {
        self.packages.iter().any(|p| p == package)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Union `other` into this spec. Both must share a role.
    fn union(&mut self, other: &NativeDependencySpec) {
        debug_assert_eq!(self.role, other.role);
        for package in &other.packages {
            if !self.contains(package) {
                self.packages.push(package.clone());
            }
        }
    }
}

impl PartialEq for NativeDependencySpec {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
            && self.packages.len() == other.packages.len()
            && self.packages.iter().all(|p| other.contains(p))
    }
}

/// Native dependencies keyed by role.
///
/// This is what a project attaches to its dependency stage and its own
/// build stage. Adding a spec whose role is already present unions the
/// packages rather than replacing them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    specs: BTreeMap<DependencyRole, NativeDependencySpec>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set holding a single role.
    pub fn declare<I, S>(role: DependencyRole, packages: I) -> Result<Self, EvalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::new().with(NativeDependencySpec::new(role, packages)?))
    }

    /// Add a spec, unioning with any existing spec of the same role.
    pub fn with(mut self, spec: NativeDependencySpec) -> Self {
        self.add(spec);
        self
    }

    pub fn add(&mut self, spec: NativeDependencySpec) {
        if spec.is_empty() {
            return;
        }
        match self.specs.get_mut(&spec.role) {
            Some(existing) => existing.union(&spec),
            None => {
                self.specs.insert(spec.role, spec);
            }
        }
    }

    /// Union every role of `other` into this set.
    pub fn merge(&mut self, other: &DependencySet) {
        for spec in other.specs.values() {
            self.add(spec.clone());
        }
    }

    pub fn get(&self, role: DependencyRole) -> Option<&NativeDependencySpec> {
        self.specs.get(&role)
    }

    /// Packages declared for `role`, empty when the role is absent.
    pub fn packages(&self, role: DependencyRole) -> &[String] {
        self.get(role).map(|s| s.packages()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Serialize for DependencySet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.specs.len()))?;
        for (role, spec) in &self.specs {
            map.serialize_entry(role, spec.packages())?;
        }
        map.end()
    }
}
