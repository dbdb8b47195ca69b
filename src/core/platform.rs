//! Platform targets.
//!
//! The set of platforms a project can be built for is closed: every known
//! triple has a variant, and anything else must be declared explicitly as a
//! [`CustomPlatform`]. A typo in a platform name is therefore an error
//! instead of a silently ignored target.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::core::errors::EvalError;

/// A platform declared outside the known set.
///
/// Identity is the triple alone: two declarations of one triple are the
/// same platform whatever their alias or profile capability.
#[derive(Debug, Clone)]
pub struct CustomPlatform {
    triple: String,
    alias: Option<String>,
    profiles: bool,
}

impl CustomPlatform {
    /// Declare a platform by triple.
    ///
    /// `profiles` states whether the platform can build named profiles.
    pub fn new(triple: impl Into<String>, profiles: bool) -> Result<Self, EvalError> {
        let triple = triple.into();
        if triple.trim().is_empty() {
            return Err(EvalError::EmptyName {
                field: "platform.triple",
            });
        }
        Ok(CustomPlatform {
            triple,
            alias: None,
            profiles,
        })
    }

    /// Also accept `alias` when parsing platform identifiers.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn triple(&self) -> &str {
        &self.triple
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    fn matches(&self, id: &str) -> bool {
        self.triple == id || self.alias.as_deref() == Some(id)
    }

    /// Check that neither the triple nor the alias already names a platform,
    /// built-in or among `declared`.
    pub fn check_conflicts(&self, declared: &[CustomPlatform]) -> Result<(), EvalError> {
        for id in std::iter::once(self.triple.as_str()).chain(self.alias.as_deref()) {
            if let Ok(known) = id.parse::<PlatformTarget>() {
                return Err(EvalError::PlatformConflict {
                    id: id.to_string(),
                    existing: known.triple().to_string(),
                });
            }
            if let Some(other) = declared.iter().find(|p| p.matches(id)) {
                return Err(EvalError::PlatformConflict {
                    id: id.to_string(),
                    existing: other.triple.clone(),
                });
            }
        }
        Ok(())
    }
}

impl PartialEq for CustomPlatform {
    fn eq(&self, other: &Self) -> bool {
        self.triple == other.triple
    }
}

impl Eq for CustomPlatform {}

impl Hash for CustomPlatform {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple.hash(state);
    }
}

impl PartialOrd for CustomPlatform {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CustomPlatform {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple.cmp(&other.triple)
    }
}

/// A platform a project is built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlatformTarget {
    X86_64LinuxGnu,
    Aarch64LinuxGnu,
    X86_64LinuxMusl,
    X86_64Darwin,
    Aarch64Darwin,
    X86_64WindowsMsvc,
    Wasm32Unknown,
    Wasm32Wasip1,
    Custom(CustomPlatform),
}

/// Known platforms with their canonical triple and short alias.
const KNOWN: &[(PlatformTarget, &str, &str)] = &[
    (PlatformTarget::X86_64LinuxGnu, "x86_64-unknown-linux-gnu", "linux-x86_64"),
    (PlatformTarget::Aarch64LinuxGnu, "aarch64-unknown-linux-gnu", "linux-aarch64"),
    (PlatformTarget::X86_64LinuxMusl, "x86_64-unknown-linux-musl", "linux-musl"),
    (PlatformTarget::X86_64Darwin, "x86_64-apple-darwin", "macos-x86_64"),
    (PlatformTarget::Aarch64Darwin, "aarch64-apple-darwin", "macos-aarch64"),
    (PlatformTarget::X86_64WindowsMsvc, "x86_64-pc-windows-msvc", "windows-x86_64"),
    (PlatformTarget::Wasm32Unknown, "wasm32-unknown-unknown", "wasm-generic"),
    (PlatformTarget::Wasm32Wasip1, "wasm32-wasip1", "wasm-wasi"),
];

impl PlatformTarget {
    /// The platform of the machine running the evaluation.
    pub fn host() -> PlatformTarget {
        #[cfg(all(target_os = "linux", target_arch = "x86_64", target_env = "musl"))]
        {
            PlatformTarget::X86_64LinuxMusl
        }
        #[cfg(all(target_os = "linux", target_arch = "x86_64", not(target_env = "musl")))]
        {
            PlatformTarget::X86_64LinuxGnu
        }
        #[cfg(all(target_os = "linux", target_arch = "aarch64"))]
        {
            PlatformTarget::Aarch64LinuxGnu
        }
        #[cfg(all(target_os = "macos", target_arch = "x86_64"))]
        {
            PlatformTarget::X86_64Darwin
        }
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        {
            PlatformTarget::Aarch64Darwin
        }
        #[cfg(all(target_os = "windows", target_arch = "x86_64"))]
        {
            PlatformTarget::X86_64WindowsMsvc
        }
        #[cfg(not(any(
            all(target_os = "linux", target_arch = "x86_64"),
            all(target_os = "linux", target_arch = "aarch64"),
            all(target_os = "macos", target_arch = "x86_64"),
            all(target_os = "macos", target_arch = "aarch64"),
            all(target_os = "windows", target_arch = "x86_64"),
        )))]
        {
            PlatformTarget::Custom(CustomPlatform {
                triple: format!("{}-unknown-{}", std::env::consts::ARCH, std::env::consts::OS),
                alias: None,
                profiles: false,
            })
        }
    }

    /// Parse an identifier, consulting `custom` for platforms outside the
    /// known set. Custom declarations shadow nothing: a known triple always
    /// resolves to its built-in variant.
    pub fn parse(id: &str, custom: &[CustomPlatform]) -> Result<PlatformTarget, EvalError> {
        if let Ok(known) = id.parse() {
            return Ok(known);
        }
        custom
            .iter()
            .find(|p| p.matches(id))
            .map(|p| PlatformTarget::Custom(p.clone()))
            .ok_or_else(|| EvalError::UnknownPlatform {
                platform: id.to_string(),
                known: KNOWN
                    .iter()
                    .map(|(_, _, alias)| alias.to_string())
                    .chain(custom.iter().map(|p| p.triple.clone()))
                    .collect(),
            })
    }

    /// Canonical target triple.
    pub fn triple(&self) -> &str {
        match self {
            PlatformTarget::Custom(custom) => &custom.triple,
            known => KNOWN
                .iter()
                .find(|(p, _, _)| p == known)
                .map(|(_, triple, _)| *triple)
                .unwrap_or_default(),
        }
    }

    /// Short alias, if the platform has one.
    pub fn alias(&self) -> Option<&str> {
        match self {
            PlatformTarget::Custom(custom) => custom.alias(),
            known => KNOWN
                .iter()
                .find(|(p, _, _)| p == known)
                .map(|(_, _, alias)| *alias),
        }
    }

    /// Whether the platform can build more than one named profile.
    ///
    /// Native OS targets always produce the single default output.
    pub fn supports_profiles(&self) -> bool {
        match self {
            PlatformTarget::Wasm32Unknown | PlatformTarget::Wasm32Wasip1 => true,
            PlatformTarget::Custom(custom) => custom.profiles,
            _ => false,
        }
    }

    /// All built-in platforms.
    pub fn known() -> impl Iterator<Item = &'static PlatformTarget> {
        KNOWN.iter().map(|(p, _, _)| p)
    }
}

impl FromStr for PlatformTarget {
    type Err = EvalError;

    /// Parse a built-in platform by triple or alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KNOWN
            .iter()
            .find(|(_, triple, alias)| *triple == s || *alias == s)
            .map(|(p, _, _)| p.clone())
            .ok_or_else(|| EvalError::UnknownPlatform {
                platform: s.to_string(),
                known: KNOWN.iter().map(|(_, _, alias)| alias.to_string()).collect(),
            })
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.triple())
    }
}

impl Serialize for PlatformTarget {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.triple())
    }
}
