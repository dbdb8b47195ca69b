//! Build profile selection per platform.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::core::errors::EvalError;

/// Sentinel standing for every profile the orchestrator knows for a platform.
///
/// It is never expanded here.
pub const ALL_PROFILES: &str = "*";

/// A named build profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Profile {
    /// All profiles known to the orchestrator for the platform
    All,
    /// A single named profile
    Named(String),
}

impl Profile {
    /// Parse a profile name. `"*"` is the all-profiles sentinel; blank names
    /// are rejected.
    pub fn new(name: impl Into<String>) -> Result<Self, EvalError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(EvalError::EmptyName { field: "profile" });
        }
        Ok(if name == ALL_PROFILES {
            Profile::All
        } else {
            Profile::Named(name.to_string())
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Profile::All => ALL_PROFILES,
            Profile::Named(name) => name,
        }
    }
}

/// Which outputs to produce for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSelector {
    /// Exactly one output using the default profile (`true`)
    Default,
    /// One independent output per listed profile
    Profiles(Vec<Profile>),
}

impl ProfileSelector {
    /// Selector from a boolean flag. `false` selects nothing.
    pub fn from_flag(enabled: bool) -> Option<Self> {
        enabled.then_some(ProfileSelector::Default)
    }

    /// Selector from profile names, de-duplicated in first-seen order.
    ///
    /// Returns `None` for an empty list, which selects nothing.
    pub fn from_names<I, S>(names: I) -> Result<Option<Self>, EvalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut profiles: Vec<Profile> = Vec::new();
        for name in names {
            let profile = Profile::new(name)?;
            if !profiles.contains(&profile) {
                profiles.push(profile);
            }
        }
        Ok((!profiles.is_empty()).then_some(ProfileSelector::Profiles(profiles)))
    }

    /// The "every known profile" selector.
    pub fn all() -> Self {
        ProfileSelector::Profiles(vec![Profile::All])
    }

    pub fn is_default_only(&self) -> bool {
        matches!(self, ProfileSelector::Default)
    }

    /// A profile list with no entries selects nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, ProfileSelector::Profiles(p) if p.is_empty())
    }

    pub fn profiles(&self) -> &[Profile] {
        match self {
            ProfileSelector::Default => &[],
            ProfileSelector::Profiles(profiles) => profiles,
        }
    }
}

impl fmt::Display for ProfileSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileSelector::Default => f.write_str("true"),
            ProfileSelector::Profiles(profiles) => {
                let names: Vec<&str> = profiles.iter().map(Profile::as_str).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}

impl Serialize for ProfileSelector {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ProfileSelector::Default => serializer.serialize_bool(true),
            ProfileSelector::Profiles(profiles) => {
                serializer.collect_seq(profiles.iter().map(Profile::as_str))
            }
        }
    }
}
