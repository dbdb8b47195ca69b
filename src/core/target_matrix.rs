//! Target matrix: platform to profile selection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::platform::PlatformTarget;
use crate::core::profile::ProfileSelector;

/// The platforms a project is built for.
///
/// Entries are keyed by platform and replaced, never merged, when the same
/// platform is set twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TargetMatrix {
    entries: BTreeMap<PlatformTarget, ProfileSelector>,
}

impl TargetMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selector for `platform`, replacing any previous one.
    ///
    /// An empty profile list selects nothing and leaves the matrix untouched.
    /// Returns whether the matrix changed shape (insert or replace).
    pub fn insert(&mut self, platform: PlatformTarget, selector: ProfileSelector) -> bool {
        if selector.is_empty() {
            tracing::debug!("ignoring empty profile list for {}", platform);
            return false;
        }
        if let Some(previous) = self.entries.insert(platform.clone(), selector) {
            tracing::debug!("replaced selector {} for {}", previous, platform);
        }
        true
    }

    pub fn get(&self, platform: &PlatformTarget) -> Option<&ProfileSelector> {
        self.entries.get(platform)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PlatformTarget, &ProfileSelector)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The matrix actually built: an empty matrix means the host platform
    /// with its default profile.
    pub fn effective(&self, host: &PlatformTarget) -> TargetMatrix {
        if !self.is_empty() {
            return self.clone();
        }
        let mut matrix = TargetMatrix::new();
        matrix.insert(host.clone(), ProfileSelector::Default);
        matrix
    }

    /// Entries whose selector the platform cannot express.
    pub fn unsupported(&self) -> impl Iterator<Item = (&PlatformTarget, &ProfileSelector)> {
        self.entries
            .iter()
            .filter(|(platform, selector)| !platform.supports_profiles() && !selector.is_default_only())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut matrix = TargetMatrix::new();
        matrix.insert(
            PlatformTarget::Wasm32Unknown,
            ProfileSelector::from_names(["dev"]).unwrap().unwrap(),
        );
        matrix.insert(
            PlatformTarget::Wasm32Unknown,
            ProfileSelector::from_names(["release"]).unwrap().unwrap(),
        );

        assert_eq!(matrix.len(), 1);
        assert_eq!(
            matrix.get(&PlatformTarget::Wasm32Unknown),
            ProfileSelector::from_names(["release"]).unwrap().as_ref()
        );
    }

    #[test]
    fn test_empty_profile_list_is_noop() {
        let mut matrix = TargetMatrix::new();
        matrix.insert(PlatformTarget::Wasm32Unknown, ProfileSelector::Default);

        assert!(!matrix.insert(PlatformTarget::Wasm32Unknown, ProfileSelector::Profiles(vec![])));
        assert_eq!(
            matrix.get(&PlatformTarget::Wasm32Unknown),
            Some(&ProfileSelector::Default)
        );
    }

    #[test]
    fn test_empty_matrix_defaults_to_host() {
        let host = PlatformTarget::Aarch64Darwin;
        let effective = TargetMatrix::new().effective(&host);

        assert_eq!(effective.len(), 1);
        assert_eq!(effective.get(&host), Some(&ProfileSelector::Default));
    }

    #[test]
    fn test_declared_matrix_is_kept() {
        let mut matrix = TargetMatrix::new();
        matrix.insert(PlatformTarget::Wasm32Unknown, ProfileSelector::all());

        let effective = matrix.effective(&PlatformTarget::X86_64LinuxGnu);
        assert_eq!(effective, matrix);
    }

    #[test]
    fn test_unsupported_selectors() {
        let mut matrix = TargetMatrix::new();
        matrix.insert(
            PlatformTarget::X86_64LinuxGnu,
            ProfileSelector::from_names(["release"]).unwrap().unwrap(),
        );
        matrix.insert(PlatformTarget::X86_64Darwin, ProfileSelector::Default);
        matrix.insert(PlatformTarget::Wasm32Unknown, ProfileSelector::all());

        let unsupported: Vec<_> = matrix.unsupported().map(|(p, _)| p.clone()).collect();
        assert_eq!(unsupported, [PlatformTarget::X86_64LinuxGnu]);
    }
}
