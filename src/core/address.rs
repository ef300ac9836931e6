//! Identity of a loadable resource.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Package name plus location of a resource.
///
/// Two addresses with identical fields are interchangeable everywhere: as map
/// keys, in the tracker sets and in error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetAddress {
    package_name: String,
    location: String,
}

impl AssetAddress {
    /// Create an address from a package name and a location.
    pub fn new(package_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            location: location.into(),
        }
    }

    /// The empty address. Never valid.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            package_name: String::new(),
            location: String::new(),
        }
    }

    /// Package the resource lives in.
    #[must_use]
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// Location of the resource inside its package.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// True iff both package name and location are non-empty.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.package_name.is_empty() && !self.location.is_empty()
    }

    /// True iff both fields are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.package_name.is_empty() && self.location.is_empty()
    }
}

impl fmt::Display for AssetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package_name, self.location)
    }
}

impl<P, L> From<(P, L)> for AssetAddress
where
    P: Into<String>,
    L: Into<String>,
{
    fn from((package_name, location): (P, L)) -> Self {
        Self::new(package_name, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_validity() {
        assert!(AssetAddress::new("pkg", "level1").is_valid());
        assert!(!AssetAddress::new("", "level1").is_valid());
        assert!(!AssetAddress::new("pkg", "").is_valid());
        assert!(!AssetAddress::empty().is_valid());
        assert!(AssetAddress::default().is_empty());
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let a = AssetAddress::new("pkg", "level1");
        let b: AssetAddress = ("pkg", "level1").into();
        assert_eq!(a, b);
        assert_ne!(a, AssetAddress::new("pkg", "level2"));
        assert_ne!(a, AssetAddress::new("other", "level1"));

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(AssetAddress::new("pkg", "scenes/level1").to_string(), "pkg/scenes/level1");
        assert_eq!(AssetAddress::empty().to_string(), "/");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&AssetAddress::new("pkg", "level1")).unwrap();
        assert_eq!(json, r#"{"package_name":"pkg","location":"level1"}"#);
    }
}
