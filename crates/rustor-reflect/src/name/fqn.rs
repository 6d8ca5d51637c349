//! Fully qualified symbol names
//!
//! PHP class names are case-insensitive, so equality, ordering and hashing
//! compare the ASCII-lowercased form while the original spelling is kept
//! for display.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Namespace separator
pub const SEPARATOR: char = '\\';

/// A canonical, namespace-qualified identifier (without leading separator)
#[derive(Debug, Clone)]
pub struct FullyQualifiedName {
    name: String,
    /// Lowercased copy used for comparisons
    key: String,
}

impl FullyQualifiedName {
    /// Create from a name, stripping a leading separator
    pub fn new(name: impl AsRef<str>) -> Self {
        let name = name.as_ref().trim().trim_start_matches(SEPARATOR).to_string();
        let key = name.to_ascii_lowercase();
        Self { name, key }
    }

    /// Build from namespace segments and a short name
    pub fn from_parts(namespace: Option<&[String]>, short_name: &str) -> Self {
        match namespace {
            Some(parts) if !parts.is_empty() => {
                Self::new(format!("{}{}{}", parts.join("\\"), SEPARATOR, short_name))
            }
            _ => Self::new(short_name),
        }
    }

    /// The full name as written
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Lowercased name, suitable as a lookup key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Last segment of the name
    pub fn short_name(&self) -> &str {
        self.name.rsplit(SEPARATOR).next().unwrap_or(&self.name)
    }

    /// Namespace portion, empty for the global namespace
    pub fn namespace_name(&self) -> &str {
        self.name
            .rsplit_once(SEPARATOR)
            .map(|(ns, _)| ns)
            .unwrap_or("")
    }

    /// Whether the name lives outside the global namespace
    pub fn in_namespace(&self) -> bool {
        self.name.contains(SEPARATOR)
    }

    /// Namespace segments (empty for the global namespace)
    pub fn namespace_parts(&self) -> Vec<String> {
        let ns = self.namespace_name();
        if ns.is_empty() {
            Vec::new()
        } else {
            ns.split(SEPARATOR).map(str::to_string).collect()
        }
    }

    /// Case-insensitive comparison against a raw name (leading separator ignored)
    pub fn matches(&self, other: &str) -> bool {
        other
            .trim()
            .trim_start_matches(SEPARATOR)
            .eq_ignore_ascii_case(&self.name)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for FullyQualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FullyQualifiedName {}

impl Hash for FullyQualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for FullyQualifiedName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FullyQualifiedName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for FullyQualifiedName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FullyQualifiedName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl Serialize for FullyQualifiedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_strips_leading_separator() {
        let name = FullyQualifiedName::new("\\App\\Models\\User");
        assert_eq!(name.as_str(), "App\\Models\\User");
        assert_eq!(name.short_name(), "User");
        assert_eq!(name.namespace_name(), "App\\Models");
        assert!(name.in_namespace());
    }

    #[test]
    fn test_global_name() {
        let name = FullyQualifiedName::new("stdClass");
        assert_eq!(name.short_name(), "stdClass");
        assert_eq!(name.namespace_name(), "");
        assert!(!name.in_namespace());
        assert!(name.namespace_parts().is_empty());
    }

    #[test]
    fn test_case_insensitive_equality() {
        let a = FullyQualifiedName::new("App\\User");
        let b = FullyQualifiedName::new("\\app\\USER");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        // Display keeps the original spelling
        assert_eq!(b.to_string(), "app\\USER");
    }

    #[test]
    fn test_from_parts() {
        let ns = vec!["App".to_string(), "Models".to_string()];
        let name = FullyQualifiedName::from_parts(Some(&ns), "User");
        assert_eq!(name.as_str(), "App\\Models\\User");
        assert_eq!(name.namespace_parts(), ns);

        let global = FullyQualifiedName::from_parts(None, "User");
        assert_eq!(global.as_str(), "User");
    }

    #[test]
    fn test_matches_raw_name() {
        let name = FullyQualifiedName::new("App\\Base");
        assert!(name.matches("\\App\\Base"));
        assert!(name.matches("app\\base"));
        assert!(!name.matches("Base"));
    }
}
