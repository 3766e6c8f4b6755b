//! `namespace/name` addressing for mutations and getters.

use crate::error::StoreError;
use std::fmt::{Display, Formatter};

/// A namespaced member reference such as `bridge/mutate`.
///
/// The namespace is everything before the last `/`, so nested namespace
/// names (`app/bridge/installed`) resolve the way module paths do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedName {
    pub namespace: String,
    pub name: String,
}

impl ScopedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let (namespace, name) = path
            .rsplit_once('/')
            .ok_or_else(|| StoreError::MalformedPath(path.to_string()))?;
        if namespace.is_empty() || name.is_empty() {
            return Err(StoreError::MalformedPath(path.to_string()));
        }
        Ok(Self::new(namespace, name))
    }
}

impl Display for ScopedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespace_and_member() {
        let parsed = ScopedName::parse("bridge/installed").expect("path should parse");
        assert_eq!(parsed, ScopedName::new("bridge", "installed"));
        assert_eq!(parsed.to_string(), "bridge/installed");
    }

    #[test]
    fn nested_namespace_splits_on_last_separator() {
        let parsed = ScopedName::parse("app/bridge/mutate").expect("path should parse");
        assert_eq!(parsed.namespace, "app/bridge");
        assert_eq!(parsed.name, "mutate");
    }

    #[test]
    fn rejects_paths_without_both_parts() {
        for bad in ["installed", "/installed", "bridge/", ""] {
            assert!(
                matches!(ScopedName::parse(bad), Err(StoreError::MalformedPath(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
