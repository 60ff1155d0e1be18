//! The invoking principal (command source / cause).

use std::collections::BTreeSet;

/// Identity on whose behalf a command is routed and parsed.
///
/// The router only ever asks for an identifier and for permission checks; it
/// never inspects anything else about the principal.
pub trait Principal: Send + Sync {
    /// Stable identifier, used in logs.
    fn identifier(&self) -> &str;

    /// Whether this principal holds the given permission node.
    fn has_permission(&self, permission: &str) -> bool;
}

/// A principal backed by an explicit set of permission nodes.
///
/// Granting `a.b` also grants every descendant such as `a.b.c`. The node `*`
/// grants everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimplePrincipal {
    name: String,
    permissions: BTreeSet<String>,
}

impl SimplePrincipal {
    /// Creates a principal with no permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: BTreeSet::new(),
        }
    }

    /// Creates a principal holding every permission.
    pub fn superuser(name: impl Into<String>) -> Self {
        Self::new(name).grant("*")
    }

    /// Grants a permission node.
    pub fn grant(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into().to_lowercase());
        self
    }

    /// Grants every node in `permissions`.
    pub fn grant_all<I, S>(self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        permissions.into_iter().fold(self, Self::grant)
    }

    /// Returns the granted nodes.
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }
}

impl Principal for SimplePrincipal {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        let permission = permission.to_lowercase();
        self.permissions.iter().any(|granted| {
            granted == "*"
                || *granted == permission
                || permission
                    .strip_prefix(granted.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_permission() {
        let principal = SimplePrincipal::new("bob").grant("cmd.tp");
        assert!(principal.has_permission("cmd.tp"));
        assert!(!principal.has_permission("cmd.give"));
    }

    #[test]
    fn test_parent_node_grants_children() {
        let principal = SimplePrincipal::new("bob").grant("cmd");
        assert!(principal.has_permission("cmd.tp"));
        assert!(principal.has_permission("cmd.tp.others"));
        assert!(!principal.has_permission("cmdx"));
    }

    #[test]
    fn test_wildcard_and_case() {
        assert!(SimplePrincipal::superuser("root").has_permission("anything.at.all"));
        let principal = SimplePrincipal::new("bob").grant("Cmd.TP");
        assert!(principal.has_permission("cmd.tp"));
    }

    #[test]
    fn test_grant_all() {
        let principal = SimplePrincipal::new("bob").grant_all(["a", "b.c"]);
        assert_eq!(principal.permissions().collect::<Vec<_>>(), vec!["a", "b.c"]);
        assert_eq!(principal.identifier(), "bob");
    }
}
