//! Immutable association between a command's aliases and its callable.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::callable::CommandCallable;

/// One registration of a callable under a primary alias and its secondaries.
///
/// Cloning is cheap and clones refer to the same registration. Equality and
/// hashing are by identity: two mappings built from identical aliases and the
/// same callable are still distinct unless one is a clone of the other.
#[derive(Clone)]
pub struct CommandMapping {
    inner: Arc<MappingInner>,
}

struct MappingInner {
    primary: String,
    secondary: Vec<String>,
    callable: Arc<dyn CommandCallable>,
}

impl CommandMapping {
    /// Creates a mapping. Secondary aliases are de-duplicated in order and
    /// never repeat the primary alias.
    pub fn new(
        callable: Arc<dyn CommandCallable>,
        primary: impl Into<String>,
        secondary: impl IntoIterator<Item = String>,
    ) -> Self {
        let primary = primary.into();
        let mut seen = vec![primary.clone()];
        let secondary = secondary
            .into_iter()
            .filter(|alias| {
                if seen.contains(alias) {
                    false
                } else {
                    seen.push(alias.clone());
                    true
                }
            })
            .collect();

        Self {
            inner: Arc::new(MappingInner {
                primary,
                secondary,
                callable,
            }),
        }
    }

    /// The alias the command is displayed under.
    pub fn primary_alias(&self) -> &str {
        &self.inner.primary
    }

    /// Every alias except the primary one, in registration order.
    pub fn secondary_aliases(&self) -> &[String] {
        &self.inner.secondary
    }

    /// The primary alias followed by the secondary aliases.
    pub fn all_aliases(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_alias()).chain(self.inner.secondary.iter().map(String::as_str))
    }

    /// The registered callable.
    pub fn callable(&self) -> &Arc<dyn CommandCallable> {
        &self.inner.callable
    }
}

impl PartialEq for CommandMapping {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for CommandMapping {}

impl Hash for CommandMapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.inner), state);
    }
}

impl fmt::Debug for CommandMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandMapping")
            .field("primary", &self.inner.primary)
            .field("secondary", &self.inner.secondary)
            .finish_non_exhaustive()
    }
}
