use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// Type-tagged name under which parsed values are stored in a
/// [`ParseContext`](super::ParseContext).
///
/// Keys compare by name only. Two keys with the same name but different
/// value types address the same slot, and lookups skip values whose type
/// does not match.
pub struct ParameterKey<T> {
    name: Arc<str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ParameterKey<T> {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for ParameterKey<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for ParameterKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for ParameterKey<T> {}

impl<T> Hash for ParameterKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for ParameterKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParameterKey").field(&self.name).finish()
    }
}

impl<T> fmt::Display for ParameterKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
