//! Per-invocation accumulator of parsed values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::key::ParameterKey;
use crate::commands::Principal;
use crate::error::CommandError;

struct Entry {
    key: Arc<str>,
    value: Box<dyn Any + Send + Sync>,
}

/// Position in a [`ParseContext`] to roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    entries: usize,
    flags: usize,
}

/// Values parsed during one invocation, in the order they were produced,
/// plus the flags seen and the invoking principal.
///
/// Values are only ever appended, except through [`transform_last`] and
/// [`rollback`].
///
/// [`transform_last`]: ParseContext::transform_last
/// [`rollback`]: ParseContext::rollback
pub struct ParseContext<'p> {
    principal: &'p dyn Principal,
    entries: Vec<Entry>,
    flags: Vec<Arc<[String]>>,
}

impl<'p> ParseContext<'p> {
    pub fn new(principal: &'p dyn Principal) -> Self {
        Self {
            principal,
            entries: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn principal(&self) -> &'p dyn Principal {
        self.principal
    }

    /// Appends `value` under `key`.
    pub fn put<T: Send + Sync + 'static>(&mut self, key: &ParameterKey<T>, value: T) {
        self.entries.push(Entry {
            key: Arc::from(key.name()),
            value: Box::new(value),
        });
    }

    /// Every value recorded under `key`, oldest first.
    pub fn all<T: 'static>(&self, key: &ParameterKey<T>) -> Vec<&T> {
        self.entries
            .iter()
            .filter(|entry| &*entry.key == key.name())
            .filter_map(|entry| entry.value.downcast_ref::<T>())
            .collect()
    }

    /// The first value recorded under `key`.
    pub fn one<T: 'static>(&self, key: &ParameterKey<T>) -> Option<&T> {
        self.entries
            .iter()
            .filter(|entry| &*entry.key == key.name())
            .find_map(|entry| entry.value.downcast_ref::<T>())
    }

    /// Like [`one`](Self::one), failing when nothing was recorded.
    pub fn require_one<T: 'static>(&self, key: &ParameterKey<T>) -> Result<&T, CommandError> {
        self.one(key)
            .ok_or_else(|| CommandError::execution(format!("Missing value for argument '{key}'")))
    }

    pub fn has_any<T: 'static>(&self, key: &ParameterKey<T>) -> bool {
        self.one(key).is_some()
    }

    /// Number of values recorded under `name`, of any type.
    pub fn count(&self, name: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| &*entry.key == name)
            .count()
    }

    /// Replaces the most recent value under `key` with `f(value)`.
    ///
    /// Returns `false` when there is no value of type `T` to transform.
    pub fn transform_last<T, F>(&mut self, key: &ParameterKey<T>, f: F) -> bool
    where
        T: Send + Sync + 'static,
        F: FnOnce(T) -> T,
    {
        let Some(slot) = self
            .entries
            .iter_mut()
            .rev()
            .find(|entry| &*entry.key == key.name() && entry.value.is::<T>())
        else {
            return false;
        };

        let placeholder: Box<dyn Any + Send + Sync> = Box::new(());
        let value = std::mem::replace(&mut slot.value, placeholder);
        match value.downcast::<T>() {
            Ok(value) => {
                slot.value = Box::new(f(*value));
                true
            }
            Err(original) => {
                slot.value = original;
                false
            }
        }
    }

    /// Records one occurrence of the flag known by `aliases`.
    pub fn record_flag(&mut self, aliases: Arc<[String]>) {
        self.flags.push(aliases);
    }

    /// Whether the flag known by `name` was given. Leading dashes are ignored.
    pub fn has_flag(&self, name: &str) -> bool {
        self.flag_invocation_count(name) > 0
    }

    /// How many times the flag known by `name` was given.
    pub fn flag_invocation_count(&self, name: &str) -> usize {
        let name = name.trim_start_matches('-').to_lowercase();
        self.flags
            .iter()
            .filter(|aliases| aliases.iter().any(|alias| alias.to_lowercase() == name))
            .count()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            entries: self.entries.len(),
            flags: self.flags.len(),
        }
    }

    /// Discards everything recorded since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.entries.truncate(checkpoint.entries);
        self.flags.truncate(checkpoint.flags);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.flags.is_empty()
    }
}

impl fmt::Debug for ParseContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("principal", &self.principal.identifier())
            .field(
                "keys",
                &self.entries.iter().map(|e| &*e.key).collect::<Vec<_>>(),
            )
            .field("flags", &self.flags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::SimplePrincipal;

    #[test]
    fn test_values_in_order() {
        let principal = SimplePrincipal::new("tester");
        let mut context = ParseContext::new(&principal);
        let key = ParameterKey::<i32>::new("n");
        context.put(&key, 1);
        context.put(&key, 2);

        assert_eq!(context.all(&key), vec![&1, &2]);
        assert_eq!(context.one(&key), Some(&1));
        assert_eq!(context.count("n"), 2);
        assert_eq!(context.principal().identifier(), "tester");
    }

    #[test]
    fn test_type_mismatch_is_skipped() {
        let principal = SimplePrincipal::new("tester");
        let mut context = ParseContext::new(&principal);
        context.put(&ParameterKey::<i32>::new("x"), 5);

        let as_string = ParameterKey::<String>::new("x");
        assert!(context.one(&as_string).is_none());
        assert!(context.require_one(&as_string).is_err());
        assert_eq!(context.count("x"), 1);
    }

    #[test]
    fn test_transform_last() {
        let principal = SimplePrincipal::new("tester");
        let mut context = ParseContext::new(&principal);
        let key = ParameterKey::<i32>::new("n");
        context.put(&key, 1);
        context.put(&key, 2);

        assert!(context.transform_last(&key, |n| n * 10));
        assert_eq!(context.all(&key), vec![&1, &20]);
        assert!(!context.transform_last(&ParameterKey::<i32>::new("missing"), |n| n));
    }

    #[test]
    fn test_rollback_discards_later_values_and_flags() {
        let principal = SimplePrincipal::new("tester");
        let mut context = ParseContext::new(&principal);
        let key = ParameterKey::<String>::new("name");
        context.put(&key, "kept".to_string());

        let checkpoint = context.checkpoint();
        context.put(&key, "dropped".to_string());
        context.record_flag(Arc::from(vec!["s".to_string(), "silent".to_string()]));
        context.rollback(checkpoint);

        assert_eq!(context.all(&key), vec!["kept"]);
        assert!(!context.has_flag("s"));
    }

    #[test]
    fn test_flag_counts_by_any_alias() {
        let principal = SimplePrincipal::new("tester");
        let mut context = ParseContext::new(&principal);
        let aliases: Arc<[String]> = Arc::from(vec!["v".to_string(), "verbose".to_string()]);
        context.record_flag(aliases.clone());
        context.record_flag(aliases);

        assert_eq!(context.flag_invocation_count("v"), 2);
        assert_eq!(context.flag_invocation_count("--VERBOSE"), 2);
        assert!(!context.has_flag("q"));
    }
}
