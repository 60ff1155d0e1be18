//! The alias multimap underlying the dispatcher.
//!
//! Keys are lower-cased aliases, values are the mappings registered under that
//! alias in registration order. Several mappings may share an alias; picking
//! one is the disambiguator's job, not the table's.

use indexmap::{IndexMap, IndexSet};

use super::mapping::CommandMapping;

/// Insertion-ordered alias multimap. Not synchronized; the dispatcher owns
/// the lock.
#[derive(Debug, Default)]
pub(crate) struct AliasTable {
    buckets: IndexMap<String, Vec<CommandMapping>>,
}

/// Normalizes an alias for lookup.
pub(crate) fn normalize(alias: &str) -> String {
    alias.to_lowercase()
}

impl AliasTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds `mapping` under every alias it declares.
    pub(crate) fn insert(&mut self, mapping: &CommandMapping) {
        for alias in mapping.all_aliases() {
            let bucket = self.buckets.entry(normalize(alias)).or_default();
            if !bucket.contains(mapping) {
                bucket.push(mapping.clone());
            }
        }
    }

    /// The mappings registered under `alias`, in registration order.
    pub(crate) fn bucket(&self, alias: &str) -> &[CommandMapping] {
        self.buckets
            .get(&normalize(alias))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Removes the whole bucket for `alias`.
    pub(crate) fn remove_alias(&mut self, alias: &str) -> Vec<CommandMapping> {
        self.buckets
            .shift_remove(&normalize(alias))
            .unwrap_or_default()
    }

    /// Removes every occurrence of every mapping matching `predicate`, from
    /// every bucket. Empty buckets are dropped. Returns the distinct removed
    /// mappings in the order they were first encountered.
    pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> Vec<CommandMapping>
    where
        F: FnMut(&CommandMapping) -> bool,
    {
        let mut removed: IndexSet<CommandMapping> = IndexSet::new();
        for bucket in self.buckets.values_mut() {
            bucket.retain(|mapping| {
                if predicate(mapping) {
                    removed.insert(mapping.clone());
                    false
                } else {
                    true
                }
            });
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        removed.into_iter().collect()
    }

    pub(crate) fn contains_alias(&self, alias: &str) -> bool {
        self.buckets.contains_key(&normalize(alias))
    }

    pub(crate) fn contains_mapping(&self, mapping: &CommandMapping) -> bool {
        self.buckets.values().flatten().any(|m| m == mapping)
    }

    /// Every distinct mapping, in first-registration order.
    pub(crate) fn mappings(&self) -> IndexSet<CommandMapping> {
        self.buckets.values().flatten().cloned().collect()
    }

    /// Lower-cased aliases paired with their buckets.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &[CommandMapping])> {
        self.buckets
            .iter()
            .map(|(alias, bucket)| (alias.as_str(), bucket.as_slice()))
    }

    /// Number of (alias, mapping) pairs.
    pub(crate) fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Read-only access to a locked alias table, handed to registration filters.
#[derive(Debug, Clone, Copy)]
pub struct AliasView<'a> {
    table: &'a AliasTable,
}

impl<'a> AliasView<'a> {
    pub(crate) fn new(table: &'a AliasTable) -> Self {
        Self { table }
    }

    /// Whether any mapping is registered under `alias`, ignoring case.
    pub fn contains_alias(&self, alias: &str) -> bool {
        self.table.contains_alias(alias)
    }

    /// The mappings registered under `alias`, in registration order.
    pub fn get_all(&self, alias: &str) -> &'a [CommandMapping] {
        self.table.bucket(alias)
    }

    /// Lower-cased aliases currently in use.
    pub fn aliases(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.table.entries().map(|(alias, _)| alias)
    }
}
