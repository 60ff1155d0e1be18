//! Root-level command router.
//!
//! Owns the alias table behind a reader-writer lock. Every mutating call holds
//! the write lock for its whole duration, so readers never see a registration
//! that is present under one of its aliases but not yet under another.

use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use super::alias_table::{normalize, AliasTable, AliasView};
use super::callable::{CommandCallable, TargetContext};
use super::disambiguator::{Disambiguator, FirstMatchDisambiguator};
use super::mapping::CommandMapping;
use super::principal::Principal;
use super::result::CommandResult;
use super::tree::CommandNode;
use crate::error::{BuildError, CommandError};

/// Splits a command line on the first run of whitespace.
///
/// Returns the head token and, if any whitespace followed it, the remainder
/// with its leading whitespace removed. `"tp "` yields `("tp", Some(""))`,
/// while `"tp"` yields `("tp", None)`.
pub fn split_head(line: &str) -> (&str, Option<&str>) {
    let line = line.trim_start();
    match line.find(char::is_whitespace) {
        Some(idx) => (&line[..idx], Some(line[idx..].trim_start())),
        None => (line, None),
    }
}

fn validate_aliases<S: AsRef<str>>(aliases: &[S]) -> Result<Vec<String>, BuildError> {
    aliases
        .iter()
        .map(|alias| {
            let alias = alias.as_ref();
            if alias.is_empty() || alias.chars().any(char::is_whitespace) {
                Err(BuildError::InvalidAlias(alias.to_string()))
            } else {
                Ok(alias.to_string())
            }
        })
        .collect()
}

/// Registers, looks up and routes to commands by alias.
pub struct Dispatcher {
    table: RwLock<AliasTable>,
    disambiguator: Box<dyn Disambiguator>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates a dispatcher using [`FirstMatchDisambiguator`].
    pub fn new() -> Self {
        Self::with_disambiguator(FirstMatchDisambiguator)
    }

    /// Creates a dispatcher with a specific disambiguation strategy.
    pub fn with_disambiguator(disambiguator: impl Disambiguator + 'static) -> Self {
        Self {
            table: RwLock::new(AliasTable::new()),
            disambiguator: Box::new(disambiguator),
        }
    }

    /// Registers `callable` under every alias in `aliases`.
    ///
    /// The first alias becomes the primary alias. Returns `Ok(None)` when
    /// `aliases` is empty.
    pub fn register<S: AsRef<str>>(
        &self,
        callable: Arc<dyn CommandCallable>,
        aliases: &[S],
    ) -> Result<Option<CommandMapping>, BuildError> {
        self.register_with(callable, aliases, |requested, _| requested.to_vec())
    }

    /// Registers `callable` under the aliases chosen by `filter`.
    ///
    /// `filter` receives the requested aliases and a view of the aliases
    /// already registered, and returns the ones to actually register. It may
    /// drop aliases but must not add any; an alias that was not requested is
    /// rejected with [`BuildError::UnrequestedAlias`] and nothing is
    /// registered. The filter runs while the table is locked, so it must read
    /// the table through the view rather than through this dispatcher.
    pub fn register_with<S, F>(
        &self,
        callable: Arc<dyn CommandCallable>,
        aliases: &[S],
        filter: F,
    ) -> Result<Option<CommandMapping>, BuildError>
    where
        S: AsRef<str>,
        F: FnOnce(&[String], &AliasView<'_>) -> Vec<String>,
    {
        let requested = validate_aliases(aliases)?;
        let mut table = self.table.write();
        let accepted = filter(&requested, &AliasView::new(&table));
        Self::insert_locked(&mut table, callable, &requested, accepted)
    }

    /// Registers `callable` under those of `aliases` that nothing else holds yet.
    pub fn register_unclaimed<S: AsRef<str>>(
        &self,
        callable: Arc<dyn CommandCallable>,
        aliases: &[S],
    ) -> Result<Option<CommandMapping>, BuildError> {
        self.register_with(callable, aliases, |requested, taken| {
            requested
                .iter()
                .filter(|alias| !taken.contains_alias(alias))
                .cloned()
                .collect()
        })
    }

    fn insert_locked(
        table: &mut AliasTable,
        callable: Arc<dyn CommandCallable>,
        requested: &[String],
        accepted: Vec<String>,
    ) -> Result<Option<CommandMapping>, BuildError> {
        if let Some(extra) = accepted.iter().find(|alias| !requested.contains(alias)) {
            return Err(BuildError::UnrequestedAlias(extra.clone()));
        }

        let mut accepted = accepted.into_iter();
        let Some(primary) = accepted.next() else {
            debug!(requested = ?requested, "No aliases left to register");
            return Ok(None);
        };

        let mapping = CommandMapping::new(callable, primary, accepted);
        table.insert(&mapping);
        debug!(
            primary = mapping.primary_alias(),
            secondary = ?mapping.secondary_aliases(),
            "Registered command"
        );
        Ok(Some(mapping))
    }

    /// Removes every mapping registered under `alias` from that alias.
    ///
    /// The mappings stay reachable through their other aliases.
    pub fn remove(&self, alias: &str) -> Vec<CommandMapping> {
        let removed = self.table.write().remove_alias(alias);
        debug!(alias, count = removed.len(), "Removed alias");
        removed
    }

    /// Removes each alias in `aliases`. Returns whether anything was removed.
    pub fn remove_all<I, S>(&self, aliases: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = self.table.write();
        let mut found = false;
        for alias in aliases {
            found |= !table.remove_alias(alias.as_ref()).is_empty();
        }
        found
    }

    /// Removes `mapping` from every alias it is registered under.
    pub fn remove_mapping(&self, mapping: &CommandMapping) -> Option<CommandMapping> {
        let removed = self.table.write().remove_where(|m| m == mapping);
        if !removed.is_empty() {
            debug!(primary = mapping.primary_alias(), "Removed command");
        }
        removed.into_iter().next()
    }

    /// Removes every mapping in `mappings`. Returns whether anything was removed.
    pub fn remove_mappings(&self, mappings: &[CommandMapping]) -> bool {
        let removed = self.table.write().remove_where(|m| mappings.contains(m));
        debug!(count = removed.len(), "Removed commands");
        !removed.is_empty()
    }

    /// Resolves `alias`, consulting the disambiguator when several mappings share it.
    pub fn get(&self, alias: &str, principal: Option<&dyn Principal>) -> Option<CommandMapping> {
        let candidates = self.table.read().bucket(alias).to_vec();
        trace!(alias, candidates = candidates.len(), "Looking up alias");

        match candidates.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            _ => {
                let chosen = self
                    .disambiguator
                    .disambiguate(principal, alias, &candidates);
                if chosen.is_none() {
                    warn!(alias, candidates = candidates.len(), "Disambiguator declined to choose");
                }
                chosen
            }
        }
    }

    /// Every mapping registered under `alias`.
    pub fn get_all(&self, alias: &str) -> IndexSet<CommandMapping> {
        self.table.read().bucket(alias).iter().cloned().collect()
    }

    /// Every distinct registered mapping.
    pub fn commands(&self) -> IndexSet<CommandMapping> {
        self.table.read().mappings()
    }

    /// The primary alias of every registered mapping.
    pub fn primary_aliases(&self) -> IndexSet<String> {
        self.commands()
            .iter()
            .map(|mapping| mapping.primary_alias().to_string())
            .collect()
    }

    /// Every alias declared by a registered mapping, case preserved.
    pub fn aliases(&self) -> IndexSet<String> {
        self.commands()
            .iter()
            .flat_map(|mapping| mapping.all_aliases().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.table.read().contains_alias(alias)
    }

    pub fn contains_mapping(&self, mapping: &CommandMapping) -> bool {
        self.table.read().contains_mapping(mapping)
    }

    /// Number of registered (alias, mapping) pairs.
    pub fn size(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Lower-cased aliases with at least one mapping `principal` may use, in
    /// registration order. Computed fresh on every call.
    pub fn filter_aliases(&self, principal: &dyn Principal) -> Vec<String> {
        let entries: Vec<(String, Vec<CommandMapping>)> = self
            .table
            .read()
            .entries()
            .map(|(alias, bucket)| (alias.to_string(), bucket.to_vec()))
            .collect();

        entries
            .into_iter()
            .filter(|(_, bucket)| {
                bucket
                    .iter()
                    .any(|mapping| mapping.callable().test_permission(principal))
            })
            .map(|(alias, _)| alias)
            .collect()
    }

    /// Routes `command_line` to the command named by its first token.
    pub fn process(
        &self,
        principal: &dyn Principal,
        command_line: &str,
    ) -> Result<CommandResult, CommandError> {
        let (head, rest) = split_head(command_line);
        if head.is_empty() {
            return Err(CommandError::execution(format!(
                "Usage: {}",
                CommandCallable::usage(self, principal)
            )));
        }
        let mapping = self
            .get(head, Some(principal))
            .ok_or_else(|| CommandError::NotFound {
                alias: head.to_string(),
            })?;

        debug!(
            alias = head,
            primary = mapping.primary_alias(),
            principal = principal.identifier(),
            "Dispatching command"
        );
        mapping
            .callable()
            .process(principal, rest.unwrap_or_default())
            .map_err(|e| e.within(head))
    }

    /// Completions for a partially typed command line.
    pub fn suggestions(
        &self,
        principal: &dyn Principal,
        arguments: &str,
        target: Option<&TargetContext>,
    ) -> Result<Vec<String>, CommandError> {
        let (head, rest) = split_head(arguments);
        let Some(rest) = rest else {
            let prefix = normalize(head);
            return Ok(self
                .filter_aliases(principal)
                .into_iter()
                .filter(|alias| alias.starts_with(&prefix))
                .collect());
        };

        match self.get(head, Some(principal)) {
            Some(mapping) => mapping.callable().suggestions(principal, rest, target),
            None => Ok(Vec::new()),
        }
    }

    /// Whether any registered command grants permission to `principal`.
    pub fn test_permission(&self, principal: &dyn Principal) -> bool {
        self.commands()
            .iter()
            .any(|mapping| mapping.callable().test_permission(principal))
    }

    /// Read-only tree view over the registered commands and their children.
    pub fn tree(&self) -> Vec<CommandNode> {
        self.commands().into_iter().map(CommandNode::new).collect()
    }
}

impl CommandCallable for Dispatcher {
    fn process(
        &self,
        principal: &dyn Principal,
        arguments: &str,
    ) -> Result<CommandResult, CommandError> {
        Dispatcher::process(self, principal, arguments)
    }

    fn suggestions(
        &self,
        principal: &dyn Principal,
        arguments: &str,
        target: Option<&TargetContext>,
    ) -> Result<Vec<String>, CommandError> {
        Dispatcher::suggestions(self, principal, arguments, target)
    }

    fn test_permission(&self, principal: &dyn Principal) -> bool {
        Dispatcher::test_permission(self, principal)
    }

    fn usage(&self, principal: &dyn Principal) -> String {
        self.filter_aliases(principal)
            .into_iter()
            .filter(|alias| {
                self.get(alias, Some(principal))
                    .is_some_and(|mapping| normalize(mapping.primary_alias()) == *alias)
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    fn help(&self, principal: &dyn Principal) -> Option<String> {
        let mut visible: Vec<CommandMapping> = self
            .commands()
            .into_iter()
            .filter(|mapping| mapping.callable().test_permission(principal))
            .collect();
        if visible.is_empty() {
            return None;
        }
        visible.sort_by(|a, b| a.primary_alias().cmp(b.primary_alias()));

        let lines: Vec<String> = visible
            .iter()
            .map(|mapping| {
                let callable = mapping.callable();
                let detail = callable
                    .short_description(principal)
                    .unwrap_or_else(|| callable.usage(principal));
                format!("{} {}", mapping.primary_alias(), detail)
            })
            .collect();
        Some(lines.join("\n"))
    }

    fn child_mappings(&self) -> Vec<CommandMapping> {
        self.commands().into_iter().collect()
    }
}
