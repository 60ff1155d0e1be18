//! Chain-of-responsibility decorators around a value parser.
//!
//! Each modifier receives a [`Chain`] handle for the links after it. Calling
//! [`Chain::next`] runs those links and finally the parser, whose value is
//! recorded in the context before control returns. A modifier that resumes
//! after `next` therefore already sees the value, as transformed by every
//! later link.

use std::sync::Arc;

use tracing::trace;

use super::context::ParseContext;
use super::key::ParameterKey;
use super::reader::ArgumentReader;
use super::value::ValueParser;
use crate::commands::Principal;
use crate::error::{ArgumentParseError, BuildError};

/// One link in a modifier chain.
///
/// `on_parse` must either call `chain.next(..)`, return `Ok(())` without
/// calling it to skip the parameter, or return an error.
pub trait Modifier<T>: Send + Sync {
    /// Unique name within a chain, used to anchor insertions.
    fn name(&self) -> &str;

    fn on_parse(
        &self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        chain: Chain<'_, T>,
    ) -> Result<(), ArgumentParseError>;

    /// Adjusts completions produced by the parser and the links after this one.
    fn complete(&self, _context: &ParseContext<'_>, completions: Vec<String>) -> Vec<String> {
        completions
    }

    /// Adjusts usage produced by the parser and the links after this one.
    fn usage(&self, _key: &ParameterKey<T>, _principal: &dyn Principal, usage: String) -> String {
        usage
    }
}

/// The remainder of a chain, ending in the terminal parser.
pub struct Chain<'c, T> {
    links: &'c [Arc<dyn Modifier<T>>],
    parser: &'c dyn ValueParser<T>,
}

impl<T> Clone for Chain<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Chain<'_, T> {}

impl<'c, T: Send + Sync + 'static> Chain<'c, T> {
    /// Runs the next link, or the parser when no link is left.
    pub fn next(
        self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
    ) -> Result<(), ArgumentParseError> {
        match self.links.split_first() {
            Some((link, rest)) => link.on_parse(
                key,
                reader,
                context,
                Chain {
                    links: rest,
                    parser: self.parser,
                },
            ),
            None => {
                if let Some(value) = self.parser.parse(key, reader, context)? {
                    context.put(key, value);
                }
                Ok(())
            }
        }
    }

    /// Whether the terminal parser is next.
    pub fn is_terminal(&self) -> bool {
        self.links.is_empty()
    }
}

/// Ordered modifiers for one parameter.
pub struct ModifierChain<T> {
    links: Vec<Arc<dyn Modifier<T>>>,
}

impl<T> Default for ModifierChain<T> {
    fn default() -> Self {
        Self { links: Vec::new() }
    }
}

impl<T> Clone for ModifierChain<T> {
    fn clone(&self) -> Self {
        Self {
            links: self.links.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> ModifierChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `modifier` as the innermost link.
    pub fn push(&mut self, modifier: impl Modifier<T> + 'static) -> Result<(), BuildError> {
        let modifier: Arc<dyn Modifier<T>> = Arc::new(modifier);
        self.ensure_unique(modifier.name())?;
        self.links.push(modifier);
        Ok(())
    }

    /// Inserts `modifier` directly before the link named `anchor`.
    pub fn insert_before(
        &mut self,
        anchor: &str,
        modifier: impl Modifier<T> + 'static,
    ) -> Result<(), BuildError> {
        let index = self.position(anchor)?;
        self.insert_at(index, modifier)
    }

    /// Inserts `modifier` directly after the link named `anchor`.
    pub fn insert_after(
        &mut self,
        anchor: &str,
        modifier: impl Modifier<T> + 'static,
    ) -> Result<(), BuildError> {
        let index = self.position(anchor)?;
        self.insert_at(index + 1, modifier)
    }

    fn insert_at(&mut self, index: usize, modifier: impl Modifier<T> + 'static) -> Result<(), BuildError> {
        let modifier: Arc<dyn Modifier<T>> = Arc::new(modifier);
        self.ensure_unique(modifier.name())?;
        self.links.insert(index, modifier);
        Ok(())
    }

    fn position(&self, anchor: &str) -> Result<usize, BuildError> {
        self.links
            .iter()
            .position(|link| link.name() == anchor)
            .ok_or_else(|| BuildError::UnknownModifier(anchor.to_string()))
    }

    fn ensure_unique(&self, name: &str) -> Result<(), BuildError> {
        if self.contains(name) {
            Err(BuildError::DuplicateModifier(name.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.links.iter().any(|link| link.name() == name)
    }

    /// Link names, outermost first.
    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(|link| link.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Runs the whole chain over `parser`.
    pub fn parse(
        &self,
        key: &ParameterKey<T>,
        parser: &dyn ValueParser<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
    ) -> Result<(), ArgumentParseError> {
        trace!(key = key.name(), modifiers = ?self.names(), "Parsing parameter");
        Chain {
            links: &self.links,
            parser,
        }
        .next(key, reader, context)
    }

    /// Parser completions, then each modifier from innermost to outermost.
    pub fn complete(
        &self,
        parser: &dyn ValueParser<T>,
        context: &ParseContext<'_>,
        partial: &str,
    ) -> Vec<String> {
        self.links
            .iter()
            .rev()
            .fold(parser.complete(context, partial), |completions, link| {
                link.complete(context, completions)
            })
    }

    /// Parser usage, then each modifier from innermost to outermost.
    pub fn usage(
        &self,
        key: &ParameterKey<T>,
        parser: &dyn ValueParser<T>,
        principal: &dyn Principal,
    ) -> String {
        self.links
            .iter()
            .rev()
            .fold(parser.usage(key), |usage, link| link.usage(key, principal, usage))
    }
}

/// Lets the parameter be absent.
///
/// With nothing left to read, the default (if any) is recorded and the chain
/// is skipped. Otherwise the chain runs; a failure is swallowed, restoring the
/// reader and context and recording the default, when the modifier is weak or
/// when more tokens follow the one being parsed. A strong optional parameter
/// that fails on the last token reports the failure.
pub struct OptionalModifier<T> {
    weak: bool,
    default: Option<T>,
}

impl<T> OptionalModifier<T> {
    pub fn new() -> Self {
        Self {
            weak: false,
            default: None,
        }
    }

    pub fn weak() -> Self {
        Self {
            weak: true,
            default: None,
        }
    }

    pub fn with_default(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }
}

impl<T> Default for OptionalModifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> OptionalModifier<T> {
    fn record_default(&self, key: &ParameterKey<T>, context: &mut ParseContext<'_>) {
        if let Some(default) = &self.default {
            context.put(key, default.clone());
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Modifier<T> for OptionalModifier<T> {
    fn name(&self) -> &str {
        "optional"
    }

    fn on_parse(
        &self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        chain: Chain<'_, T>,
    ) -> Result<(), ArgumentParseError> {
        if !reader.has_remaining_tokens() {
            self.record_default(key, context);
            return Ok(());
        }

        let state = reader.state();
        let checkpoint = context.checkpoint();
        let more_follows = reader.parse_string().is_ok() && reader.has_remaining_tokens();
        reader.set_state(state);

        match chain.next(key, reader, context) {
            Ok(()) => Ok(()),
            Err(err) if self.weak || more_follows => {
                trace!(key = key.name(), error = %err, "Optional parameter skipped");
                reader.set_state(state);
                context.rollback(checkpoint);
                self.record_default(key, context);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn usage(&self, _key: &ParameterKey<T>, _principal: &dyn Principal, usage: String) -> String {
        if usage.is_empty() {
            usage
        } else {
            format!("[{usage}]")
        }
    }
}

/// Runs the rest of the chain exactly `times` times.
pub struct RepeatedModifier {
    times: usize,
}

impl RepeatedModifier {
    pub fn new(times: usize) -> Self {
        Self { times }
    }
}

impl<T: Send + Sync + 'static> Modifier<T> for RepeatedModifier {
    fn name(&self) -> &str {
        "repeated"
    }

    fn on_parse(
        &self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        chain: Chain<'_, T>,
    ) -> Result<(), ArgumentParseError> {
        for _ in 0..self.times {
            chain.next(key, reader, context)?;
        }
        Ok(())
    }

    fn usage(&self, _key: &ParameterKey<T>, _principal: &dyn Principal, usage: String) -> String {
        format!("{}*{usage}", self.times)
    }
}

/// Runs the rest of the chain until the input is exhausted.
///
/// Stops early if a pass consumes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllOfModifier;

impl<T: Send + Sync + 'static> Modifier<T> for AllOfModifier {
    fn name(&self) -> &str {
        "all_of"
    }

    fn on_parse(
        &self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        chain: Chain<'_, T>,
    ) -> Result<(), ArgumentParseError> {
        while reader.has_remaining_tokens() {
            let before = reader.cursor();
            chain.next(key, reader, context)?;
            if reader.cursor() == before {
                break;
            }
        }
        Ok(())
    }

    fn usage(&self, _key: &ParameterKey<T>, _principal: &dyn Principal, usage: String) -> String {
        format!("{usage}...")
    }
}

/// Fails when more than one value ends up recorded under the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnlyOneModifier;

impl<T: Send + Sync + 'static> Modifier<T> for OnlyOneModifier {
    fn name(&self) -> &str {
        "only_one"
    }

    fn on_parse(
        &self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        chain: Chain<'_, T>,
    ) -> Result<(), ArgumentParseError> {
        chain.next(key, reader, context)?;
        if context.count(key.name()) > 1 {
            return Err(reader.error(format!("Argument '{key}' may have only one value")));
        }
        Ok(())
    }
}

/// Fails unless the principal holds `node`. Hides completions and usage otherwise.
pub struct PermissionModifier {
    node: String,
}

impl PermissionModifier {
    pub fn new(node: impl Into<String>) -> Self {
        Self { node: node.into() }
    }
}

impl<T: Send + Sync + 'static> Modifier<T> for PermissionModifier {
    fn name(&self) -> &str {
        "permission"
    }

    fn on_parse(
        &self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        chain: Chain<'_, T>,
    ) -> Result<(), ArgumentParseError> {
        if !context.principal().has_permission(&self.node) {
            return Err(reader.error(format!(
                "You do not have permission to use the '{key}' argument"
            )));
        }
        chain.next(key, reader, context)
    }

    fn complete(&self, context: &ParseContext<'_>, completions: Vec<String>) -> Vec<String> {
        if context.principal().has_permission(&self.node) {
            completions
        } else {
            Vec::new()
        }
    }

    fn usage(&self, _key: &ParameterKey<T>, principal: &dyn Principal, usage: String) -> String {
        if principal.has_permission(&self.node) {
            usage
        } else {
            String::new()
        }
    }
}

/// Replaces the value produced by the rest of the chain with `f(value)`.
pub struct MapModifier<T> {
    f: Arc<dyn Fn(T) -> T + Send + Sync>,
}

impl<T> MapModifier<T> {
    pub fn new(f: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<T: Send + Sync + 'static> Modifier<T> for MapModifier<T> {
    fn name(&self) -> &str {
        "map"
    }

    fn on_parse(
        &self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        chain: Chain<'_, T>,
    ) -> Result<(), ArgumentParseError> {
        let before = context.count(key.name());
        chain.next(key, reader, context)?;
        if context.count(key.name()) > before {
            context.transform_last(key, |value| (self.f)(value));
        }
        Ok(())
    }
}
