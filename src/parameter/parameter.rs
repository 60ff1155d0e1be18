//! Parameters: a value parser plus its modifier chain, and combinators over them.

use std::sync::Arc;

use indexmap::IndexSet;

use super::context::ParseContext;
use super::key::ParameterKey;
use super::modifier::{
    AllOfModifier, MapModifier, Modifier, ModifierChain, OnlyOneModifier, OptionalModifier,
    PermissionModifier, RepeatedModifier,
};
use super::reader::ArgumentReader;
use super::value::ValueParser;
use crate::commands::Principal;
use crate::error::{ArgumentParseError, BuildError};

/// Something that consumes part of the argument text into a [`ParseContext`].
pub trait Parameter: Send + Sync {
    fn parse(
        &self,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
    ) -> Result<(), ArgumentParseError>;

    /// Completions for the token at the reader's cursor.
    fn complete(&self, reader: &mut ArgumentReader, context: &mut ParseContext<'_>) -> Vec<String>;

    fn usage(&self, principal: &dyn Principal) -> String;

    /// Whether the parameter may be left out entirely.
    fn is_optional(&self) -> bool {
        false
    }
}

/// A typed parameter: key, parser and modifiers.
pub struct ValueParameter<T> {
    key: ParameterKey<T>,
    parser: Arc<dyn ValueParser<T>>,
    modifiers: ModifierChain<T>,
}

impl<T: Send + Sync + 'static> ValueParameter<T> {
    pub fn builder() -> ValueParameterBuilder<T> {
        ValueParameterBuilder {
            key: None,
            parser: None,
            modifiers: ModifierChain::new(),
            error: None,
        }
    }

    pub fn key(&self) -> &ParameterKey<T> {
        &self.key
    }

    pub fn modifiers(&self) -> &ModifierChain<T> {
        &self.modifiers
    }
}

/// Shorthand for a builder with key `name` and `parser` already set.
pub fn value<T: Send + Sync + 'static>(
    name: &str,
    parser: impl ValueParser<T> + 'static,
) -> ValueParameterBuilder<T> {
    ValueParameter::builder()
        .key(ParameterKey::new(name))
        .parser(parser)
}

impl<T: Send + Sync + 'static> Parameter for ValueParameter<T> {
    fn parse(
        &self,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
    ) -> Result<(), ArgumentParseError> {
        self.modifiers
            .parse(&self.key, &*self.parser, reader, context)
    }

    fn complete(&self, reader: &mut ArgumentReader, context: &mut ParseContext<'_>) -> Vec<String> {
        reader.skip_whitespace();
        let partial = reader.remaining().to_string();
        self.modifiers.complete(&*self.parser, context, &partial)
    }

    fn usage(&self, principal: &dyn Principal) -> String {
        self.modifiers.usage(&self.key, &*self.parser, principal)
    }

    fn is_optional(&self) -> bool {
        self.modifiers.contains("optional")
    }
}

/// Accumulates a [`ValueParameter`]. Missing fields and modifier conflicts
/// are reported by [`build`](Self::build).
pub struct ValueParameterBuilder<T> {
    key: Option<ParameterKey<T>>,
    parser: Option<Arc<dyn ValueParser<T>>>,
    modifiers: ModifierChain<T>,
    error: Option<BuildError>,
}

impl<T: Send + Sync + 'static> ValueParameterBuilder<T> {
    pub fn key(mut self, key: ParameterKey<T>) -> Self {
        self.key = Some(key);
        self
    }

    pub fn parser(mut self, parser: impl ValueParser<T> + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Appends `modifier` as the innermost link.
    pub fn modifier(self, modifier: impl Modifier<T> + 'static) -> Self {
        self.with_chain(|chain| chain.push(modifier))
    }

    pub fn modifier_before(self, anchor: &str, modifier: impl Modifier<T> + 'static) -> Self {
        self.with_chain(|chain| chain.insert_before(anchor, modifier))
    }

    pub fn modifier_after(self, anchor: &str, modifier: impl Modifier<T> + 'static) -> Self {
        self.with_chain(|chain| chain.insert_after(anchor, modifier))
    }

    pub fn repeated(self, times: usize) -> Self {
        self.modifier(RepeatedModifier::new(times))
    }

    pub fn all_of(self) -> Self {
        self.modifier(AllOfModifier)
    }

    pub fn only_one(self) -> Self {
        self.modifier(OnlyOneModifier)
    }

    pub fn permission(self, node: impl Into<String>) -> Self {
        self.modifier(PermissionModifier::new(node))
    }

    pub fn map(self, f: impl Fn(T) -> T + Send + Sync + 'static) -> Self {
        self.modifier(MapModifier::new(f))
    }

    fn with_chain(
        mut self,
        f: impl FnOnce(&mut ModifierChain<T>) -> Result<(), BuildError>,
    ) -> Self {
        if self.error.is_none() {
            if let Err(e) = f(&mut self.modifiers) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(self) -> Result<ValueParameter<T>, BuildError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Ok(ValueParameter {
            key: self.key.ok_or(BuildError::MissingKey)?,
            parser: self.parser.ok_or(BuildError::MissingParser)?,
            modifiers: self.modifiers,
        })
    }
}

impl<T: Clone + Send + Sync + 'static> ValueParameterBuilder<T> {
    pub fn optional(self) -> Self {
        self.modifier(OptionalModifier::new())
    }

    pub fn optional_weak(self) -> Self {
        self.modifier(OptionalModifier::weak())
    }

    /// Optional, recording `value` when the parameter is absent.
    pub fn default_value(self, value: T) -> Self {
        self.modifier(OptionalModifier::new().with_default(value))
    }
}

/// Parses each parameter in order.
#[derive(Default)]
pub struct Sequence {
    parameters: Vec<Box<dyn Parameter>>,
}

impl Sequence {
    pub fn new(parameters: Vec<Box<dyn Parameter>>) -> Self {
        Self { parameters }
    }

    pub fn push(&mut self, parameter: impl Parameter + 'static) {
        self.parameters.push(Box::new(parameter));
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

impl Parameter for Sequence {
    fn parse(
        &self,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
    ) -> Result<(), ArgumentParseError> {
        for parameter in &self.parameters {
            parameter.parse(reader, context)?;
        }
        Ok(())
    }

    /// Parses ahead to the parameter under the cursor and completes it.
    ///
    /// A parameter that parses without consuming anything at the end of the
    /// input contributes its completions and lets the next one contribute too.
    fn complete(&self, reader: &mut ArgumentReader, context: &mut ParseContext<'_>) -> Vec<String> {
        let mut completions: IndexSet<String> = IndexSet::new();

        for parameter in &self.parameters {
            let start = reader.state();
            let start_cursor = reader.cursor();
            let checkpoint = context.checkpoint();

            match parameter.parse(reader, context) {
                Ok(()) if reader.has_remaining_tokens() => continue,
                Ok(()) => {
                    let consumed = !reader.input()[start_cursor..reader.cursor()]
                        .trim()
                        .is_empty();
                    if consumed && reader.can_read() {
                        // Token finished with trailing whitespace; the next
                        // parameter is the one being typed.
                        continue;
                    }

                    reader.set_state(start);
                    context.rollback(checkpoint);
                    completions.extend(parameter.complete(reader, context));
                    reader.set_state(start);
                    context.rollback(checkpoint);

                    if consumed {
                        break;
                    }
                }
                Err(_) => {
                    reader.set_state(start);
                    context.rollback(checkpoint);
                    completions.extend(parameter.complete(reader, context));
                    break;
                }
            }
        }

        completions.into_iter().collect()
    }

    fn usage(&self, principal: &dyn Principal) -> String {
        self.parameters
            .iter()
            .map(|parameter| parameter.usage(principal))
            .filter(|usage| !usage.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_optional(&self) -> bool {
        self.parameters.iter().all(|parameter| parameter.is_optional())
    }
}

/// Uses the first alternative that parses.
///
/// Each failed attempt is rolled back before the next. When every
/// alternative fails, the error that got furthest into the input is
/// reported.
#[derive(Default)]
pub struct FirstOf {
    alternatives: Vec<Box<dyn Parameter>>,
}

impl FirstOf {
    pub fn new(alternatives: Vec<Box<dyn Parameter>>) -> Self {
        Self { alternatives }
    }

    pub fn push(&mut self, alternative: impl Parameter + 'static) {
        self.alternatives.push(Box::new(alternative));
    }
}

impl Parameter for FirstOf {
    fn parse(
        &self,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
    ) -> Result<(), ArgumentParseError> {
        let start = reader.state();
        let checkpoint = context.checkpoint();
        let mut best: Option<ArgumentParseError> = None;

        for alternative in &self.alternatives {
            match alternative.parse(reader, context) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    reader.set_state(start);
                    context.rollback(checkpoint);
                    if best.as_ref().map_or(true, |b| err.position > b.position) {
                        best = Some(err);
                    }
                }
            }
        }

        match best {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn complete(&self, reader: &mut ArgumentReader, context: &mut ParseContext<'_>) -> Vec<String> {
        let start = reader.state();
        let checkpoint = context.checkpoint();
        let mut completions: IndexSet<String> = IndexSet::new();

        for alternative in &self.alternatives {
            completions.extend(alternative.complete(reader, context));
            reader.set_state(start);
            context.rollback(checkpoint);
        }

        completions.into_iter().collect()
    }

    fn usage(&self, principal: &dyn Principal) -> String {
        self.alternatives
            .iter()
            .map(|alternative| alternative.usage(principal))
            .filter(|usage| !usage.is_empty())
            .collect::<Vec<_>>()
            .join("|")
    }

    fn is_optional(&self) -> bool {
        self.alternatives.iter().any(|alternative| alternative.is_optional())
    }
}
