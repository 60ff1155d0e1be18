//! Dash-prefixed switches recognised at the start of a command's arguments.
//!
//! Single-character aliases are written `-a` and may be combined (`-aq`).
//! Longer aliases are written `--all`, match case-insensitively, and may carry
//! an inline value (`--speed=5`). Scanning stops at the first token that is
//! not a flag, at `--`, or at a flag the principal may not use.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::context::ParseContext;
use super::parameter::Parameter;
use super::reader::{ArgumentReader, ReaderState};
use crate::commands::Principal;
use crate::error::{ArgumentParseError, BuildError};

type Requirement = Arc<dyn Fn(&dyn Principal) -> bool + Send + Sync>;

/// A switch with one or more aliases and an optional value parameter.
pub struct Flag {
    aliases: Arc<[String]>,
    prefixed: Vec<String>,
    requirement: Option<Requirement>,
    parameter: Option<Box<dyn Parameter>>,
}

impl Flag {
    pub fn builder() -> FlagBuilder {
        FlagBuilder::default()
    }

    /// Aliases as given, without dashes.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Aliases as typed: `-a` for one character, `--all` otherwise.
    pub fn prefixed_aliases(&self) -> &[String] {
        &self.prefixed
    }

    pub fn parameter(&self) -> Option<&dyn Parameter> {
        self.parameter.as_deref()
    }

    pub fn is_permitted(&self, principal: &dyn Principal) -> bool {
        self.requirement
            .as_ref()
            .map_or(true, |requirement| requirement(principal))
    }

    fn matches_long(&self, name: &str) -> bool {
        self.aliases
            .iter()
            .any(|alias| alias.chars().count() > 1 && alias.eq_ignore_ascii_case(name))
    }

    fn matches_short(&self, c: char) -> bool {
        self.aliases
            .iter()
            .any(|alias| alias.chars().eq(std::iter::once(c)))
    }

    /// `[-a|--all <value>]`, or an empty string when not permitted.
    pub fn usage(&self, principal: &dyn Principal) -> String {
        if !self.is_permitted(principal) {
            return String::new();
        }
        let names = self.prefixed.join("|");
        match self.parameter.as_ref().map(|p| p.usage(principal)) {
            Some(value) if !value.is_empty() => format!("[{names} {value}]"),
            _ => format!("[{names}]"),
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("aliases", &self.prefixed)
            .field("has_parameter", &self.parameter.is_some())
            .finish_non_exhaustive()
    }
}

/// Accumulates a [`Flag`].
#[derive(Default)]
pub struct FlagBuilder {
    aliases: Vec<String>,
    requirement: Option<Requirement>,
    parameter: Option<Box<dyn Parameter>>,
}

impl FlagBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Only principals for which `requirement` holds may use the flag.
    pub fn requirement(mut self, requirement: impl Fn(&dyn Principal) -> bool + Send + Sync + 'static) -> Self {
        self.requirement = Some(Arc::new(requirement));
        self
    }

    /// Only principals holding `node` may use the flag.
    pub fn permission(self, node: impl Into<String>) -> Self {
        let node = node.into();
        self.requirement(move |principal| principal.has_permission(&node))
    }

    /// A value parsed from the token after the flag, or from `--flag=value`.
    pub fn parameter(mut self, parameter: impl Parameter + 'static) -> Self {
        self.parameter = Some(Box::new(parameter));
        self
    }

    pub fn build(self) -> Result<Flag, BuildError> {
        if self.aliases.is_empty() {
            return Err(BuildError::MissingAlias);
        }

        let mut aliases: Vec<String> = Vec::with_capacity(self.aliases.len());
        for alias in self.aliases {
            if alias.is_empty()
                || alias.starts_with('-')
                || alias.contains('=')
                || alias.chars().any(char::is_whitespace)
            {
                return Err(BuildError::InvalidAlias(alias));
            }
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        let prefixed = aliases
            .iter()
            .map(|alias| {
                if alias.chars().count() == 1 {
                    format!("-{alias}")
                } else {
                    format!("--{alias}")
                }
            })
            .collect();

        Ok(Flag {
            aliases: Arc::from(aliases),
            prefixed,
            requirement: self.requirement,
            parameter: self.parameter,
        })
    }
}

/// What to do with a dash-prefixed token that names no known flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownFlagBehavior {
    /// Stop scanning and leave the token for positional parameters.
    #[default]
    Stop,
    /// Fail the parse.
    Error,
}

enum Scan {
    Flag,
    Stop,
    Complete(Vec<String>),
}

/// The flags of one command, parsed as a region before its parameters.
#[derive(Default)]
pub struct Flags {
    flags: Vec<Flag>,
    unknown: UnknownFlagBehavior,
}

impl Flags {
    pub fn new(flags: Vec<Flag>) -> Self {
        Self {
            flags,
            unknown: UnknownFlagBehavior::default(),
        }
    }

    pub fn with_unknown_behavior(mut self, behavior: UnknownFlagBehavior) -> Self {
        self.unknown = behavior;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// Consumes the flag region.
    pub fn parse(
        &self,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
    ) -> Result<(), ArgumentParseError> {
        if self.flags.is_empty() {
            return Ok(());
        }
        loop {
            match self.scan(reader, context, false)? {
                Scan::Flag => continue,
                Scan::Stop | Scan::Complete(_) => return Ok(()),
            }
        }
    }

    /// Completions when the cursor is inside the flag region, `None` when
    /// positional parameters should complete instead. The reader is left
    /// after the flag region in that case.
    pub fn complete(
        &self,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
    ) -> Option<Vec<String>> {
        if self.flags.is_empty() {
            return None;
        }
        loop {
            match self.scan(reader, context, true) {
                Ok(Scan::Flag) => continue,
                Ok(Scan::Complete(completions)) => return Some(completions),
                Ok(Scan::Stop) | Err(_) => return None,
            }
        }
    }

    pub fn usage(&self, principal: &dyn Principal) -> String {
        self.flags
            .iter()
            .map(|flag| flag.usage(principal))
            .filter(|usage| !usage.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn permitted_long(&self, name: &str, principal: &dyn Principal) -> Option<&Flag> {
        self.flags
            .iter()
            .find(|flag| flag.matches_long(name))
            .filter(|flag| flag.is_permitted(principal))
    }

    fn permitted_short(&self, c: char, principal: &dyn Principal) -> Option<&Flag> {
        self.flags
            .iter()
            .find(|flag| flag.matches_short(c))
            .filter(|flag| flag.is_permitted(principal))
    }

    fn candidates(&self, partial: &str, principal: &dyn Principal) -> Vec<String> {
        let partial = partial.to_lowercase();
        self.flags
            .iter()
            .filter(|flag| flag.is_permitted(principal))
            .flat_map(|flag| flag.prefixed.iter())
            .filter(|alias| alias.to_lowercase().starts_with(&partial))
            .cloned()
            .collect()
    }

    /// Handles one token of the flag region.
    fn scan(
        &self,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        completing: bool,
    ) -> Result<Scan, ArgumentParseError> {
        let start = reader.state();
        reader.skip_whitespace();
        let remaining = reader.remaining();

        if completing && remaining == "-" {
            return Ok(Scan::Complete(self.candidates("-", context.principal())));
        }
        if !looks_like_flag(remaining) {
            reader.set_state(start);
            return Ok(Scan::Stop);
        }

        let token_len = remaining
            .find(char::is_whitespace)
            .unwrap_or(remaining.len());
        let token = remaining[..token_len].to_string();
        let is_last_token = token_len == remaining.len();

        if token == "--" {
            if completing && is_last_token {
                return Ok(Scan::Complete(self.candidates(&token, context.principal())));
            }
            reader.parse_unquoted_string()?;
            return Ok(Scan::Stop);
        }

        if let Some(long) = token.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (long, None),
            };

            let Some(flag) = self.permitted_long(name, context.principal()) else {
                if completing && is_last_token {
                    return Ok(Scan::Complete(self.candidates(&token, context.principal())));
                }
                return self.unknown(reader, start, name, &token);
            };

            if completing && is_last_token {
                return Ok(Scan::Complete(match (&inline, flag.parameter()) {
                    (Some(value), Some(parameter)) => {
                        let prefix = format!("--{name}=");
                        let mut value_reader = ArgumentReader::new(value.as_str());
                        parameter
                            .complete(&mut value_reader, context)
                            .into_iter()
                            .map(|completion| format!("{prefix}{completion}"))
                            .collect()
                    }
                    (Some(_), None) => Vec::new(),
                    (None, _) => self.candidates(&token, context.principal()),
                }));
            }

            reader.parse_unquoted_string()?;
            trace!(flag = name, "Flag given");
            context.record_flag(flag.aliases.clone());
            return self.flag_value(flag, inline, reader, context, completing);
        }

        // Short flags, possibly combined.
        let letters: Vec<char> = token.chars().skip(1).collect();
        let mut matched = Vec::with_capacity(letters.len());
        for &c in &letters {
            match self.permitted_short(c, context.principal()) {
                Some(flag) => matched.push(flag),
                None => {
                    if completing && is_last_token {
                        return Ok(Scan::Complete(self.candidates(&token, context.principal())));
                    }
                    return self.unknown(reader, start, &c.to_string(), &token);
                }
            }
        }

        if completing && is_last_token {
            return Ok(Scan::Complete(self.candidates(&token, context.principal())));
        }

        reader.parse_unquoted_string()?;
        let last = matched.len().saturating_sub(1);
        for (index, flag) in matched.iter().enumerate() {
            if index != last && flag.parameter.is_some() {
                reader.set_state(start);
                reader.skip_whitespace();
                return Err(reader.error(format!(
                    "Flag -{} takes a value and must come last in '{token}'",
                    letters[index]
                )));
            }
            trace!(flag = %letters[index], "Flag given");
            context.record_flag(flag.aliases.clone());
        }

        match matched.last() {
            Some(flag) => self.flag_value(flag, None, reader, context, completing),
            None => Ok(Scan::Flag),
        }
    }

    /// Parses the value of `flag` if it takes one.
    fn flag_value(
        &self,
        flag: &Flag,
        inline: Option<String>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        completing: bool,
    ) -> Result<Scan, ArgumentParseError> {
        let Some(parameter) = flag.parameter() else {
            if inline.is_some() {
                return Err(reader.error(format!(
                    "Flag {} does not take a value",
                    flag.prefixed.join("|")
                )));
            }
            return Ok(Scan::Flag);
        };

        if let Some(value) = inline {
            let mut value_reader = ArgumentReader::new(value);
            parameter.parse(&mut value_reader, context)?;
            if value_reader.has_remaining_tokens() {
                return Err(value_reader.error("Too many arguments for flag"));
            }
            return Ok(Scan::Flag);
        }

        if completing {
            let before = reader.state();
            reader.skip_whitespace();
            let typing = !reader.remaining().contains(char::is_whitespace);
            reader.set_state(before);
            if typing {
                return Ok(Scan::Complete(parameter.complete(reader, context)));
            }
        }

        if !parameter.is_optional() {
            parameter.parse(reader, context)?;
            return Ok(Scan::Flag);
        }

        // An absent optional value leaves the following tokens to flags and
        // positionals alike.
        let before = reader.state();
        let checkpoint = context.checkpoint();
        reader.skip_whitespace();
        let next_is_flag = looks_like_flag(reader.remaining());
        reader.set_state(before);
        if !next_is_flag {
            match parameter.parse(reader, context) {
                Ok(()) => return Ok(Scan::Flag),
                Err(e) => {
                    trace!(flag = %flag.prefixed.join("|"), error = %e, "Optional flag value absent");
                    reader.set_state(before);
                    context.rollback(checkpoint);
                }
            }
        }

        // Nothing follows for the value, so any default is recorded.
        parameter.parse(&mut ArgumentReader::new(""), context)?;
        Ok(Scan::Flag)
    }

    fn unknown(
        &self,
        reader: &mut ArgumentReader,
        start: ReaderState,
        name: &str,
        token: &str,
    ) -> Result<Scan, ArgumentParseError> {
        let known = self.flags.iter().any(|flag| {
            flag.matches_long(name) || name.chars().count() == 1 && name.chars().all(|c| flag.matches_short(c))
        });
        reader.set_state(start);

        // Flags withheld from this principal read as positional text.
        if known || self.unknown == UnknownFlagBehavior::Stop {
            return Ok(Scan::Stop);
        }
        reader.skip_whitespace();
        Err(reader.error(format!("Unknown flag {token}")))
    }
}

/// `-x...` where `x` is not a digit, or `--...`.
fn looks_like_flag(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some('-'), Some(c)) => c == '-' || !(c.is_ascii_digit() || c == '.' || c.is_whitespace()),
        _ => false,
    }
}
