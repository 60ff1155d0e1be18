//! Standard value parsers.

use std::time::Duration;

use indexmap::IndexMap;

use super::context::ParseContext;
use super::key::ParameterKey;
use super::reader::ArgumentReader;
use super::value::ValueParser;
use crate::error::ArgumentParseError;

fn starting_with<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    partial: &str,
) -> Vec<String> {
    let partial = partial.to_lowercase();
    candidates
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().starts_with(&partial))
        .map(str::to_string)
        .collect()
}

/// One token, optionally quoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser;

pub fn string() -> StringParser {
    StringParser
}

impl ValueParser<String> for StringParser {
    fn parse(
        &self,
        _key: &ParameterKey<String>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<String>, ArgumentParseError> {
        reader.parse_string().map(Some)
    }
}

/// One whitespace-delimited token, quotes taken literally.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordParser;

pub fn word() -> WordParser {
    WordParser
}

impl ValueParser<String> for WordParser {
    fn parse(
        &self,
        _key: &ParameterKey<String>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<String>, ArgumentParseError> {
        reader.parse_unquoted_string().map(Some)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerParser;

pub fn integer() -> IntegerParser {
    IntegerParser
}

impl ValueParser<i32> for IntegerParser {
    fn parse(
        &self,
        _key: &ParameterKey<i32>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<i32>, ArgumentParseError> {
        reader.parse_int().map(Some)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LongParser;

pub fn long() -> LongParser {
    LongParser
}

impl ValueParser<i64> for LongParser {
    fn parse(
        &self,
        _key: &ParameterKey<i64>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<i64>, ArgumentParseError> {
        reader.parse_long().map(Some)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleParser;

pub fn double() -> DoubleParser {
    DoubleParser
}

impl ValueParser<f64> for DoubleParser {
    fn parse(
        &self,
        _key: &ParameterKey<f64>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<f64>, ArgumentParseError> {
        reader.parse_double().map(Some)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanParser;

pub fn boolean() -> BooleanParser {
    BooleanParser
}

impl ValueParser<bool> for BooleanParser {
    fn parse(
        &self,
        _key: &ParameterKey<bool>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<bool>, ArgumentParseError> {
        reader.parse_bool().map(Some)
    }

    fn complete(&self, _context: &ParseContext<'_>, partial: &str) -> Vec<String> {
        starting_with(["true", "false"], partial)
    }
}

/// An integer within `min..=max`.
#[derive(Debug, Clone, Copy)]
pub struct RangedIntegerParser {
    min: i32,
    max: i32,
}

pub fn ranged_integer(min: i32, max: i32) -> RangedIntegerParser {
    RangedIntegerParser { min, max }
}

impl ValueParser<i32> for RangedIntegerParser {
    fn parse(
        &self,
        _key: &ParameterKey<i32>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<i32>, ArgumentParseError> {
        reader.skip_whitespace();
        let start = reader.state();
        let value = reader.parse_int()?;
        if (self.min..=self.max).contains(&value) {
            Ok(Some(value))
        } else {
            reader.set_state(start);
            Err(reader.error(format!(
                "{value} is not between {} and {}",
                self.min, self.max
            )))
        }
    }

    fn usage(&self, key: &ParameterKey<i32>) -> String {
        format!("<{key}:{}..{}>", self.min, self.max)
    }
}

/// One of a fixed set of case-insensitive names, each mapped to a value.
#[derive(Debug, Clone)]
pub struct ChoicesParser<T> {
    choices: IndexMap<String, T>,
    show_in_usage: bool,
}

/// Builds a choices parser. Names are listed in usage when there are at most
/// five of them.
pub fn choices<T, I, S>(choices: I) -> ChoicesParser<T>
where
    I: IntoIterator<Item = (S, T)>,
    S: Into<String>,
{
    let choices: IndexMap<String, T> = choices
        .into_iter()
        .map(|(name, value)| (name.into(), value))
        .collect();
    let show_in_usage = choices.len() <= 5;
    ChoicesParser {
        choices,
        show_in_usage,
    }
}

impl<T: Clone + Send + Sync> ValueParser<T> for ChoicesParser<T> {
    fn parse(
        &self,
        _key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<T>, ArgumentParseError> {
        reader.skip_whitespace();
        let start = reader.state();
        let token = reader.parse_string()?;
        let wanted = token.to_lowercase();
        match self
            .choices
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
        {
            Some((_, value)) => Ok(Some(value.clone())),
            None => {
                reader.set_state(start);
                let names: Vec<&str> = self.choices.keys().map(String::as_str).collect();
                Err(reader.error(format!(
                    "'{token}' is not a valid choice, expected one of: {}",
                    names.join(", ")
                )))
            }
        }
    }

    fn complete(&self, _context: &ParseContext<'_>, partial: &str) -> Vec<String> {
        starting_with(self.choices.keys().map(String::as_str), partial)
    }

    fn usage(&self, key: &ParameterKey<T>) -> String {
        if self.show_in_usage {
            let names: Vec<&str> = self.choices.keys().map(String::as_str).collect();
            format!("<{}>", names.join("|"))
        } else {
            format!("<{key}>")
        }
    }
}

/// Fixed tokens that must appear in order. Records nothing.
#[derive(Debug, Clone)]
pub struct LiteralParser {
    tokens: Vec<String>,
}

pub fn literal<I, S>(tokens: I) -> LiteralParser
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    LiteralParser {
        tokens: tokens.into_iter().map(Into::into).collect(),
    }
}

impl ValueParser<()> for LiteralParser {
    fn parse(
        &self,
        _key: &ParameterKey<()>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<()>, ArgumentParseError> {
        for expected in &self.tokens {
            reader.skip_whitespace();
            let start = reader.state();
            let token = reader.parse_string()?;
            if !token.eq_ignore_ascii_case(expected) {
                reader.set_state(start);
                return Err(reader.error(format!("Expected '{expected}', found '{token}'")));
            }
        }
        Ok(None)
    }

    fn complete(&self, _context: &ParseContext<'_>, partial: &str) -> Vec<String> {
        self.tokens
            .first()
            .map(|first| starting_with([first.as_str()], partial))
            .unwrap_or_default()
    }

    fn usage(&self, _key: &ParameterKey<()>) -> String {
        self.tokens.join(" ")
    }
}

/// Everything left in the input as one string.
///
/// In raw mode the text is taken verbatim. Otherwise each token is parsed
/// with quote handling and the results are joined with single spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemainingJoinedStringsParser {
    raw: bool,
}

pub fn remaining_joined_strings() -> RemainingJoinedStringsParser {
    RemainingJoinedStringsParser { raw: false }
}

pub fn remaining_raw() -> RemainingJoinedStringsParser {
    RemainingJoinedStringsParser { raw: true }
}

impl ValueParser<String> for RemainingJoinedStringsParser {
    fn parse(
        &self,
        _key: &ParameterKey<String>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<String>, ArgumentParseError> {
        reader.skip_whitespace();
        if !reader.has_remaining_tokens() {
            return Err(reader.error("Expected text, found end of input"));
        }

        if self.raw {
            let text = reader.remaining().trim_end().to_string();
            while reader.read_char().is_some() {}
            return Ok(Some(text));
        }

        let mut parts = Vec::new();
        while reader.has_remaining_tokens() {
            parts.push(reader.parse_string()?);
        }
        Ok(Some(parts.join(" ")))
    }

    fn usage(&self, key: &ParameterKey<String>) -> String {
        format!("<{key}...>")
    }
}

/// A span of time: `7d`, `12h`, `15m`, `30s`, or a plain number of seconds.
/// Fractions are allowed (`1.5h`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationParser;

pub fn duration() -> DurationParser {
    DurationParser
}

/// Parses a duration string such as `7d` or `90`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<u64>() {
        // Plain number, interpret as seconds
        return Some(Duration::from_secs(secs));
    }

    // Try to parse with suffix
    if s.len() < 2 || !s.is_char_boundary(s.len() - 1) {
        return None;
    }

    let (num_part, suffix) = s.split_at(s.len() - 1);
    let num: f64 = num_part.parse().ok()?;
    if !num.is_finite() || num < 0.0 {
        return None;
    }

    let unit = match suffix {
        "d" | "D" => 86_400.0,
        "h" | "H" => 3_600.0,
        "m" | "M" => 60.0,
        "s" | "S" => 1.0,
        _ => return None,
    };
    Duration::try_from_secs_f64(num * unit).ok()
}

impl ValueParser<Duration> for DurationParser {
    fn parse(
        &self,
        _key: &ParameterKey<Duration>,
        reader: &mut ArgumentReader,
        _context: &ParseContext<'_>,
    ) -> Result<Option<Duration>, ArgumentParseError> {
        reader.skip_whitespace();
        let start = reader.state();
        let token = reader.parse_unquoted_string()?;
        match parse_duration(&token) {
            Some(duration) => Ok(Some(duration)),
            None => {
                reader.set_state(start);
                Err(reader.error(format!(
                    "Invalid duration '{token}', expected a number followed by d, h, m or s"
                )))
            }
        }
    }

    fn usage(&self, key: &ParameterKey<Duration>) -> String {
        format!("<{key}:duration>")
    }
}
