use super::context::ParseContext;
use super::key::ParameterKey;
use super::reader::ArgumentReader;
use crate::error::ArgumentParseError;

/// Converts text at the reader's cursor into a typed value.
///
/// A parser advances the reader by exactly the tokens it consumes. `Ok(None)`
/// is a successful parse that records nothing, for syntax that must be present
/// but carries no value the executor cares about.
pub trait ValueParser<T>: Send + Sync {
    fn parse(
        &self,
        key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &ParseContext<'_>,
    ) -> Result<Option<T>, ArgumentParseError>;

    /// Completions for the partially typed token `partial`.
    fn complete(&self, _context: &ParseContext<'_>, _partial: &str) -> Vec<String> {
        Vec::new()
    }

    fn usage(&self, key: &ParameterKey<T>) -> String {
        format!("<{key}>")
    }
}

/// Adapts a closure into a [`ValueParser`] without completions.
pub struct FnParser<F>(F);

pub fn from_fn<F>(f: F) -> FnParser<F> {
    FnParser(f)
}

impl<T, F> ValueParser<T> for FnParser<F>
where
    F: Fn(&mut ArgumentReader, &ParseContext<'_>) -> Result<Option<T>, ArgumentParseError>
        + Send
        + Sync,
{
    fn parse(
        &self,
        _key: &ParameterKey<T>,
        reader: &mut ArgumentReader,
        context: &ParseContext<'_>,
    ) -> Result<Option<T>, ArgumentParseError> {
        (self.0)(reader, context)
    }
}
