//! Transport-agnostic command results.
//!
//! A command reports how much it did and any messages it wants shown. The
//! CLI, or any other front end, decides how to present them.

use serde::Serialize;

/// Outcome of a successfully executed command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Number of successful operations, if the command counts them.
    pub success_count: Option<u32>,
    /// Number of things the command affected, if it counts them.
    pub affected_count: Option<u32>,
    /// Messages produced for the invoking principal.
    pub messages: Vec<String>,
}

impl CommandResult {
    /// A result that reports nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A result with a success count of one.
    pub fn success() -> Self {
        Self::success_count(1)
    }

    /// A result with the given success count.
    pub fn success_count(count: u32) -> Self {
        Self {
            success_count: Some(count),
            ..Self::default()
        }
    }

    /// Sets the affected count.
    pub fn with_affected(self, count: u32) -> Self {
        Self {
            affected_count: Some(count),
            ..self
        }
    }

    /// Appends a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Whether the command reported at least one success.
    pub fn is_success(&self) -> bool {
        self.success_count.is_some_and(|count| count > 0)
    }
}
