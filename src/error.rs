//! Error types for cmdroute.
//!
//! Parse failures and resolution failures are ordinary values that callers
//! translate into user-facing messages. Builder misuse is reported through
//! [`BuildError`] at the point the misuse happens.

use serde::Serialize;
use thiserror::Error;

/// Raised when the remaining input cannot produce a value for a parameter.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ArgumentParseError {
    /// Human-readable reason.
    pub message: String,
    /// The full argument string that was being parsed.
    pub input: String,
    /// Byte offset of the reader cursor when parsing failed.
    pub position: usize,
}

impl ArgumentParseError {
    /// Creates a new parse error anchored at `position` within `input`.
    pub fn new(message: impl Into<String>, input: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            input: input.into(),
            position,
        }
    }

    /// Renders the message followed by the input and a caret under the failing position.
    pub fn annotated(&self) -> String {
        let mut end = self.position.min(self.input.len());
        while !self.input.is_char_boundary(end) {
            end -= 1;
        }
        let caret_offset = self.input[..end].chars().count();
        format!(
            "{}\n{}\n{}^",
            self.message,
            self.input,
            " ".repeat(caret_offset)
        )
    }
}

/// Failure while routing or executing a command.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CommandError {
    /// The head token matched no registered alias.
    #[error("Unknown command: {alias}")]
    NotFound { alias: String },

    /// A resolved command could not resolve one of its child commands.
    ///
    /// `parent` accumulates the alias path as the error bubbles outwards.
    #[error("No such child command: {child} (in {parent})")]
    ChildNotFound { parent: String, child: String },

    /// The principal may not run this command.
    #[error("You do not have permission to use this command")]
    PermissionDenied,

    /// Argument parsing failed.
    #[error(transparent)]
    Parse(#[from] ArgumentParseError),

    /// The command ran but reported a failure.
    #[error("{0}")]
    Execution(String),
}

impl CommandError {
    /// Creates an execution error with the given message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Re-wraps a failure returned by the callable resolved under `alias`.
    ///
    /// A bare `NotFound` from the delegate becomes a `ChildNotFound` rooted at
    /// `alias`; an existing `ChildNotFound` gains `alias` as its outermost
    /// path segment. Everything else passes through untouched.
    pub fn within(self, alias: &str) -> Self {
        match self {
            Self::NotFound { alias: child } => Self::ChildNotFound {
                parent: alias.to_string(),
                child,
            },
            Self::ChildNotFound { parent, child } => Self::ChildNotFound {
                parent: format!("{alias} {parent}"),
                child,
            },
            other => other,
        }
    }

    /// Returns the unresolved token, if this is a resolution failure.
    pub fn unresolved(&self) -> Option<&str> {
        match self {
            Self::NotFound { alias } => Some(alias),
            Self::ChildNotFound { child, .. } => Some(child),
            _ => None,
        }
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "Unknown Command",
            Self::ChildNotFound { .. } => "Unknown Subcommand",
            Self::PermissionDenied => "Permission Error",
            Self::Parse(_) => "Parse Error",
            Self::Execution(_) => "Command Error",
        }
    }
}

/// Misuse of a builder or registration API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A flag was built without any alias.
    #[error("at least one alias is required")]
    MissingAlias,

    /// A parameter was built without a key.
    #[error("a parameter key is required")]
    MissingKey,

    /// A parameter was built without a value parser.
    #[error("a value parser is required")]
    MissingParser,

    /// A command was built with neither an executor nor child commands.
    #[error("an executor is required when no child commands are given")]
    MissingExecutor,

    /// An alias was empty or contained whitespace or a leading dash.
    #[error("invalid alias: {0:?}")]
    InvalidAlias(String),

    /// A registration filter returned an alias that was never requested.
    #[error("filter returned alias {0:?} that was not requested")]
    UnrequestedAlias(String),

    /// A modifier with this name is already part of the chain.
    #[error("modifier {0:?} is already present in the chain")]
    DuplicateModifier(String),

    /// An insertion anchor named a modifier that is not in the chain.
    #[error("modifier {0:?} is not present in the chain")]
    UnknownModifier(String),
}

/// Application-level error used by configuration loading and the binary.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (invalid config file, unknown values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command routing or execution errors.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Builder or registration misuse.
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
}

impl Error {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Command(e) => e.category(),
            Self::Build(_) => "Build Error",
        }
    }
}

/// Result type alias using the application error.
pub type Result<T> = std::result::Result<T, Error>;
