//! The command callable capability consumed by the dispatcher.

use std::any::Any;

use super::mapping::CommandMapping;
use super::principal::Principal;
use super::result::CommandResult;
use crate::error::CommandError;

/// Opaque extra context for suggestions (for example, what the principal is
/// looking at). The router passes it through untouched.
pub type TargetContext = dyn Any + Send + Sync;

/// Something that can be registered under one or more aliases.
pub trait CommandCallable: Send + Sync {
    /// Executes the command with the text that followed its alias.
    fn process(
        &self,
        principal: &dyn Principal,
        arguments: &str,
    ) -> Result<CommandResult, CommandError>;

    /// Returns completions for the partially typed `arguments`.
    fn suggestions(
        &self,
        principal: &dyn Principal,
        arguments: &str,
        target: Option<&TargetContext>,
    ) -> Result<Vec<String>, CommandError>;

    /// Whether `principal` may use this command.
    fn test_permission(&self, principal: &dyn Principal) -> bool;

    /// One-line usage, without the command's own alias.
    fn usage(&self, principal: &dyn Principal) -> String;

    /// Short description, if the command has one.
    fn short_description(&self, _principal: &dyn Principal) -> Option<String> {
        None
    }

    /// Longer help text. Defaults to the description followed by the usage.
    fn help(&self, principal: &dyn Principal) -> Option<String> {
        let usage = self.usage(principal);
        match self.short_description(principal) {
            Some(description) if usage.is_empty() => Some(description),
            Some(description) => Some(format!("{description}\n{usage}")),
            None if usage.is_empty() => None,
            None => Some(usage),
        }
    }

    /// Declared subcommands, for tree introspection.
    fn child_mappings(&self) -> Vec<CommandMapping> {
        Vec::new()
    }
}
