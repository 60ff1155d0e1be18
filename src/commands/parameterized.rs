//! A command assembled from flags, parameters, child commands and an executor.

use std::sync::Arc;

use tracing::debug;

use super::callable::{CommandCallable, TargetContext};
use super::dispatcher::{split_head, Dispatcher};
use super::mapping::CommandMapping;
use super::principal::Principal;
use super::result::CommandResult;
use crate::error::{ArgumentParseError, BuildError, CommandError};
use crate::parameter::{
    ArgumentReader, Flag, Flags, Parameter, ParseContext, Sequence, UnknownFlagBehavior,
};

/// Runs a command once its arguments have been parsed.
pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        principal: &dyn Principal,
        context: &ParseContext<'_>,
    ) -> Result<CommandResult, CommandError>;
}

impl<F> CommandExecutor for F
where
    F: Fn(&dyn Principal, &ParseContext<'_>) -> Result<CommandResult, CommandError> + Send + Sync,
{
    fn execute(
        &self,
        principal: &dyn Principal,
        context: &ParseContext<'_>,
    ) -> Result<CommandResult, CommandError> {
        self(principal, context)
    }
}

/// A [`CommandCallable`] that parses its own arguments.
///
/// When child commands are present the first token is tried against them
/// first. If it names no child, the command's own flags and parameters are
/// parsed, provided it has an executor.
pub struct ParameterizedCommand {
    permission: Option<String>,
    description: Option<String>,
    extended_description: Option<String>,
    flags: Flags,
    parameters: Sequence,
    children: Dispatcher,
    executor: Option<Arc<dyn CommandExecutor>>,
}

impl ParameterizedCommand {
    pub fn builder() -> CommandBuilder {
        CommandBuilder::default()
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn children(&self) -> &Dispatcher {
        &self.children
    }

    /// Parses `arguments` into a fresh context without executing anything.
    pub fn parse<'p>(
        &self,
        principal: &'p dyn Principal,
        arguments: &str,
    ) -> Result<ParseContext<'p>, ArgumentParseError> {
        let mut reader = ArgumentReader::new(arguments);
        let mut context = ParseContext::new(principal);
        self.flags.parse(&mut reader, &mut context)?;
        self.parameters.parse(&mut reader, &mut context)?;
        if reader.has_remaining_tokens() {
            reader.skip_whitespace();
            return Err(reader.error("Too many arguments!"));
        }
        Ok(context)
    }

    fn own_usage(&self, principal: &dyn Principal) -> String {
        [self.flags.usage(principal), self.parameters.usage(principal)]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn own_suggestions(&self, principal: &dyn Principal, arguments: &str) -> Vec<String> {
        let mut reader = ArgumentReader::new(arguments);
        let mut context = ParseContext::new(principal);
        if let Some(completions) = self.flags.complete(&mut reader, &mut context) {
            return completions;
        }
        self.parameters.complete(&mut reader, &mut context)
    }
}

impl CommandCallable for ParameterizedCommand {
    fn process(
        &self,
        principal: &dyn Principal,
        arguments: &str,
    ) -> Result<CommandResult, CommandError> {
        if !self.test_permission(principal) {
            return Err(CommandError::PermissionDenied);
        }

        if !self.children.is_empty() {
            let (head, rest) = split_head(arguments);
            if let Some(child) = self.children.get(head, Some(principal)) {
                debug!(child = child.primary_alias(), "Routing to child command");
                return child
                    .callable()
                    .process(principal, rest.unwrap_or_default())
                    .map_err(|e| e.within(head));
            }
            if self.executor.is_none() {
                return Err(if head.is_empty() {
                    CommandError::execution(format!("Usage: {}", self.usage(principal)))
                } else {
                    CommandError::NotFound {
                        alias: head.to_string(),
                    }
                });
            }
        }

        let Some(executor) = &self.executor else {
            return Err(CommandError::execution("This command has nothing to run"));
        };
        let context = self.parse(principal, arguments)?;
        executor.execute(principal, &context)
    }

    fn suggestions(
        &self,
        principal: &dyn Principal,
        arguments: &str,
        target: Option<&TargetContext>,
    ) -> Result<Vec<String>, CommandError> {
        if !self.test_permission(principal) {
            return Ok(Vec::new());
        }

        let mut suggestions = Vec::new();
        if !self.children.is_empty() {
            let (head, rest) = split_head(arguments);
            match rest {
                None => suggestions.extend(self.children.suggestions(principal, arguments, target)?),
                Some(rest) => {
                    if let Some(child) = self.children.get(head, Some(principal)) {
                        return child.callable().suggestions(principal, rest, target);
                    }
                }
            }
        }

        if self.executor.is_some() {
            for suggestion in self.own_suggestions(principal, arguments) {
                if !suggestions.contains(&suggestion) {
                    suggestions.push(suggestion);
                }
            }
        }
        Ok(suggestions)
    }

    fn test_permission(&self, principal: &dyn Principal) -> bool {
        self.permission
            .as_deref()
            .map_or(true, |node| principal.has_permission(node))
    }

    fn usage(&self, principal: &dyn Principal) -> String {
        let children = self.children.usage(principal);
        let own = if self.executor.is_some() {
            self.own_usage(principal)
        } else {
            String::new()
        };
        match (children.is_empty(), own.is_empty()) {
            (true, _) => own,
            (false, true) => children,
            (false, false) => format!("{children}|{own}"),
        }
    }

    fn short_description(&self, _principal: &dyn Principal) -> Option<String> {
        self.description.clone()
    }

    fn help(&self, principal: &dyn Principal) -> Option<String> {
        let mut lines = Vec::new();
        if let Some(description) = &self.description {
            lines.push(description.clone());
        }
        let usage = self.usage(principal);
        if !usage.is_empty() {
            lines.push(format!("Usage: {usage}"));
        }
        if let Some(extended) = &self.extended_description {
            lines.push(extended.clone());
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    fn child_mappings(&self) -> Vec<CommandMapping> {
        self.children.commands().into_iter().collect()
    }
}

/// Accumulates a [`ParameterizedCommand`].
#[derive(Default)]
pub struct CommandBuilder {
    permission: Option<String>,
    description: Option<String>,
    extended_description: Option<String>,
    flags: Vec<Flag>,
    unknown_flags: UnknownFlagBehavior,
    parameters: Vec<Box<dyn Parameter>>,
    children: Vec<(Arc<dyn CommandCallable>, Vec<String>)>,
    executor: Option<Arc<dyn CommandExecutor>>,
}

impl CommandBuilder {
    pub fn permission(mut self, node: impl Into<String>) -> Self {
        self.permission = Some(node.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn extended_description(mut self, description: impl Into<String>) -> Self {
        self.extended_description = Some(description.into());
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn unknown_flags(mut self, behavior: UnknownFlagBehavior) -> Self {
        self.unknown_flags = behavior;
        self
    }

    pub fn parameter(mut self, parameter: impl Parameter + 'static) -> Self {
        self.parameters.push(Box::new(parameter));
        self
    }

    pub fn child<S: AsRef<str>>(mut self, callable: Arc<dyn CommandCallable>, aliases: &[S]) -> Self {
        let aliases = aliases.iter().map(|a| a.as_ref().to_string()).collect();
        self.children.push((callable, aliases));
        self
    }

    pub fn executor<F>(self, executor: F) -> Self
    where
        F: Fn(&dyn Principal, &ParseContext<'_>) -> Result<CommandResult, CommandError>
            + Send
            + Sync
            + 'static,
    {
        self.executor_arc(Arc::new(executor))
    }

    /// Uses an executor that is shared or implemented as a type.
    pub fn executor_arc(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn build(self) -> Result<ParameterizedCommand, BuildError> {
        if self.executor.is_none() && self.children.is_empty() {
            return Err(BuildError::MissingExecutor);
        }

        let children = Dispatcher::new();
        for (callable, aliases) in self.children {
            children.register(callable, aliases.as_slice())?;
        }

        Ok(ParameterizedCommand {
            permission: self.permission,
            description: self.description,
            extended_description: self.extended_description,
            flags: Flags::new(self.flags).with_unknown_behavior(self.unknown_flags),
            parameters: Sequence::new(self.parameters),
            children,
            executor: self.executor,
        })
    }
}
