//! Test doubles shared by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use super::callable::{CommandCallable, TargetContext};
use super::principal::Principal;
use super::result::CommandResult;
use crate::error::CommandError;

/// A callable that records every argument string it is asked to process.
#[derive(Default)]
pub struct RecordingCommand {
    calls: Mutex<Vec<String>>,
    permission: Option<String>,
    failure: Option<CommandError>,
    suggestions: Vec<String>,
    description: Option<String>,
}

impl RecordingCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<dyn CommandCallable> {
        Arc::new(Self::new())
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permission = Some(permission.to_string());
        self
    }

    pub fn failing(mut self, failure: CommandError) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn with_suggestions(mut self, suggestions: &[&str]) -> Self {
        self.suggestions = suggestions.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl CommandCallable for RecordingCommand {
    fn process(
        &self,
        _principal: &dyn Principal,
        arguments: &str,
    ) -> Result<CommandResult, CommandError> {
        self.calls.lock().push(arguments.to_string());
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(CommandResult::success()),
        }
    }

    fn suggestions(
        &self,
        _principal: &dyn Principal,
        arguments: &str,
        _target: Option<&TargetContext>,
    ) -> Result<Vec<String>, CommandError> {
        Ok(self
            .suggestions
            .iter()
            .filter(|s| s.starts_with(arguments))
            .cloned()
            .collect())
    }

    fn test_permission(&self, principal: &dyn Principal) -> bool {
        self.permission
            .as_deref()
            .map_or(true, |permission| principal.has_permission(permission))
    }

    fn usage(&self, _principal: &dyn Principal) -> String {
        "<args>".to_string()
    }

    fn short_description(&self, _principal: &dyn Principal) -> Option<String> {
        self.description.clone()
    }
}
