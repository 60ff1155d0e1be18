//! Integration tests for cmdroute, exercising the public API only.

pub mod builtin_test;
pub mod dispatcher_test;
pub mod parsing_test;

use std::sync::Arc;

use cmdroute::commands::{CommandCallable, CommandResult, Principal, TargetContext};
use cmdroute::error::CommandError;
use parking_lot::Mutex;

/// Records the argument strings it receives and answers with them.
#[derive(Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<String>>,
    pub permission: Option<String>,
}

impl Recorder {
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requiring(node: &str) -> Arc<Self> {
        Arc::new(Self {
            permission: Some(node.to_string()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl CommandCallable for Recorder {
    fn process(
        &self,
        _principal: &dyn Principal,
        arguments: &str,
    ) -> Result<CommandResult, CommandError> {
        self.calls.lock().push(arguments.to_string());
        Ok(CommandResult::success().with_message(arguments))
    }

    fn suggestions(
        &self,
        _principal: &dyn Principal,
        _arguments: &str,
        _target: Option<&TargetContext>,
    ) -> Result<Vec<String>, CommandError> {
        Ok(Vec::new())
    }

    fn test_permission(&self, principal: &dyn Principal) -> bool {
        self.permission
            .as_deref()
            .map_or(true, |node| principal.has_permission(node))
    }

    fn usage(&self, _principal: &dyn Principal) -> String {
        "<args...>".to_string()
    }
}
