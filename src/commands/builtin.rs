//! Demonstration commands registered by the `cmdroute` binary.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use super::callable::CommandCallable;
use super::dispatcher::Dispatcher;
use super::mapping::CommandMapping;
use super::parameterized::ParameterizedCommand;
use super::principal::Principal;
use super::result::CommandResult;
use crate::error::{BuildError, CommandError};
use crate::parameter::parsers::{duration, integer, ranged_integer, remaining_joined_strings, word};
use crate::parameter::{value, Flag, ParameterKey};

/// Permission nodes granted per player by the `perm` command.
pub type PermissionStore = Arc<Mutex<BTreeMap<String, BTreeSet<String>>>>;

/// Renders a duration as `1d 2h 3m 4s`, leaving out zero parts.
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    let mut parts = Vec::new();
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60)] {
        if secs >= size {
            parts.push(format!("{}{unit}", secs / size));
            secs %= size;
        }
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }
    parts.join(" ")
}

fn teleport() -> Result<ParameterizedCommand, BuildError> {
    let target = ParameterKey::<String>::new("target");
    let destination = ParameterKey::<String>::new("destination");

    ParameterizedCommand::builder()
        .permission("cmdroute.tp")
        .description("Teleport a player, or yourself, to another player")
        .flag(Flag::builder().aliases(["s", "silent"]).build()?)
        .parameter(value("target", word()).build()?)
        .parameter(value("destination", word()).optional().build()?)
        .executor(move |principal, context| {
            let target = context.require_one(&target)?;
            let message = match context.one(&destination) {
                Some(destination) => format!("Teleported {target} to {destination}"),
                None => format!("Teleported {} to {target}", principal.identifier()),
            };
            let result = CommandResult::success();
            Ok(if context.has_flag("silent") {
                result
            } else {
                result.with_message(message)
            })
        })
        .build()
}

fn echo() -> Result<ParameterizedCommand, BuildError> {
    let times = ParameterKey::<i32>::new("times");
    let message = ParameterKey::<String>::new("message");

    ParameterizedCommand::builder()
        .description("Repeat a message")
        .flag(
            Flag::builder()
                .aliases(["n", "times"])
                .parameter(value("times", ranged_integer(1, 10)).build()?)
                .build()?,
        )
        .flag(Flag::builder().aliases(["u", "upper"]).build()?)
        .parameter(value("message", remaining_joined_strings()).build()?)
        .executor(move |_, context| {
            let message = context.require_one(&message)?;
            let message = if context.has_flag("upper") {
                message.to_uppercase()
            } else {
                message.clone()
            };
            let count = context.all(&times).last().map_or(1, |n| **n);
            let result = (0..count).fold(CommandResult::success_count(count as u32), |result, _| {
                result.with_message(message.clone())
            });
            Ok(result)
        })
        .build()
}

fn sum() -> Result<ParameterizedCommand, BuildError> {
    let numbers = ParameterKey::<i32>::new("numbers");

    ParameterizedCommand::builder()
        .description("Add up numbers")
        .parameter(value("numbers", integer()).all_of().build()?)
        .executor(move |_, context| {
            let values = context.all(&numbers);
            if values.is_empty() {
                return Err(CommandError::execution("Nothing to add"));
            }
            let total: i64 = values.iter().map(|n| i64::from(**n)).sum();
            Ok(CommandResult::success()
                .with_affected(values.len() as u32)
                .with_message(format!("Sum: {total}")))
        })
        .build()
}

fn remind() -> Result<ParameterizedCommand, BuildError> {
    let delay = ParameterKey::<Duration>::new("delay");
    let message = ParameterKey::<String>::new("message");

    ParameterizedCommand::builder()
        .description("Schedule a reminder")
        .extended_description("Delays are written 7d, 12h, 15m, 30s or as plain seconds.")
        .parameter(value("delay", duration()).build()?)
        .parameter(value("message", remaining_joined_strings()).build()?)
        .executor(move |_, context| {
            let delay = context.require_one(&delay)?;
            let message = context.require_one(&message)?;
            Ok(CommandResult::success().with_message(format!(
                "Reminder in {}: {message}",
                format_duration(*delay)
            )))
        })
        .build()
}

fn perm(store: PermissionStore) -> Result<ParameterizedCommand, BuildError> {
    let player = ParameterKey::<String>::new("player");
    let node = ParameterKey::<String>::new("node");

    let add = {
        let store = store.clone();
        let (player, node) = (player.clone(), node.clone());
        ParameterizedCommand::builder()
            .description("Grant a permission node")
            .parameter(value("player", word()).build()?)
            .parameter(value("node", word()).map(|n| n.to_lowercase()).build()?)
            .executor(move |_, context| {
                let player = context.require_one(&player)?;
                let node = context.require_one(&node)?;
                let added = store
                    .lock()
                    .entry(player.clone())
                    .or_default()
                    .insert(node.clone());
                let result = CommandResult::success().with_affected(u32::from(added));
                Ok(if added {
                    result.with_message(format!("Granted {node} to {player}"))
                } else {
                    result.with_message(format!("{player} already has {node}"))
                })
            })
            .build()?
    };

    let remove = {
        let store = store.clone();
        let (player, node) = (player.clone(), node.clone());
        ParameterizedCommand::builder()
            .description("Revoke a permission node")
            .parameter(value("player", word()).build()?)
            .parameter(value("node", word()).map(|n| n.to_lowercase()).build()?)
            .executor(move |_, context| {
                let player = context.require_one(&player)?;
                let node = context.require_one(&node)?;
                let removed = store
                    .lock()
                    .get_mut(player)
                    .is_some_and(|nodes| nodes.remove(node));
                if !removed {
                    return Err(CommandError::execution(format!(
                        "{player} does not have {node}"
                    )));
                }
                Ok(CommandResult::success().with_message(format!("Revoked {node} from {player}")))
            })
            .build()?
    };

    let list = ParameterizedCommand::builder()
        .description("List a player's permission nodes")
        .parameter(value("player", word()).build()?)
        .executor(move |_, context| {
            let player = context.require_one(&player)?;
            let nodes: Vec<String> = store
                .lock()
                .get(player)
                .map(|nodes| nodes.iter().cloned().collect())
                .unwrap_or_default();
            let message = if nodes.is_empty() {
                format!("{player} has no permission nodes")
            } else {
                format!("{player}: {}", nodes.join(", "))
            };
            Ok(CommandResult::success_count(nodes.len() as u32).with_message(message))
        })
        .build()?;

    ParameterizedCommand::builder()
        .permission("cmdroute.perm")
        .description("Manage permission nodes")
        .child(Arc::new(add), &["add", "grant"])
        .child(Arc::new(remove), &["remove", "revoke"])
        .child(Arc::new(list), &["list"])
        .build()
}

/// Registers the demonstration commands on `dispatcher`.
///
/// Aliases in `extra_aliases`, keyed by primary alias, are requested in
/// addition to the defaults. Aliases already held by another command are
/// skipped.
pub fn register_builtins(
    dispatcher: &Dispatcher,
    extra_aliases: &BTreeMap<String, Vec<String>>,
    store: PermissionStore,
) -> Result<Vec<CommandMapping>, BuildError> {
    let commands: [(&[&str], Arc<dyn CommandCallable>); 5] = [
        (&["tp", "teleport"][..], Arc::new(teleport()?) as Arc<dyn CommandCallable>),
        (&["echo", "say"][..], Arc::new(echo()?) as Arc<dyn CommandCallable>),
        (&["sum", "add"][..], Arc::new(sum()?) as Arc<dyn CommandCallable>),
        (&["remind"][..], Arc::new(remind()?) as Arc<dyn CommandCallable>),
        (&["perm", "permission"][..], Arc::new(perm(store)?) as Arc<dyn CommandCallable>),
    ];

    let mut mappings = Vec::with_capacity(commands.len());
    for (defaults, callable) in commands {
        let mut aliases: Vec<String> = defaults.iter().map(|a| a.to_string()).collect();
        if let Some(extra) = defaults.first().and_then(|primary| extra_aliases.get(*primary)) {
            aliases.extend(extra.iter().cloned());
        }

        match dispatcher.register_unclaimed(callable, aliases.as_slice())? {
            Some(mapping) => mappings.push(mapping),
            None => warn!(aliases = ?aliases, "Every alias is already taken, skipping command"),
        }
    }
    Ok(mappings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::principal::SimplePrincipal;
    use pretty_assertions::assert_eq;

    fn setup() -> (Dispatcher, PermissionStore) {
        let dispatcher = Dispatcher::new();
        let store = PermissionStore::default();
        let mut extra = BTreeMap::new();
        extra.insert("tp".to_string(), vec!["warp".to_string(), "say".to_string()]);
        register_builtins(&dispatcher, &extra, store.clone()).unwrap();
        (dispatcher, store)
    }

    fn messages(dispatcher: &Dispatcher, line: &str) -> Vec<String> {
        let console = SimplePrincipal::superuser("console");
        dispatcher.process(&console, line).unwrap().messages
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(5_400)), "1h 30m");
        assert_eq!(format_duration(Duration::from_secs(90_061)), "1d 1h 1m 1s");
    }

    #[test]
    fn test_extra_aliases_and_unclaimed() {
        let (dispatcher, _) = setup();
        let tp = dispatcher.get("warp", None).unwrap();
        assert_eq!(tp.primary_alias(), "tp");
        // "say" was claimed by tp before echo registered
        assert_eq!(dispatcher.get("say", None).unwrap().primary_alias(), "tp");
        assert_eq!(dispatcher.get_all("say").len(), 1);
    }

    #[test]
    fn test_teleport() {
        let (dispatcher, _) = setup();
        assert_eq!(messages(&dispatcher, "teleport bob"), vec!["Teleported console to bob"]);
        assert_eq!(messages(&dispatcher, "tp bob alice"), vec!["Teleported bob to alice"]);
        assert!(messages(&dispatcher, "tp -s bob").is_empty());
    }

    #[test]
    fn test_echo_flags() {
        let (dispatcher, _) = setup();
        assert_eq!(
            messages(&dispatcher, "echo -u -n 2 hello \"big world\""),
            vec!["HELLO BIG WORLD", "HELLO BIG WORLD"]
        );
    }

    #[test]
    fn test_sum_and_remind() {
        let (dispatcher, _) = setup();
        assert_eq!(messages(&dispatcher, "sum 1 2 3"), vec!["Sum: 6"]);
        assert_eq!(
            messages(&dispatcher, "remind 90m stretch your legs"),
            vec!["Reminder in 1h 30m: stretch your legs"]
        );
    }

    #[test]
    fn test_perm_children() {
        let (dispatcher, store) = setup();
        assert_eq!(
            messages(&dispatcher, "perm grant bob Cmd.TP"),
            vec!["Granted cmd.tp to bob"]
        );
        assert_eq!(messages(&dispatcher, "perm list bob"), vec!["bob: cmd.tp"]);
        assert!(store.lock()["bob"].contains("cmd.tp"));

        let console = SimplePrincipal::superuser("console");
        let err = dispatcher.process(&console, "perm frob bob").unwrap_err();
        assert_eq!(err.to_string(), "No such child command: frob (in perm)");
    }

    #[test]
    fn test_perm_requires_permission() {
        let (dispatcher, _) = setup();
        let guest = SimplePrincipal::new("guest");
        assert_eq!(
            dispatcher.process(&guest, "perm list bob"),
            Err(CommandError::PermissionDenied)
        );
        assert!(!dispatcher.filter_aliases(&guest).contains(&"perm".to_string()));
    }
}
