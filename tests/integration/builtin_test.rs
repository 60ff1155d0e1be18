//! The demonstration command set wired up from a configuration file.

use std::collections::BTreeMap;
use std::io::Write;

use cmdroute::commands::{register_builtins, render_tree, PermissionStore, SimplePrincipal};
use cmdroute::config::Config;
use cmdroute::error::CommandError;
use pretty_assertions::assert_eq;

fn configured(contents: &str) -> (Config, cmdroute::commands::Dispatcher) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    let config = Config::load_from_file(file.path()).unwrap();
    let dispatcher = config.dispatcher.disambiguator.dispatcher();
    register_builtins(&dispatcher, &config.aliases, PermissionStore::default()).unwrap();
    (config, dispatcher)
}

#[test]
fn test_configured_aliases_route() {
    let (config, dispatcher) = configured("[aliases]\ntp = [\"warp\"]\n");
    let principal = config.principal.to_principal();

    let result = dispatcher.process(&principal, "WARP alice bob").unwrap();
    assert_eq!(result.messages, vec!["Teleported alice to bob"]);
}

#[test]
fn test_restricted_principal() {
    let (config, dispatcher) =
        configured("[principal]\nname = \"guest\"\npermissions = [\"cmdroute.tp\"]\n");
    let principal = config.principal.to_principal();

    assert!(dispatcher.process(&principal, "tp bob").is_ok());
    assert_eq!(
        dispatcher.process(&principal, "perm list bob"),
        Err(CommandError::PermissionDenied)
    );
    assert_eq!(
        dispatcher.suggestions(&principal, "p", None).unwrap(),
        Vec::<String>::new()
    );
}

#[test]
fn test_suggestions_through_builtins() {
    let dispatcher = cmdroute::commands::Dispatcher::new();
    register_builtins(&dispatcher, &BTreeMap::new(), PermissionStore::default()).unwrap();
    let console = SimplePrincipal::superuser("console");

    assert_eq!(
        dispatcher.suggestions(&console, "perm ", None).unwrap(),
        vec!["add", "grant", "remove", "revoke", "list"]
    );
    assert_eq!(
        dispatcher.suggestions(&console, "echo --t", None).unwrap(),
        vec!["--times"]
    );
    assert_eq!(
        dispatcher.suggestions(&console, "t", None).unwrap(),
        vec!["tp", "teleport"]
    );
}

#[test]
fn test_tree_rendering() {
    let dispatcher = cmdroute::commands::Dispatcher::new();
    register_builtins(&dispatcher, &BTreeMap::new(), PermissionStore::default()).unwrap();
    let console = SimplePrincipal::superuser("console");

    let entries: Vec<_> = dispatcher
        .tree()
        .iter()
        .map(|node| node.describe(&console))
        .collect();
    let rendered = render_tree(&entries);
    assert!(rendered.contains("perm (permission) - Manage permission nodes\n  add (grant) - Grant a permission node"));
    assert!(rendered.starts_with("tp (teleport) - Teleport a player"));
}

#[test]
fn test_parse_errors_surface_as_command_errors() {
    let dispatcher = cmdroute::commands::Dispatcher::new();
    register_builtins(&dispatcher, &BTreeMap::new(), PermissionStore::default()).unwrap();
    let console = SimplePrincipal::superuser("console");

    let err = dispatcher.process(&console, "echo -n 11 hi").unwrap_err();
    assert_eq!(err.category(), "Parse Error");
    assert_eq!(err.to_string(), "11 is not between 1 and 10");

    let err = dispatcher.process(&console, "remind soon stretch").unwrap_err();
    assert_eq!(err.category(), "Parse Error");
}
