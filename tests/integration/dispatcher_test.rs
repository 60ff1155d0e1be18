//! Routing, registration and lookup through the public dispatcher API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cmdroute::commands::{
    CommandCallable, CommandMapping, Dispatcher, ParameterizedCommand, Principal,
    SimplePrincipal,
};
use cmdroute::error::{BuildError, CommandError};
use pretty_assertions::assert_eq;

use super::Recorder;

fn console() -> SimplePrincipal {
    SimplePrincipal::superuser("console")
}

#[test]
fn test_teleport_scenario() {
    let dispatcher = Dispatcher::new();
    let tp = Recorder::arc();
    let mapping = dispatcher
        .register(tp.clone(), &["tp", "teleport"])
        .unwrap()
        .unwrap();

    let result = dispatcher.process(&console(), "teleport bob").unwrap();
    assert_eq!(result.messages, vec!["bob"]);
    assert_eq!(tp.calls(), vec!["bob"]);
    assert_eq!(dispatcher.get("teleport", None), Some(mapping));

    let err = dispatcher.process(&console(), "unknown x").unwrap_err();
    assert_eq!(
        err,
        CommandError::NotFound {
            alias: "unknown".to_string()
        }
    );
    assert_eq!(err.unresolved(), Some("unknown"));
}

#[test]
fn test_primary_alias_is_first_requested() {
    let dispatcher = Dispatcher::new();
    let mapping = dispatcher
        .register(Recorder::arc(), &["a", "b", "c"])
        .unwrap()
        .unwrap();
    assert_eq!(mapping.primary_alias(), "a");
    assert_eq!(mapping.secondary_aliases(), ["b", "c"]);
    assert_eq!(dispatcher.size(), 3);
}

#[test]
fn test_lookup_is_case_insensitive() {
    let dispatcher = Dispatcher::new();
    let mapping = dispatcher.register(Recorder::arc(), &["Foo"]).unwrap();
    assert_eq!(dispatcher.get("foo", None), mapping);
    assert_eq!(dispatcher.get("FOO", None), mapping);
    assert!(dispatcher.contains_alias("fOo"));
}

#[test]
fn test_shared_alias_keeps_both_and_prefers_exact_primary() {
    let dispatcher = Dispatcher::new();
    let y = dispatcher
        .register(Recorder::arc(), &["y", "x"])
        .unwrap()
        .unwrap();
    let x = dispatcher
        .register(Recorder::arc(), &["x"])
        .unwrap()
        .unwrap();

    let all = dispatcher.get_all("x");
    assert_eq!(all.len(), 2);
    assert!(all.contains(&x) && all.contains(&y));
    assert_eq!(dispatcher.get("x", None), Some(x));
}

#[test]
fn test_custom_disambiguator_consulted_only_on_collision() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let dispatcher = Dispatcher::with_disambiguator(
        move |_: Option<&dyn Principal>, _: &str, candidates: &[CommandMapping]| {
            counter.fetch_add(1, Ordering::SeqCst);
            candidates.last().cloned()
        },
    );

    dispatcher.register(Recorder::arc(), &["solo"]).unwrap();
    dispatcher.register(Recorder::arc(), &["dup"]).unwrap();
    let second = dispatcher.register(Recorder::arc(), &["dup"]).unwrap();

    assert!(dispatcher.get("solo", None).is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(dispatcher.get("dup", None), second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_filter_cannot_add_aliases() {
    let dispatcher = Dispatcher::new();
    let err = dispatcher
        .register_with(Recorder::arc(), &["a"], |requested, _| {
            let mut aliases = requested.to_vec();
            aliases.push("sneaky".to_string());
            aliases
        })
        .unwrap_err();
    assert_eq!(err, BuildError::UnrequestedAlias("sneaky".to_string()));
    assert!(dispatcher.is_empty());

    let none = dispatcher
        .register_with(Recorder::arc(), &["a"], |_, _| Vec::new())
        .unwrap();
    assert!(none.is_none());
}

#[test]
fn test_filter_drops_taken_aliases_while_locked() {
    let dispatcher = Dispatcher::new();
    dispatcher.register(Recorder::arc(), &["tp"]).unwrap();

    let mapping = dispatcher
        .register_with(Recorder::arc(), &["tp", "teleport"], |requested, taken| {
            requested
                .iter()
                .filter(|alias| !taken.contains_alias(alias))
                .cloned()
                .collect()
        })
        .unwrap()
        .unwrap();
    assert_eq!(mapping.primary_alias(), "teleport");
    assert!(mapping.secondary_aliases().is_empty());
    assert_eq!(dispatcher.get_all("tp").len(), 1);
    assert_eq!(dispatcher.get("teleport", None), Some(mapping));
}

#[test]
fn test_removal_is_idempotent() {
    let dispatcher = Dispatcher::new();
    let mapping = dispatcher
        .register(Recorder::arc(), &["a", "b"])
        .unwrap()
        .unwrap();

    assert_eq!(dispatcher.remove_mapping(&mapping), Some(mapping.clone()));
    assert!(!dispatcher.contains_alias("a"));
    assert!(!dispatcher.contains_alias("b"));
    assert_eq!(dispatcher.remove_mapping(&mapping), None);
    assert!(!dispatcher.remove_mappings(&[mapping]));
    assert!(dispatcher.remove("a").is_empty());
}

#[test]
fn test_suggestions_filter_by_prefix_and_permission() {
    let dispatcher = Dispatcher::new();
    dispatcher.register(Recorder::arc(), &["help"]).unwrap();
    dispatcher.register(Recorder::arc(), &["hello"]).unwrap();
    dispatcher.register(Recorder::arc(), &["world"]).unwrap();
    dispatcher
        .register(Recorder::requiring("admin.hex"), &["hex"])
        .unwrap();

    let guest = SimplePrincipal::new("guest");
    assert_eq!(
        dispatcher.suggestions(&guest, "he", None).unwrap(),
        vec!["help", "hello"]
    );
    assert_eq!(
        dispatcher.suggestions(&console(), "HE", None).unwrap(),
        vec!["help", "hello", "hex"]
    );
    assert!(dispatcher
        .suggestions(&console(), "nothing here", None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_nested_dispatchers_bubble_child_errors() {
    let inner = Dispatcher::new();
    inner.register(Recorder::arc(), &["leaf"]).unwrap();
    let middle = Dispatcher::new();
    middle.register(Arc::new(inner), &["inner"]).unwrap();
    let root = Dispatcher::new();
    root.register(Arc::new(middle), &["outer"]).unwrap();

    let ok = root.process(&console(), "outer inner leaf x y").unwrap();
    assert_eq!(ok.messages, vec!["x y"]);

    let err = root.process(&console(), "outer inner nope").unwrap_err();
    assert_eq!(
        err,
        CommandError::ChildNotFound {
            parent: "outer inner".to_string(),
            child: "nope".to_string()
        }
    );
}

#[test]
fn test_parameterized_children_and_tree() {
    let child = ParameterizedCommand::builder()
        .description("Does the thing")
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();
    let parent = ParameterizedCommand::builder()
        .description("Parent")
        .child(Arc::new(child), &["thing", "t"])
        .build()
        .unwrap();

    let dispatcher = Dispatcher::new();
    dispatcher.register(Arc::new(parent), &["parent"]).unwrap();

    let roots = dispatcher.tree();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].paths(), vec!["parent", "parent thing"]);
    assert!(roots[0].find(&["T"]).is_some());
    assert_eq!(
        roots[0].describe(&console()).children[0].description.as_deref(),
        Some("Does the thing")
    );
    assert_eq!(dispatcher.usage(&console()), "parent");
}

#[test]
fn test_concurrent_registration_is_atomic() {
    let dispatcher = Dispatcher::new();
    std::thread::scope(|scope| {
        for i in 0..8 {
            let dispatcher = &dispatcher;
            scope.spawn(move || {
                for j in 0..50 {
                    let name = format!("cmd{i}x{j}");
                    let mapping = dispatcher
                        .register(Recorder::arc(), &[name.clone(), format!("{name}-alt")])
                        .unwrap()
                        .unwrap();
                    assert!(dispatcher.contains_mapping(&mapping));
                    if j % 2 == 0 {
                        dispatcher.remove_mapping(&mapping);
                    }
                }
            });
        }
    });

    assert_eq!(dispatcher.commands().len(), 8 * 25);
    for mapping in dispatcher.commands() {
        let aliases: Vec<&str> = mapping.all_aliases().collect();
        assert!(aliases.iter().all(|alias| dispatcher.contains_alias(alias)));
    }
}
