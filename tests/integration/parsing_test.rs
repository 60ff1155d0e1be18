//! Argument parsing through parameterized commands.

use std::sync::Arc;

use cmdroute::commands::{CommandCallable, ParameterizedCommand, SimplePrincipal};
use cmdroute::error::{ArgumentParseError, CommandError};
use cmdroute::parameter::parsers::{choices, integer, literal, string, word};
use cmdroute::parameter::{
    value, ArgumentReader, Chain, Flag, FirstOf, Modifier, ParameterKey, ParseContext,
    UnknownFlagBehavior,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

fn console() -> SimplePrincipal {
    SimplePrincipal::superuser("console")
}

/// Records what the context holds for its key once the rest of the chain ran.
struct Observe(Arc<Mutex<Vec<Vec<i32>>>>);

impl Modifier<i32> for Observe {
    fn name(&self) -> &str {
        "observe"
    }

    fn on_parse(
        &self,
        key: &ParameterKey<i32>,
        reader: &mut ArgumentReader,
        context: &mut ParseContext<'_>,
        chain: Chain<'_, i32>,
    ) -> Result<(), ArgumentParseError> {
        chain.next(key, reader, context)?;
        let seen = context.all(key).into_iter().copied().collect();
        self.0.lock().push(seen);
        Ok(())
    }
}

#[test]
fn test_flag_prefix_depends_on_alias_length() {
    let short = Flag::builder().alias("a").build().unwrap();
    let long = Flag::builder().alias("all").build().unwrap();
    assert_eq!(short.prefixed_aliases(), ["-a"]);
    assert_eq!(long.prefixed_aliases(), ["--all"]);
}

#[test]
fn test_outer_modifier_sees_transformed_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let number = ParameterKey::<i32>::new("number");
    let command = ParameterizedCommand::builder()
        .parameter(
            value("number", integer())
                .modifier(Observe(seen.clone()))
                .map(|n| n * 10)
                .build()
                .unwrap(),
        )
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();

    let principal = console();
    let context = command.parse(&principal, "4").unwrap();
    assert_eq!(context.one(&number), Some(&40));
    assert_eq!(*seen.lock(), vec![vec![40]]);
}

#[test]
fn test_optional_failure_leaves_no_value() {
    let count = ParameterKey::<i32>::new("count");
    let name = ParameterKey::<String>::new("name");
    let command = ParameterizedCommand::builder()
        .parameter(value("count", integer()).optional_weak().build().unwrap())
        .parameter(value("name", word()).build().unwrap())
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();

    let principal = console();
    let context = command.parse(&principal, "bob").unwrap();
    assert!(!context.has_any(&count));
    assert_eq!(context.one(&name).map(String::as_str), Some("bob"));

    let context = command.parse(&principal, "3 bob").unwrap();
    assert_eq!(context.one(&count), Some(&3));
}

#[test]
fn test_parse_error_carries_position() {
    let command = ParameterizedCommand::builder()
        .parameter(value("first", word()).build().unwrap())
        .parameter(value("count", integer()).build().unwrap())
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();

    let principal = console();
    let err = command.parse(&principal, "abc  xyz").unwrap_err();
    assert_eq!(err.message, "Expected an integer, found 'xyz'");
    assert_eq!(err.position, 5);
    assert_eq!(err.annotated(), "Expected an integer, found 'xyz'\nabc  xyz\n     ^");

    let err = command.process(&principal, "abc 1 2").unwrap_err();
    assert!(matches!(err, CommandError::Parse(ref e) if e.message == "Too many arguments!"));
}

#[test]
fn test_first_of_picks_first_success() {
    let number = ParameterKey::<i32>::new("number");
    let text = ParameterKey::<String>::new("text");
    let command = ParameterizedCommand::builder()
        .parameter(FirstOf::new(vec![
            Box::new(value("number", integer()).build().unwrap()),
            Box::new(value("text", string()).build().unwrap()),
        ]))
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();

    let principal = console();
    let context = command.parse(&principal, "12").unwrap();
    assert_eq!(context.one(&number), Some(&12));
    assert!(!context.has_any(&text));

    let context = command.parse(&principal, "\"twelve apples\"").unwrap();
    assert!(!context.has_any(&number));
    assert_eq!(context.one(&text).map(String::as_str), Some("twelve apples"));
}

#[test]
fn test_flags_repeat_and_degrade_for_unpermitted_principal() {
    let level = ParameterKey::<i32>::new("level");
    let rest = ParameterKey::<String>::new("rest");
    let command = ParameterizedCommand::builder()
        .flag(Flag::builder().aliases(["v", "verbose"]).build().unwrap())
        .flag(
            Flag::builder()
                .alias("level")
                .permission("admin.level")
                .parameter(value("level", integer()).build().unwrap())
                .build()
                .unwrap(),
        )
        .parameter(value("rest", string()).optional().build().unwrap())
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();

    let admin = console();
    let context = command.parse(&admin, "-vv --verbose --level=3").unwrap();
    assert_eq!(context.flag_invocation_count("verbose"), 3);
    assert_eq!(context.flag_invocation_count("-v"), 3);
    assert_eq!(context.one(&level), Some(&3));
    assert!(!context.has_any(&rest));

    let guest = SimplePrincipal::new("guest");
    let context = command.parse(&guest, "--level").unwrap();
    assert!(!context.has_flag("level"));
    assert_eq!(context.one(&rest).map(String::as_str), Some("--level"));
}

#[test]
fn test_unknown_flag_error_mode() {
    let command = ParameterizedCommand::builder()
        .flag(Flag::builder().alias("quiet").build().unwrap())
        .unknown_flags(UnknownFlagBehavior::Error)
        .parameter(value("word", word()).optional().build().unwrap())
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();

    let principal = console();
    let err = command.parse(&principal, "--loud").unwrap_err();
    assert_eq!(err.message, "Unknown flag --loud");
    assert!(command.parse(&principal, "-- --loud").is_ok());
    assert!(command.parse(&principal, "-5").is_ok());
}

#[test]
fn test_literal_and_choices_usage_and_completion() {
    let mode = ParameterKey::<u8>::new("mode");
    let command = ParameterizedCommand::builder()
        .parameter(value("set", literal(["set"])).build().unwrap())
        .parameter(
            value("mode", choices([("fast", 1u8), ("slow", 2u8)]))
                .build()
                .unwrap(),
        )
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();

    let principal = console();
    assert_eq!(command.usage(&principal), "set <fast|slow>");
    assert_eq!(
        command.suggestions(&principal, "set f", None).unwrap(),
        vec!["fast"]
    );

    let context = command.parse(&principal, "set SLOW").unwrap();
    assert_eq!(context.one(&mode), Some(&2));

    let err = command.parse(&principal, "set medium").unwrap_err();
    assert_eq!(
        err.message,
        "'medium' is not a valid choice, expected one of: fast, slow"
    );
}

#[test]
fn test_optional_flag_value_before_last_positional() {
    let level = ParameterKey::<i32>::new("level");
    let name = ParameterKey::<String>::new("name");
    let command = ParameterizedCommand::builder()
        .flag(
            Flag::builder()
                .alias("l")
                .parameter(value("level", integer()).optional().build().unwrap())
                .build()
                .unwrap(),
        )
        .parameter(value("name", word()).build().unwrap())
        .executor(|_, _| Ok(Default::default()))
        .build()
        .unwrap();

    let principal = console();
    let context = command.parse(&principal, "-l bob").unwrap();
    assert!(context.has_flag("l"));
    assert!(!context.has_any(&level));
    assert_eq!(context.one(&name).map(String::as_str), Some("bob"));

    let context = command.parse(&principal, "-l 3 bob").unwrap();
    assert_eq!(context.one(&level), Some(&3));
    assert_eq!(context.one(&name).map(String::as_str), Some("bob"));
}
