//! cmdroute - route command lines through a dispatcher of demonstration commands.

use std::io::BufRead;

use cmdroute::cli::{Cli, OutputFormat};
use cmdroute::commands::{
    register_builtins, render_tree, CommandResult, Dispatcher, PermissionStore, SimplePrincipal,
};
use cmdroute::config::Config;
use cmdroute::error::{CommandError, Error, Result};
use cmdroute::logging::init_stderr_logging;
use serde_json::json;
use tracing::{debug, error, info};

fn main() {
    let cli = Cli::parse_args();
    let config = Config::load_from_file(&cli.config_path());

    let level = config
        .as_ref()
        .map_or("info", |config| config.logging.level.as_str());
    init_stderr_logging(level);

    if let Err(e) = config.and_then(|config| run(&cli, config)) {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: Config) -> Result<()> {
    let format = cli.parse_output_format().map_err(Error::config)?;

    let principal = match &cli.principal {
        Some(name) => SimplePrincipal::new(name).grant_all(cli.grant.iter().cloned()),
        None => config.principal.to_principal(),
    };

    let dispatcher = config.dispatcher.disambiguator.dispatcher();
    let mappings = register_builtins(&dispatcher, &config.aliases, PermissionStore::default())?;
    info!(
        commands = mappings.len(),
        aliases = dispatcher.size(),
        "Dispatcher ready"
    );

    if let Some(line) = &cli.suggest {
        let suggestions = dispatcher.suggestions(&principal, line, None)?;
        match format {
            OutputFormat::Text => suggestions.iter().for_each(|s| println!("{s}")),
            OutputFormat::Json => println!("{}", json!(suggestions)),
        }
        return Ok(());
    }

    if cli.tree {
        let entries: Vec<_> = dispatcher
            .tree()
            .iter()
            .filter(|node| node.mapping().callable().test_permission(&principal))
            .map(|node| node.describe(&principal))
            .collect();
        match format {
            OutputFormat::Text => println!("{}", render_tree(&entries)),
            OutputFormat::Json => println!("{}", json!(entries)),
        }
        return Ok(());
    }

    let mut failures = 0usize;
    let mut handle = |line: &str| -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let outcome = run_line(&dispatcher, &principal, line, format);
        if let Err(e) = outcome {
            failures += 1;
            if !cli.keep_going {
                return Err(e.into());
            }
        }
        Ok(())
    };

    if cli.reads_stdin() {
        for line in std::io::stdin().lock().lines() {
            let line = line.map_err(|e| Error::config(format!("Failed to read stdin: {e}")))?;
            handle(&line)?;
        }
    } else {
        for line in &cli.commands {
            handle(line)?;
        }
    }

    if failures > 0 {
        return Err(Error::Command(CommandError::execution(format!(
            "{failures} command(s) failed"
        ))));
    }
    Ok(())
}

/// Runs one command line and prints its outcome.
///
/// Failures are printed too, in the selected format, before being returned.
fn run_line(
    dispatcher: &Dispatcher,
    principal: &SimplePrincipal,
    line: &str,
    format: OutputFormat,
) -> std::result::Result<CommandResult, CommandError> {
    debug!(line, "Running command line");
    let outcome = dispatcher.process(principal, line);
    match (&outcome, format) {
        (Ok(result), OutputFormat::Text) => {
            result.messages.iter().for_each(|m| println!("{m}"));
        }
        (Ok(result), OutputFormat::Json) => {
            println!("{}", json!({ "command": line, "ok": true, "result": result }));
        }
        (Err(e), OutputFormat::Text) => {
            let detail = match e {
                CommandError::Parse(parse) => parse.annotated(),
                other => other.to_string(),
            };
            eprintln!("{}: {detail}", e.category());
        }
        (Err(e), OutputFormat::Json) => {
            println!(
                "{}",
                json!({
                    "command": line,
                    "ok": false,
                    "category": e.category(),
                    "error": e.to_string(),
                })
            );
        }
    }
    outcome
}
