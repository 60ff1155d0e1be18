//! Command-line argument parsing for cmdroute.

use clap::Parser;
use std::path::PathBuf;

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One message per line.
    #[default]
    Text,
    /// One JSON document per command line.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Route command lines through a dispatcher of demonstration commands.
#[derive(Parser, Debug)]
#[command(name = "cmdroute")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Command lines to run, e.g. "tp bob alice". Read from stdin when omitted
    #[arg(value_name = "COMMAND")]
    pub commands: Vec<String>,

    /// Config file path
    #[arg(long, value_name = "PATH", env = "CMDROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print completions for a partial command line instead of running it
    #[arg(long, value_name = "LINE", conflicts_with = "tree")]
    pub suggest: Option<String>,

    /// Print the command tree visible to the principal
    #[arg(long)]
    pub tree: bool,

    /// Run as this principal instead of the configured one
    #[arg(long, value_name = "NAME")]
    pub principal: Option<String>,

    /// Permission nodes for --principal (comma-separated)
    #[arg(long, value_name = "NODES", value_delimiter = ',', requires = "principal")]
    pub grant: Vec<String>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Keep going after a command fails
    #[arg(long)]
    pub keep_going: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Whether command lines should be read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.commands.is_empty() && self.suggest.is_none() && !self.tree
    }
}
