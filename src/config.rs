//! Configuration management for cmdroute.
//!
//! Loads an optional TOML file describing how the dispatcher resolves alias
//! collisions, who the command-line principal is, extra aliases for the
//! built-in commands, and the default log level.

use crate::commands::{
    Dispatcher, ExactPrimaryDisambiguator, FirstMatchDisambiguator, SimplePrincipal,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Main configuration structure for cmdroute.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Dispatcher behaviour.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// The principal commands run as.
    #[serde(default)]
    pub principal: PrincipalConfig,

    /// Extra aliases requested for built-in commands, keyed by primary alias.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Strategy used when several commands share an alias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisambiguatorKind {
    /// The earliest registered command wins.
    #[default]
    First,
    /// Only a command whose primary alias matches wins.
    Exact,
}

impl DisambiguatorKind {
    /// Creates an empty dispatcher using this strategy.
    pub fn dispatcher(self) -> Dispatcher {
        match self {
            Self::First => Dispatcher::with_disambiguator(FirstMatchDisambiguator),
            Self::Exact => Dispatcher::with_disambiguator(ExactPrimaryDisambiguator),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default)]
    pub disambiguator: DisambiguatorKind,
}

/// Identity and permission nodes of the command-line principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalConfig {
    #[serde(default = "default_principal_name")]
    pub name: String,

    #[serde(default = "default_permissions")]
    pub permissions: Vec<String>,
}

fn default_principal_name() -> String {
    "console".to_string()
}

fn default_permissions() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for PrincipalConfig {
    fn default() -> Self {
        Self {
            name: default_principal_name(),
            permissions: default_permissions(),
        }
    }
}

impl PrincipalConfig {
    /// Builds the principal described by this section.
    pub fn to_principal(&self) -> SimplePrincipal {
        SimplePrincipal::new(&self.name).grant_all(self.permissions.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level or filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cmdroute")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            Error::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (command, aliases) in &self.aliases {
            if let Some(bad) = aliases
                .iter()
                .find(|alias| alias.trim().is_empty() || alias.contains(char::is_whitespace))
            {
                return Err(Error::config(format!(
                    "Configuration error in {}:\n  invalid alias {bad:?} for '{command}'",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}
