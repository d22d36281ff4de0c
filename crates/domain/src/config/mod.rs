mod context;
mod memory;
mod search;

pub use context::*;
pub use memory::*;
pub use search::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub handoff: HandoffConfig,
}

impl Config {
    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.context.total_max_chars <= 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "context.total_max_chars".into(),
                message: "overall cap must be greater than 0".into(),
            });
        } else if self.context.section_chars_sum() >= self.context.total_max_chars {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "context".into(),
                message: format!(
                    "section caps sum to {} chars, not below total_max_chars ({}); \
                     the overall cap will routinely cut the yesterday section",
                    self.context.section_chars_sum(),
                    self.context.total_max_chars
                ),
            });
        }

        if self.search.enabled && self.search.command.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "search.command".into(),
                message: "command must not be empty while search is enabled".into(),
            });
        }

        if self.search.enabled && self.search.collection.trim().is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "search.collection".into(),
                message: "collection must not be empty while search is enabled".into(),
            });
        }

        if self.search.auto_timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "search.auto_timeout_ms".into(),
                message: "a zero timeout disables per-turn relevance search".into(),
            });
        }

        errors
    }
}
