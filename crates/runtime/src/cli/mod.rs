pub mod commands;
pub mod config;
pub mod status;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::tools::{ReadTarget, WriteTarget};

/// memkeep: persistent memory for coding agents.
#[derive(Debug, Parser)]
#[command(name = "memkeep", version, about)]
pub struct Cli {
    /// Session id recorded in entry metadata (default: a fresh `cli-` id).
    #[arg(long, global = true)]
    pub session: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the memory block that would be injected this turn.
    Context {
        /// User prompt to run the relevance search with.
        #[arg(long)]
        prompt: Option<String>,
        /// Print the build report as JSON instead of the block.
        #[arg(long)]
        report: bool,
    },
    /// Save a memory.
    Write {
        /// Text to save.
        content: String,
        #[arg(long, value_enum, default_value = "long-term")]
        target: WriteTarget,
        /// Replace MEMORY.md instead of appending.
        #[arg(long)]
        overwrite: bool,
    },
    /// Read a memory file, or list daily logs.
    Read {
        #[arg(value_enum)]
        target: ReadTarget,
        /// YYYY-MM-DD for `daily` (default today).
        #[arg(long)]
        date: Option<String>,
    },
    /// Manage the scratchpad checklist.
    #[command(subcommand)]
    Scratchpad(ScratchpadCommand),
    /// Search memory with the external search tool.
    Search {
        query: String,
        /// keyword, semantic or hybrid.
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Output hits as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Write a session handoff into today's log.
    Handoff,
    /// Show the memory directory and search tool state.
    Status,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ScratchpadCommand {
    /// Add an open item.
    Add { text: String },
    /// Check off the first open item containing TEXT.
    Done { text: String },
    /// Reopen the first completed item containing TEXT.
    Undo { text: String },
    /// Remove all completed items.
    ClearDone,
    /// Print all items.
    List,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Short random id for a one-shot CLI session.
pub fn new_session_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("cli-{}", &id[..8])
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from `MEMKEEP_CONFIG` (or `memkeep.toml`).
/// Returns the parsed config and the path that was used.
pub fn load_config() -> anyhow::Result<(mk_domain::config::Config, PathBuf)> {
    let config_path = PathBuf::from(
        std::env::var("MEMKEEP_CONFIG").unwrap_or_else(|_| "memkeep.toml".into()),
    );
    let config = mk_domain::config::Config::load_or_default(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    Ok((config, config_path))
}
