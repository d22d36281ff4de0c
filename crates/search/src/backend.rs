//! Search backend seam and the CLI-subprocess implementation.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use mk_domain::config::{SearchConfig, SearchMode};

use crate::error::SearchError;
use crate::normalize::{normalize_output, SearchSnippet};

/// Trait for the external full-text / semantic search tool.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Whether the tool is installed and answering.
    async fn status(&self) -> bool;

    /// Whether the memory collection is registered.
    async fn has_collection(&self) -> Result<bool, SearchError>;

    /// Register the memory collection if it is missing. Idempotent.
    async fn ensure_collection(&self) -> Result<(), SearchError>;

    /// Run one query.
    async fn search(
        &self,
        mode: SearchMode,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchSnippet>, SearchError>;

    /// Refresh the index (and embeddings when `embed`).
    async fn update(&self, embed: bool) -> Result<(), SearchError>;
}

/// CLI subcommand for each mode.
pub fn mode_subcommand(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Keyword => "search",
        SearchMode::Semantic => "vsearch",
        SearchMode::Hybrid => "query",
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// qmd CLI
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Drives the `qmd` command-line tool.
///
/// Each call spawns one child process. On timeout the child is abandoned,
/// not killed; it finishes or dies on its own.
pub struct QmdCli {
    command: String,
    collection: String,
    memory_dir: PathBuf,
    timeout: Duration,
}

impl QmdCli {
    pub fn new(cfg: &SearchConfig, memory_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: cfg.command.clone(),
            collection: cfg.collection.clone(),
            memory_dir: memory_dir.into(),
            timeout: Duration::from_millis(cfg.tool_timeout_ms),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, SearchError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);

        let started = Instant::now();
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(SearchError::Spawn {
                    command: self.command.clone(),
                    source: e,
                })
            }
            Err(_) => return Err(SearchError::Timeout(self.timeout.as_millis() as u64)),
        };

        tracing::debug!(
            command = %self.command,
            subcommand = args.first().copied().unwrap_or_default(),
            status = ?output.status.code(),
            duration_ms = started.elapsed().as_millis() as u64,
            "search tool call finished"
        );

        if !output.status.success() {
            return Err(SearchError::ExitStatus {
                command: format!("{} {}", self.command, args.first().copied().unwrap_or_default()),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl SearchBackend for QmdCli {
    async fn status(&self) -> bool {
        match self.run(&["status"]).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "search tool status check failed");
                false
            }
        }
    }

    async fn has_collection(&self) -> Result<bool, SearchError> {
        let listing = self.run(&["collection", "list"]).await?;
        Ok(listing_has_collection(&listing, &self.collection))
    }

    async fn ensure_collection(&self) -> Result<(), SearchError> {
        if self.has_collection().await? {
            return Ok(());
        }
        let dir = self.memory_dir.to_string_lossy().into_owned();
        self.run(&[
            "collection",
            "add",
            dir.as_str(),
            "--name",
            self.collection.as_str(),
            "--mask",
            "**/*.md",
        ])
        .await?;
        tracing::info!(collection = %self.collection, dir = %dir, "registered memory collection");
        Ok(())
    }

    async fn search(
        &self,
        mode: SearchMode,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchSnippet>, SearchError> {
        let limit = limit.to_string();
        let stdout = self
            .run(&[
                mode_subcommand(mode),
                query,
                "-c",
                self.collection.as_str(),
                "-n",
                limit.as_str(),
                "--json",
            ])
            .await?;
        normalize_output(&stdout)
    }

    async fn update(&self, embed: bool) -> Result<(), SearchError> {
        self.run(&["update"]).await?;
        if embed {
            self.run(&["embed"]).await?;
        }
        Ok(())
    }
}

/// Whether a `collection list` listing names `collection` as a token.
fn listing_has_collection(listing: &str, collection: &str) -> bool {
    let plain = crate::normalize::strip_ansi(listing);
    plain.lines().any(|line| {
        line.split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ':' | ',' | '"'))
            .any(|token| token == collection)
    })
}
