//! The per-session memory handle the host runtime drives.
//!
//! All mutable state (search availability, the pending reindex) lives on
//! [`MemorySession`] and goes away with it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};

use mk_contextpack::{ContextReport, MemoryContextBuilder};
use mk_domain::config::Config;
use mk_domain::error::Result;
use mk_memory::scratchpad::meta_comment;
use mk_memory::{write_handoff, MemoryStore};
use mk_search::{search_relevant_memories, QmdCli, Reindexer, SearchBackend, SearchHandle};

pub struct MemorySession {
    id: String,
    config: Config,
    store: MemoryStore,
    search: SearchHandle,
    reindexer: Reindexer,
}

impl MemorySession {
    pub fn new(id: impl Into<String>, config: Config, backend: Arc<dyn SearchBackend>) -> Self {
        let store = MemoryStore::new(config.memory.dir.clone());
        let reindexer = Reindexer::new(
            Arc::clone(&backend),
            Duration::from_millis(config.search.reindex_debounce_ms),
            config.search.embed_on_reindex,
        );
        let search = SearchHandle::new(backend, config.search.clone());
        Self {
            id: id.into(),
            config,
            store,
            search,
            reindexer,
        }
    }

    /// A session backed by the configured search CLI.
    pub fn with_cli_backend(id: impl Into<String>, config: Config) -> Self {
        let backend = Arc::new(QmdCli::new(&config.search, config.memory.dir.clone()));
        Self::new(id, config, backend)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn search(&self) -> &SearchHandle {
        &self.search
    }

    /// `<!-- timestamp [session] -->` for entries written right now.
    pub fn meta_now(&self) -> String {
        meta_comment(now(), &self.id)
    }

    // ── Lifecycle hooks ─────────────────────────────────────────────

    /// Probe the search tool and provision the collection. Idempotent.
    pub async fn on_session_start(&self) -> bool {
        let available = self.search.probe().await;
        tracing::info!(
            session_id = %self.id,
            search_available = available,
            collection_ready = self.search.has_collection(),
            memory_dir = %self.store.dir().display(),
            "memory session started"
        );
        available
    }

    /// Compute the memory block for this turn and append it to
    /// `system_prompt`. `None` when there is nothing to inject.
    pub async fn before_turn(&self, prompt: &str, system_prompt: &str) -> Option<String> {
        let (context, _) = self.memory_context(prompt, today()).await;
        if context.is_empty() {
            return None;
        }
        Some(format!("{system_prompt}\n\n{context}"))
    }

    /// Relevance search for `prompt` followed by a full context build.
    pub async fn memory_context(&self, prompt: &str, today: NaiveDate) -> (String, ContextReport) {
        let search = search_relevant_memories(&self.search, prompt).await;
        let sources = self.store.load_sources(today);
        MemoryContextBuilder::new(self.config.context.clone()).build(&sources, Some(&search), today)
    }

    /// Persist the open scratchpad items and recent log into today's log
    /// before the host compacts its history.
    pub async fn before_compaction(&self, session_id: &str) -> Result<bool> {
        let written = write_handoff(&self.store, session_id, now(), &self.config.handoff)?;
        if written {
            self.schedule_reindex();
        }
        Ok(written)
    }

    /// Drop any pending reindex.
    pub fn on_session_end(&self) {
        if self.reindexer.cancel() {
            tracing::debug!(session_id = %self.id, "session ended with a reindex pending");
        }
    }

    // ── Reindex ─────────────────────────────────────────────────────

    /// Queue a debounced reindex after a write. No-op while the search
    /// tool is unavailable. Must run inside a tokio runtime.
    pub fn schedule_reindex(&self) {
        if self.search.is_available() {
            self.reindexer.schedule();
        }
    }

    pub fn reindex_pending(&self) -> bool {
        self.reindexer.is_pending()
    }

    /// Run the pending reindex immediately, if there is one.
    pub async fn flush_reindex(&self) -> bool {
        self.reindexer.flush().await
    }
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
