use serde::Serialize;

/// Structured trace events emitted across all memkeep crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ContextBuilt {
        total_chars: usize,
        sections_included: usize,
        sections_truncated: usize,
        search_chars: usize,
        overall_truncated: bool,
    },
    MemorySourceUnreadable {
        path: String,
        error: String,
    },
    SearchCompleted {
        mode: String,
        hits: usize,
        duration_ms: u64,
    },
    SearchDegraded {
        reason: String,
    },
    ReindexScheduled {
        delay_ms: u64,
        replaced_pending: bool,
    },
    ReindexCompleted {
        ok: bool,
        duration_ms: u64,
    },
    HandoffWritten {
        session_id: String,
        open_items: usize,
        log_tail_lines: usize,
    },
    MemoryWritten {
        target: String,
        mode: String,
        chars: usize,
    },
    ScratchpadMutated {
        action: String,
        items: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "mk_event");
    }
}
