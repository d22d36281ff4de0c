//! Per-turn relevance search.
//!
//! Gracefully degrades: if the tool is missing, slow, or prints garbage,
//! the result is an empty string rather than an error.

use std::time::{Duration, Instant};

use mk_domain::trace::TraceEvent;

use crate::error::SearchError;
use crate::handle::SearchHandle;
use crate::normalize::format_snippets;

/// Strip control characters (whitespace controls become spaces), collapse
/// runs of whitespace, and clip to `max_chars`.
pub fn sanitize_query(prompt: &str, max_chars: usize) -> String {
    let spaced: String = prompt
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect();
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(max_chars) {
        Some((idx, _)) => collapsed[..idx].trim_end().to_string(),
        None => collapsed,
    }
}

/// Search memory for snippets relevant to `prompt` and format them for
/// injection.
///
/// Never fails: returns an empty string when the prompt is empty, the
/// tool or collection is missing, the call errors or times out, or no
/// snippet has content.
pub async fn search_relevant_memories(handle: &SearchHandle, prompt: &str) -> String {
    let cfg = handle.config();
    let query = sanitize_query(prompt, cfg.max_query_chars);
    if query.is_empty() || !cfg.enabled || !handle.is_available() || !handle.has_collection() {
        return String::new();
    }

    let started = Instant::now();
    let timeout = Duration::from_millis(cfg.auto_timeout_ms);
    let search = handle.backend().search(cfg.auto_mode, &query, cfg.auto_limit);

    let snippets = match tokio::time::timeout(timeout, search).await {
        Ok(Ok(snippets)) => snippets,
        Ok(Err(e)) => {
            if matches!(e, SearchError::Spawn { .. }) {
                handle.mark_unavailable();
            }
            degraded(format!("search failed: {e}"));
            return String::new();
        }
        Err(_) => {
            degraded(format!("search timed out after {} ms", cfg.auto_timeout_ms));
            return String::new();
        }
    };

    let usable: Vec<_> = snippets
        .into_iter()
        .filter(|s| !s.content.trim().is_empty())
        .collect();

    TraceEvent::SearchCompleted {
        mode: cfg.auto_mode.to_string(),
        hits: usable.len(),
        duration_ms: started.elapsed().as_millis() as u64,
    }
    .emit();

    format_snippets(&usable)
}

fn degraded(reason: String) {
    tracing::debug!(reason = %reason, "relevance search degraded to empty");
    TraceEvent::SearchDegraded { reason }.emit();
}
