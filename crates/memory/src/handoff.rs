//! Pre-compaction handoff.
//!
//! Before the host compacts its conversation, the open scratchpad items and
//! the tail of today's log are copied into today's log under a tagged
//! heading. The next context build picks them up through the "today"
//! section without any special casing.

use chrono::NaiveDateTime;

use mk_domain::config::HandoffConfig;
use mk_domain::error::Result;
use mk_domain::trace::TraceEvent;

use crate::store::MemoryStore;

pub const HANDOFF_HEADING: &str = "## Session Handoff";

/// `<!-- HANDOFF YYYY-MM-DD HH:MM:SS [session] -->`
pub fn handoff_tag(now: NaiveDateTime, session_id: &str) -> String {
    crate::scratchpad::meta_comment(now, session_id).replacen("<!-- ", "<!-- HANDOFF ", 1)
}

/// Render the handoff body, or `None` when there is nothing to hand off.
pub fn render_handoff(
    open_items: &[String],
    today_log: Option<&str>,
    cfg: &HandoffConfig,
) -> Option<String> {
    let tail = today_log.map(|log| tail_lines(log, cfg.log_tail_lines)).unwrap_or_default();
    if open_items.is_empty() && tail.is_empty() {
        return None;
    }

    let mut out = String::from(HANDOFF_HEADING);
    if !open_items.is_empty() {
        out.push_str("\n\n**Open scratchpad items:**");
        for text in open_items.iter().take(cfg.max_open_items) {
            out.push_str("\n- [ ] ");
            out.push_str(text);
        }
        if open_items.len() > cfg.max_open_items {
            out.push_str(&format!(
                "\n- ... and {} more",
                open_items.len() - cfg.max_open_items
            ));
        }
    }
    if !tail.is_empty() {
        out.push_str("\n\n**Recent daily log context:**\n");
        out.push_str(&tail);
    }
    Some(out)
}

/// Capture and persist a handoff into today's log.
///
/// Returns `false` (and writes nothing) when there were no open items and
/// no log content.
pub fn write_handoff(
    store: &MemoryStore,
    session_id: &str,
    now: NaiveDateTime,
    cfg: &HandoffConfig,
) -> Result<bool> {
    let today = now.date();
    let open: Vec<String> = store
        .load_scratchpad()?
        .open_items()
        .into_iter()
        .map(|item| item.text)
        .collect();
    let log = store.read_daily(today)?;

    let Some(body) = render_handoff(&open, log.as_deref(), cfg) else {
        tracing::debug!(session_id, "nothing to hand off");
        return Ok(false);
    };

    store.append_daily(today, &body, &handoff_tag(now, session_id))?;

    TraceEvent::HandoffWritten {
        session_id: session_id.to_string(),
        open_items: open.len().min(cfg.max_open_items),
        log_tail_lines: log
            .as_deref()
            .map(|l| tail_lines(l, cfg.log_tail_lines).lines().count())
            .unwrap_or(0),
    }
    .emit();
    Ok(true)
}

fn tail_lines(text: &str, n: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || n == 0 {
        return String::new();
    }
    let lines: Vec<&str> = trimmed.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
