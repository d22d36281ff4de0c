//! Memory tools exposed to the model: definitions and dispatch.
//!
//! Every handler returns a [`ToolOutput`]; failures become error outputs
//! rather than escaping to the host.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use mk_domain::config::SearchMode;
use mk_domain::error::{Error, Result};
use mk_domain::tool::{ToolDefinition, ToolOutput};
use mk_domain::trace::TraceEvent;
use mk_memory::store::{DAILY_DIR, LONG_TERM_FILE};
use mk_memory::WriteMode;
use mk_search::{format_snippets, sanitize_query};

use crate::session::{self, MemorySession};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Arguments
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WriteTarget {
    #[default]
    LongTerm,
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReadTarget {
    LongTerm,
    Scratchpad,
    Daily,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScratchpadAction {
    Add,
    Done,
    Undo,
    ClearDone,
    List,
}

impl ScratchpadAction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Done => "done",
            Self::Undo => "undo",
            Self::ClearDone => "clear_done",
            Self::List => "list",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryWriteArgs {
    #[serde(default)]
    pub target: WriteTarget,
    pub content: String,
    #[serde(default)]
    pub mode: WriteMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryReadArgs {
    pub target: ReadTarget,
    /// `YYYY-MM-DD`; defaults to today for `daily`.
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScratchpadArgs {
    pub action: ScratchpadAction,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemorySearchArgs {
    pub query: String,
    #[serde(default)]
    pub mode: Option<SearchMode>,
    #[serde(default)]
    pub limit: Option<usize>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool definitions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "memory_write".into(),
            description: "Save something worth remembering. long_term goes to MEMORY.md; daily appends to today's log.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "target": { "type": "string", "enum": ["long_term", "daily"], "description": "Where to write (default long_term)" },
                    "content": { "type": "string", "description": "Text to save" },
                    "mode": { "type": "string", "enum": ["append", "overwrite"], "description": "long_term only (default append)" }
                },
                "required": ["content"]
            }),
        },
        ToolDefinition {
            name: "memory_read".into(),
            description: "Read a memory file, or list the daily logs.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "target": { "type": "string", "enum": ["long_term", "scratchpad", "daily", "list"] },
                    "date": { "type": "string", "description": "YYYY-MM-DD for target=daily (default today)" }
                },
                "required": ["target"]
            }),
        },
        ToolDefinition {
            name: "scratchpad".into(),
            description: "Manage the scratchpad checklist. Open items are shown at the start of every turn.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "action": { "type": "string", "enum": ["add", "done", "undo", "clear_done", "list"] },
                    "text": { "type": "string", "description": "Item text for add; a case-insensitive substring for done/undo" }
                },
                "required": ["action"]
            }),
        },
        ToolDefinition {
            name: "memory_search".into(),
            description: "Search all memory files for relevant snippets.".into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "mode": { "type": "string", "enum": ["keyword", "semantic", "hybrid"] },
                    "limit": { "type": "integer", "minimum": 1 }
                },
                "required": ["query"]
            }),
        },
    ]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dispatch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run a memory tool by name.
pub async fn dispatch_tool(session: &MemorySession, tool_name: &str, arguments: &Value) -> ToolOutput {
    let result = match tool_name {
        "memory_write" => match parse_args(tool_name, arguments) {
            Ok(args) => memory_write(session, args),
            Err(out) => return out,
        },
        "memory_read" => match parse_args(tool_name, arguments) {
            Ok(args) => memory_read(session, args),
            Err(out) => return out,
        },
        "scratchpad" => match parse_args(tool_name, arguments) {
            Ok(args) => scratchpad(session, args),
            Err(out) => return out,
        },
        "memory_search" => match parse_args(tool_name, arguments) {
            Ok(args) => memory_search(session, args).await,
            Err(out) => return out,
        },
        _ => return ToolOutput::error(format!("unknown tool: {tool_name}")),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(tool = tool_name, error = %e, "memory tool failed");
        ToolOutput::error(format!("{tool_name} failed: {e}"))
    })
}

fn parse_args<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: &Value,
) -> std::result::Result<T, ToolOutput> {
    serde_json::from_value(arguments.clone())
        .map_err(|e| ToolOutput::error(format!("invalid {tool_name} arguments: {e}")))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn memory_write(session: &MemorySession, args: MemoryWriteArgs) -> Result<ToolOutput> {
    let content = args.content.trim();
    if content.is_empty() {
        return Err(Error::Other("content is empty".into()));
    }

    let store = session.store();
    let meta = session.meta_now();
    let (text, path, mode) = match args.target {
        WriteTarget::LongTerm => {
            store.write_long_term(content, args.mode, &meta)?;
            let verb = match args.mode {
                WriteMode::Append => "Appended to",
                WriteMode::Overwrite => "Overwrote",
            };
            (format!("{verb} {LONG_TERM_FILE}"), store.long_term_path(), args.mode)
        }
        WriteTarget::Daily => {
            let today = session::today();
            store.append_daily(today, content, &meta)?;
            (
                format!("Appended to {DAILY_DIR}/{}.md", today.format("%Y-%m-%d")),
                store.daily_path(today),
                WriteMode::Append,
            )
        }
    };
    session.schedule_reindex();

    Ok(ToolOutput::ok(
        text,
        json!({
            "path": path.display().to_string(),
            "mode": mode.as_str(),
            "chars": content.chars().count(),
        }),
    ))
}

pub fn memory_read(session: &MemorySession, args: MemoryReadArgs) -> Result<ToolOutput> {
    let store = session.store();
    match args.target {
        ReadTarget::LongTerm => Ok(read_blob(store.read_long_term()?, "Long-term memory is empty.")),
        ReadTarget::Scratchpad => Ok(read_blob(store.read_scratchpad()?, "Scratchpad is empty.")),
        ReadTarget::Daily => {
            let date = match args.date.as_deref() {
                Some(raw) => parse_date(raw)?,
                None => session::today(),
            };
            let empty = format!("No daily log for {}.", date.format("%Y-%m-%d"));
            Ok(read_blob(store.read_daily(date)?, &empty))
        }
        ReadTarget::List => {
            let dates: Vec<String> = store
                .list_daily()?
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect();
            if dates.is_empty() {
                return Ok(ToolOutput::ok("No daily logs yet.", json!({ "dates": [] })));
            }
            Ok(ToolOutput::ok(dates.join("\n"), json!({ "dates": dates })))
        }
    }
}

pub fn scratchpad(session: &MemorySession, args: ScratchpadArgs) -> Result<ToolOutput> {
    let store = session.store();
    let mut pad = store.load_scratchpad()?;
    let text = args.text.as_deref().map(str::trim).unwrap_or_default();

    let (message, changed) = match args.action {
        ScratchpadAction::Add => {
            require_text(text, args.action)?;
            let added = pad.add(text, session.meta_now()).text.clone();
            (format!("Added: {added}"), true)
        }
        ScratchpadAction::Done | ScratchpadAction::Undo => {
            require_text(text, args.action)?;
            let done = args.action == ScratchpadAction::Done;
            match pad.set_done(text, done).map(|item| item.text.clone()) {
                Some(item) if done => (format!("Done: {item}"), true),
                Some(item) => (format!("Reopened: {item}"), true),
                None => {
                    let state = if done { "open" } else { "completed" };
                    (format!("No {state} item matching \"{text}\"."), false)
                }
            }
        }
        ScratchpadAction::ClearDone => {
            let removed = pad.clear_done();
            (format!("Removed {removed} completed item(s)."), removed > 0)
        }
        ScratchpadAction::List => {
            let listing = if pad.is_empty() {
                "Scratchpad is empty.".to_string()
            } else {
                pad.items
                    .iter()
                    .map(|item| item.checkbox_line())
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            (listing, false)
        }
    };

    if changed {
        store.save_scratchpad(&pad)?;
        TraceEvent::ScratchpadMutated {
            action: args.action.as_str().into(),
            items: pad.items.len(),
        }
        .emit();
        session.schedule_reindex();
    }

    let open = pad.items.iter().filter(|item| !item.done).count();
    Ok(ToolOutput::ok(
        message,
        json!({
            "action": args.action.as_str(),
            "changed": changed,
            "open": open,
            "done": pad.items.len() - open,
        }),
    ))
}

pub async fn memory_search(session: &MemorySession, args: MemorySearchArgs) -> Result<ToolOutput> {
    let handle = session.search();
    let cfg = handle.config();
    if !handle.is_available() {
        return Ok(ToolOutput::ok(
            format!(
                "Memory search is unavailable: `{}` is not installed or not responding. \
                 Install it and start a new session; until then use memory_read to browse memory files.",
                cfg.command
            ),
            json!({ "available": false }),
        ));
    }

    let query = sanitize_query(&args.query, cfg.max_query_chars);
    if query.is_empty() {
        return Err(Error::Other("query is empty".into()));
    }
    let mode = args.mode.unwrap_or(cfg.auto_mode);
    let limit = args.limit.unwrap_or(cfg.tool_limit).max(1);

    let snippets = handle.backend().search(mode, &query, limit).await?;
    let text = format_snippets(&snippets);
    let text = if text.is_empty() {
        "No matching memories.".to_string()
    } else {
        text
    };
    Ok(ToolOutput::ok(
        text,
        json!({
            "available": true,
            "mode": mode.as_str(),
            "hits": snippets,
        }),
    ))
}

fn read_blob(content: Option<String>, empty: &str) -> ToolOutput {
    match content.filter(|c| !c.trim().is_empty()) {
        Some(content) => {
            let chars = content.chars().count();
            ToolOutput::ok(content, json!({ "chars": chars }))
        }
        None => ToolOutput::ok(empty, json!({ "chars": 0 })),
    }
}

fn require_text(text: &str, action: ScratchpadAction) -> Result<()> {
    if text.is_empty() {
        return Err(Error::Other(format!("text is required for {}", action.as_str())));
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| Error::Other(format!("invalid date {raw:?} (expected YYYY-MM-DD): {e}")))
}
