//! Handlers for the memory subcommands. Each one opens a session, calls
//! the same code path the model's tools use, and prints the text result.

use anyhow::{bail, Context};

use mk_domain::config::SearchMode;
use mk_domain::tool::ToolOutput;
use mk_memory::WriteMode;

use crate::session::{today, MemorySession};
use crate::tools::{
    self, MemoryReadArgs, MemorySearchArgs, MemoryWriteArgs, ReadTarget, ScratchpadAction,
    ScratchpadArgs, WriteTarget,
};

use super::ScratchpadCommand;

pub async fn context(session: &MemorySession, prompt: Option<&str>, report: bool) -> anyhow::Result<()> {
    session.on_session_start().await;
    let (block, build_report) = session
        .memory_context(prompt.unwrap_or_default(), today())
        .await;
    if report {
        println!("{}", serde_json::to_string_pretty(&build_report)?);
    } else if !block.is_empty() {
        println!("{block}");
    }
    Ok(())
}

pub async fn write(
    session: &MemorySession,
    content: String,
    target: WriteTarget,
    overwrite: bool,
) -> anyhow::Result<()> {
    if overwrite && target == WriteTarget::Daily {
        bail!("--overwrite only applies to long-term memory");
    }
    let mode = if overwrite {
        WriteMode::Overwrite
    } else {
        WriteMode::Append
    };
    session.on_session_start().await;
    let out = tools::memory_write(session, MemoryWriteArgs { target, content, mode })?;
    print_output(&out);
    session.flush_reindex().await;
    Ok(())
}

pub fn read(session: &MemorySession, target: ReadTarget, date: Option<String>) -> anyhow::Result<()> {
    let out = tools::memory_read(session, MemoryReadArgs { target, date })?;
    print_output(&out);
    Ok(())
}

pub async fn scratchpad(session: &MemorySession, command: ScratchpadCommand) -> anyhow::Result<()> {
    let (action, text) = match command {
        ScratchpadCommand::Add { text } => (ScratchpadAction::Add, Some(text)),
        ScratchpadCommand::Done { text } => (ScratchpadAction::Done, Some(text)),
        ScratchpadCommand::Undo { text } => (ScratchpadAction::Undo, Some(text)),
        ScratchpadCommand::ClearDone => (ScratchpadAction::ClearDone, None),
        ScratchpadCommand::List => (ScratchpadAction::List, None),
    };
    if action != ScratchpadAction::List {
        session.on_session_start().await;
    }
    let out = tools::scratchpad(session, ScratchpadArgs { action, text })?;
    print_output(&out);
    session.flush_reindex().await;
    Ok(())
}

pub async fn search(
    session: &MemorySession,
    query: String,
    mode: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let mode = match mode.as_deref() {
        Some(raw) => Some(
            SearchMode::parse(raw)
                .with_context(|| format!("unknown search mode {raw:?} (keyword, semantic, hybrid)"))?,
        ),
        None => None,
    };
    session.on_session_start().await;
    let out = tools::memory_search(session, MemorySearchArgs { query, mode, limit }).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&out.details)?);
    } else {
        print_output(&out);
    }
    Ok(())
}

pub async fn handoff(session: &MemorySession) -> anyhow::Result<()> {
    session.on_session_start().await;
    if session.before_compaction(session.id()).await? {
        println!("Handoff written to today's log.");
    } else {
        println!("Nothing to hand off.");
    }
    session.flush_reindex().await;
    Ok(())
}

fn print_output(out: &ToolOutput) {
    if out.is_error {
        eprintln!("{}", out.text);
    } else {
        println!("{}", out.text);
    }
}
