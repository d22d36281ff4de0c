use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde_json::json;

use mk_domain::config::{Config, SearchMode};
use mk_domain::tool::ToolOutput;
use mk_runtime::tools::{self, dispatch_tool, tool_definitions};
use mk_runtime::MemorySession;
use mk_search::{SearchBackend, SearchError, SearchSnippet};

#[derive(Default)]
struct FakeBackend {
    offline: bool,
    hits: Vec<SearchSnippet>,
    queries: Mutex<Vec<(SearchMode, String, usize)>>,
    updates: AtomicUsize,
}

#[async_trait]
impl SearchBackend for FakeBackend {
    async fn status(&self) -> bool {
        !self.offline
    }

    async fn has_collection(&self) -> Result<bool, SearchError> {
        Ok(true)
    }

    async fn ensure_collection(&self) -> Result<(), SearchError> {
        Ok(())
    }

    async fn search(
        &self,
        mode: SearchMode,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchSnippet>, SearchError> {
        self.queries.lock().push((mode, query.to_string(), limit));
        Ok(self.hits.clone())
    }

    async fn update(&self, _embed: bool) -> Result<(), SearchError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn session_with(backend: FakeBackend) -> (tempfile::TempDir, Arc<FakeBackend>, MemorySession) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.memory.dir = dir.path().join("memory");
    let backend = Arc::new(backend);
    let session = MemorySession::new("test-session", config, backend.clone());
    (dir, backend, session)
}

fn offline() -> FakeBackend {
    FakeBackend {
        offline: true,
        ..Default::default()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn pad(session: &MemorySession, args: serde_json::Value) -> ToolOutput {
    dispatch_tool(session, "scratchpad", &args).await
}

async fn read(session: &MemorySession, target: &str) -> ToolOutput {
    dispatch_tool(session, "memory_read", &json!({ "target": target })).await
}

// ── Lifecycle hooks ─────────────────────────────────────────────────

#[tokio::test]
async fn empty_memory_leaves_prompt_alone() {
    let (_dir, _, session) = session_with(offline());
    session.on_session_start().await;
    assert_eq!(session.before_turn("hello", "SYSTEM").await, None);
}

#[tokio::test]
async fn written_memory_is_appended_to_system_prompt() {
    let (_dir, _, session) = session_with(offline());
    session.on_session_start().await;

    let out = dispatch_tool(
        &session,
        "memory_write",
        &json!({ "content": "Remember dark mode" }),
    )
    .await;
    assert!(!out.is_error, "{}", out.text);

    let prompt = session.before_turn("what theme?", "SYSTEM").await.unwrap();
    assert!(prompt.starts_with("SYSTEM\n\n# Memory"));
    assert!(prompt.contains("Remember dark mode"));
    assert!(prompt.contains("<!-- "), "append carries a meta comment");
}

#[tokio::test]
async fn relevance_hits_land_in_the_search_section() {
    let (_dir, backend, session) = session_with(FakeBackend {
        hits: vec![SearchSnippet {
            path: Some("MEMORY.md".into()),
            score: Some(0.8),
            title: None,
            content: "User prefers tabs".into(),
        }],
        ..Default::default()
    });
    assert!(session.on_session_start().await);

    let prompt = session.before_turn("tabs or spaces?", "SYS").await.unwrap();
    assert!(prompt.contains("## Relevant memories"));
    assert!(prompt.contains("MEMORY.md\nUser prefers tabs"));

    let queries = backend.queries.lock();
    assert_eq!(queries[0], (SearchMode::Keyword, "tabs or spaces?".to_string(), 3));
}

#[tokio::test]
async fn compaction_hands_off_open_items_and_schedules_reindex() {
    let (_dir, backend, session) = session_with(FakeBackend::default());
    session.on_session_start().await;

    assert!(!session.before_compaction("s1").await.unwrap());

    dispatch_tool(&session, "scratchpad", &json!({ "action": "add", "text": "Fix bug" })).await;
    session.on_session_end();
    assert!(!session.reindex_pending());

    assert!(session.before_compaction("s1").await.unwrap());
    assert!(session.reindex_pending());

    let log = session.store().read_daily(today()).unwrap().unwrap();
    assert!(log.contains("HANDOFF"));
    assert!(log.contains("## Session Handoff"));
    assert!(log.contains("- [ ] Fix bug"));

    assert!(session.flush_reindex().await);
    assert_eq!(backend.updates.load(Ordering::SeqCst), 1);

    let prompt = session.before_turn("", "SYS").await.unwrap();
    assert!(prompt.contains("Session Handoff"));
}

#[tokio::test]
async fn session_end_cancels_pending_reindex() {
    let (_dir, backend, session) = session_with(FakeBackend::default());
    session.on_session_start().await;
    dispatch_tool(&session, "memory_write", &json!({ "content": "a", "target": "daily" })).await;
    assert!(session.reindex_pending());

    session.on_session_end();
    assert!(!session.reindex_pending());
    assert!(!session.flush_reindex().await);
    assert_eq!(backend.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn offline_search_never_schedules_reindex() {
    let (_dir, _, session) = session_with(offline());
    session.on_session_start().await;
    dispatch_tool(&session, "memory_write", &json!({ "content": "a" })).await;
    assert!(!session.reindex_pending());
}

// ── Tools ───────────────────────────────────────────────────────────

#[test]
fn definitions_cover_every_tool() {
    let names: Vec<String> = tool_definitions().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["memory_write", "memory_read", "scratchpad", "memory_search"]);
}

#[tokio::test]
async fn scratchpad_flow() {
    let (_dir, _, session) = session_with(offline());
    pad(&session, json!({ "action": "add", "text": "Write tests" })).await;
    pad(&session, json!({ "action": "add", "text": "Write docs" })).await;

    let done = pad(&session, json!({ "action": "done", "text": "WRITE" })).await;
    assert_eq!(done.text, "Done: Write tests");
    assert_eq!(done.details["open"], 1);

    let list = pad(&session, json!({ "action": "list" })).await;
    assert_eq!(list.text, "- [x] Write tests\n- [ ] Write docs");

    let missing = pad(&session, json!({ "action": "undo", "text": "docs" })).await;
    assert!(!missing.is_error);
    assert_eq!(missing.details["changed"], false);

    let cleared = pad(&session, json!({ "action": "clear_done" })).await;
    assert_eq!(cleared.text, "Removed 1 completed item(s).");

    let raw = session.store().read_scratchpad().unwrap().unwrap();
    assert!(raw.starts_with("# Scratchpad\n\n<!-- "));
    assert!(raw.contains("[test-session] -->\n- [ ] Write docs\n"));
    assert!(!raw.contains("Write tests"));
}

#[tokio::test]
async fn scratchpad_add_requires_text() {
    let (_dir, _, session) = session_with(offline());
    let out = dispatch_tool(&session, "scratchpad", &json!({ "action": "add" })).await;
    assert!(out.is_error);
    assert!(out.text.contains("text is required"));
}

#[tokio::test]
async fn bad_calls_become_error_outputs() {
    let (_dir, _, session) = session_with(offline());
    assert!(dispatch_tool(&session, "nope", &json!({})).await.is_error);
    assert!(dispatch_tool(&session, "memory_read", &json!({ "target": "everything" })).await.is_error);
    assert!(dispatch_tool(&session, "memory_write", &json!({ "content": "  " })).await.is_error);
    let bad_date = dispatch_tool(&session, "memory_read", &json!({ "target": "daily", "date": "03/01/2026" })).await;
    assert!(bad_date.is_error);
}

#[tokio::test]
async fn read_targets() {
    let (_dir, _, session) = session_with(offline());
    assert_eq!(read(&session, "long_term").await.text, "Long-term memory is empty.");
    assert_eq!(read(&session, "list").await.text, "No daily logs yet.");

    tools::memory_write(
        &session,
        serde_json::from_value(json!({ "content": "logged", "target": "daily" })).unwrap(),
    )
    .unwrap();
    session
        .store()
        .append_daily(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), "old", "")
        .unwrap();

    let list = read(&session, "list").await;
    assert_eq!(
        list.text,
        format!("{}\n2020-01-01", today().format("%Y-%m-%d"))
    );
    assert!(read(&session, "daily").await.text.contains("logged"));

    let old = dispatch_tool(&session, "memory_read", &json!({ "target": "daily", "date": "2020-01-01" })).await;
    assert!(old.text.starts_with("# Daily log: 2020-01-01"));
}

#[tokio::test]
async fn overwrite_replaces_long_term() {
    let (_dir, _, session) = session_with(offline());
    dispatch_tool(&session, "memory_write", &json!({ "content": "first" })).await;
    let out = dispatch_tool(
        &session,
        "memory_write",
        &json!({ "content": "second", "mode": "overwrite" }),
    )
    .await;
    assert_eq!(out.text, "Overwrote MEMORY.md");
    assert_eq!(session.store().read_long_term().unwrap().unwrap(), "second\n");
}

#[tokio::test]
async fn search_tool_explains_when_unavailable() {
    let (_dir, backend, session) = session_with(offline());
    session.on_session_start().await;
    let out = dispatch_tool(&session, "memory_search", &json!({ "query": "theme" })).await;
    assert!(!out.is_error);
    assert!(out.text.contains("unavailable"));
    assert!(out.text.contains("`qmd`"));
    assert_eq!(out.details["available"], false);
    assert!(backend.queries.lock().is_empty());
}

#[tokio::test]
async fn search_tool_passes_mode_and_limit() {
    let (_dir, backend, session) = session_with(FakeBackend::default());
    session.on_session_start().await;

    let out = dispatch_tool(
        &session,
        "memory_search",
        &json!({ "query": "deploy\nsteps", "mode": "hybrid", "limit": 7 }),
    )
    .await;
    assert_eq!(out.text, "No matching memories.");
    assert_eq!(
        backend.queries.lock()[0],
        (SearchMode::Hybrid, "deploy steps".to_string(), 7)
    );

    dispatch_tool(&session, "memory_search", &json!({ "query": "x" })).await;
    assert_eq!(backend.queries.lock()[1].2, 5);
}
