use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// External search tool
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which retrieval mode of the external tool to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// BM25-style keyword search. Fast, no embeddings needed.
    #[default]
    Keyword,
    /// Vector similarity search.
    Semantic,
    /// Keyword + vector with reranking. Slowest.
    Hybrid,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" | "search" | "bm25" => Some(Self::Keyword),
            "semantic" | "vsearch" | "vector" => Some(Self::Semantic),
            "hybrid" | "query" | "deep" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Master switch; when false no subprocess is ever spawned.
    #[serde(default = "d_true")]
    pub enabled: bool,
    /// Executable of the external search tool.
    #[serde(default = "d_command")]
    pub command: String,
    /// Collection / index name the memory directory is registered under.
    #[serde(default = "d_collection")]
    pub collection: String,
    /// Mode used for per-turn relevance injection.
    #[serde(default)]
    pub auto_mode: SearchMode,
    /// Result limit for per-turn relevance injection.
    #[serde(default = "d_3")]
    pub auto_limit: usize,
    /// Timeout for the per-turn relevance search.
    #[serde(default = "d_3000")]
    pub auto_timeout_ms: u64,
    /// Prompts are clipped to this many chars before being used as a query.
    #[serde(default = "d_200")]
    pub max_query_chars: usize,
    /// Default result limit for the explicit search tool.
    #[serde(default = "d_5")]
    pub tool_limit: usize,
    /// Timeout for explicit searches and maintenance commands.
    #[serde(default = "d_30000")]
    pub tool_timeout_ms: u64,
    /// Quiet period before a burst of writes triggers one reindex.
    #[serde(default = "d_500")]
    pub reindex_debounce_ms: u64,
    /// Also refresh embeddings after the keyword index update.
    #[serde(default)]
    pub embed_on_reindex: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: d_command(),
            collection: d_collection(),
            auto_mode: SearchMode::Keyword,
            auto_limit: 3,
            auto_timeout_ms: 3_000,
            max_query_chars: 200,
            tool_limit: 5,
            tool_timeout_ms: 30_000,
            reindex_debounce_ms: 500,
            embed_on_reindex: false,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_true() -> bool {
    true
}
fn d_command() -> String {
    "qmd".into()
}
fn d_collection() -> String {
    "memkeep".into()
}
fn d_3() -> usize {
    3
}
fn d_5() -> usize {
    5
}
fn d_200() -> usize {
    200
}
fn d_500() -> u64 {
    500
}
fn d_3000() -> u64 {
    3_000
}
fn d_30000() -> u64 {
    30_000
}
