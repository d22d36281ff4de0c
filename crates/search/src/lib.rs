//! External search integration for memkeep.
//!
//! The search tool is a subprocess (`qmd` by default) that indexes the
//! memory directory and prints ranked snippets:
//! - [`normalize`]: turn its noisy stdout into [`SearchSnippet`]s
//! - [`backend`]: the [`SearchBackend`] seam and the CLI implementation
//! - [`handle`]: per-session availability state around a backend
//! - [`relevance`]: per-turn query sanitizing and the never-failing search
//! - [`debounce`]: coalesce bursts of writes into one reindex

pub mod backend;
pub mod debounce;
pub mod error;
pub mod handle;
pub mod normalize;
pub mod relevance;

pub use backend::{QmdCli, SearchBackend};
pub use debounce::Reindexer;
pub use error::SearchError;
pub use handle::SearchHandle;
pub use normalize::{format_snippets, normalize_output, SearchSnippet};
pub use relevance::{sanitize_query, search_relevant_memories};
