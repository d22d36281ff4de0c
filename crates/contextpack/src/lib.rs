//! `mk-contextpack`: budgeted assembly of the memory block injected into
//! the agent's system prompt each turn.
//!
//! [`truncation`] holds the line/char budget primitives, [`builder`] the
//! five-section assembly with its overall cap, [`injection`] the text
//! layout, and [`report`] the machine-readable summary of a build.

pub mod builder;
pub mod injection;
pub mod report;
pub mod truncation;

pub use builder::{build_memory_context, ContentSection, MemoryContextBuilder};
pub use report::{ContextReport, SectionKind, SectionReport};
pub use truncation::{build_preview, truncate_lines, truncate_text, PreviewResult, TruncationMode};
