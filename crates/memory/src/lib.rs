//! `mk-memory`: the flat-file backing store for memkeep.
//!
//! Three kinds of plain-text blobs live under one directory:
//!
//! | File                   | Shape                                     |
//! |------------------------|-------------------------------------------|
//! | `MEMORY.md`            | free-form long-term notes                 |
//! | `SCRATCHPAD.md`        | checklist, see [`scratchpad`]             |
//! | `daily/YYYY-MM-DD.md`  | append-only daily log                     |
//!
//! Every mutation reads the whole blob, edits it in memory, and rewrites
//! it. There is no locking; the host serializes tool calls per session.

pub mod handoff;
pub mod scratchpad;
pub mod store;

pub use handoff::write_handoff;
pub use scratchpad::{parse_scratchpad, serialize_scratchpad, Scratchpad, ScratchpadItem};
pub use store::{MemorySources, MemoryStore, WriteMode};
