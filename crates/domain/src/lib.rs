//! Shared domain types for memkeep: configuration, the common error type,
//! the tool-call surface, and structured trace events.

pub mod config;
pub mod error;
pub mod tool;
pub mod trace;
