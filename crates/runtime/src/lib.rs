//! `mk-runtime`: wires the memory engine into a host agent session and
//! exposes it as model tools and as the `memkeep` CLI.

pub mod cli;
pub mod session;
pub mod tools;

pub use session::MemorySession;
