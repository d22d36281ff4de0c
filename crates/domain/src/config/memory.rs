use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Backing store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Directory holding MEMORY.md, SCRATCHPAD.md and `daily/`.
    #[serde(default = "d_memory_dir")]
    pub dir: PathBuf,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dir: d_memory_dir(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handoff (pre-compaction snapshot)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Maximum open scratchpad items copied into the handoff.
    #[serde(default = "d_20")]
    pub max_open_items: usize,
    /// Number of trailing lines of today's log copied into the handoff.
    #[serde(default = "d_15")]
    pub log_tail_lines: usize,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            max_open_items: 20,
            log_tail_lines: 15,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_memory_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".memkeep").join("memory"),
        None => PathBuf::from("./memory"),
    }
}
fn d_20() -> usize {
    20
}
fn d_15() -> usize {
    15
}
