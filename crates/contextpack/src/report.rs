use serde::{Deserialize, Serialize};

use crate::truncation::TruncationMode;

/// The five memory sources, in injection (= priority) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Scratchpad,
    Today,
    Search,
    LongTerm,
    Yesterday,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 5] = [
        SectionKind::Scratchpad,
        SectionKind::Today,
        SectionKind::Search,
        SectionKind::LongTerm,
        SectionKind::Yesterday,
    ];

    pub fn mode(&self) -> TruncationMode {
        match self {
            Self::Scratchpad | Self::Search => TruncationMode::KeepStart,
            Self::Today | Self::Yesterday => TruncationMode::KeepEnd,
            Self::LongTerm => TruncationMode::KeepMiddle,
        }
    }
}

/// Per-section report within a memory context build.
#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub kind: SectionKind,
    pub label: String,
    pub mode: TruncationMode,
    pub total_lines: usize,
    pub total_chars: usize,
    pub preview_lines: usize,
    pub preview_chars: usize,
    pub truncated: bool,
}

/// Full report of a memory context build, printed by `memkeep context --report`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextReport {
    pub sections: Vec<SectionReport>,
    pub search_chars: usize,
    /// Length of the joined sections before the overall cap.
    pub assembled_chars: usize,
    /// Length of the returned block.
    pub total_chars: usize,
    pub overall_truncated: bool,
}
