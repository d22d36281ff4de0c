use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Memory context budgets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Line and character caps for one injected section.
///
/// A cap of zero or less disables that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionBudget {
    pub max_lines: i64,
    pub max_chars: i64,
}

impl SectionBudget {
    pub const fn new(max_lines: i64, max_chars: i64) -> Self {
        Self {
            max_lines,
            max_chars,
        }
    }
}

/// Per-section budgets plus the overall cap for the assembled block.
///
/// The five section char caps are meant to sum comfortably below
/// `total_max_chars`; the overall pass is for pathological content only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "d_scratchpad")]
    pub scratchpad: SectionBudget,
    #[serde(default = "d_today")]
    pub today: SectionBudget,
    #[serde(default = "d_search")]
    pub search: SectionBudget,
    #[serde(default = "d_long_term")]
    pub long_term: SectionBudget,
    #[serde(default = "d_yesterday")]
    pub yesterday: SectionBudget,
    #[serde(default = "d_16000")]
    pub total_max_chars: i64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            scratchpad: d_scratchpad(),
            today: d_today(),
            search: d_search(),
            long_term: d_long_term(),
            yesterday: d_yesterday(),
            total_max_chars: 16_000,
        }
    }
}

impl ContextConfig {
    /// Sum of the five per-section character caps (unbounded caps count as 0).
    pub fn section_chars_sum(&self) -> i64 {
        [
            self.scratchpad,
            self.today,
            self.search,
            self.long_term,
            self.yesterday,
        ]
        .iter()
        .map(|b| b.max_chars.max(0))
        .sum()
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_scratchpad() -> SectionBudget {
    SectionBudget::new(50, 2_000)
}
fn d_today() -> SectionBudget {
    SectionBudget::new(40, 3_000)
}
fn d_search() -> SectionBudget {
    SectionBudget::new(40, 2_500)
}
fn d_long_term() -> SectionBudget {
    SectionBudget::new(50, 4_000)
}
fn d_yesterday() -> SectionBudget {
    SectionBudget::new(30, 2_000)
}
fn d_16000() -> i64 {
    16_000
}
