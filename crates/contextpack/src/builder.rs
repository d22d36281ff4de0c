use chrono::NaiveDate;

use mk_domain::config::{ContextConfig, SectionBudget};
use mk_domain::trace::TraceEvent;
use mk_memory::scratchpad::{parse_scratchpad, serialize_scratchpad, ScratchpadItem};
use mk_memory::{MemorySources, MemoryStore};

use crate::injection;
use crate::report::{ContextReport, SectionKind, SectionReport};
use crate::truncation::{self, PreviewResult, TruncationMode};

/// One labelled source awaiting its per-section budget pass.
#[derive(Debug, Clone)]
pub struct ContentSection {
    pub kind: SectionKind,
    pub label: String,
    pub raw_content: String,
    pub mode: TruncationMode,
    pub max_lines: i64,
    pub max_chars: i64,
}

impl ContentSection {
    pub fn new(kind: SectionKind, label: String, raw_content: String, budget: SectionBudget) -> Self {
        Self {
            kind,
            label,
            raw_content,
            mode: kind.mode(),
            max_lines: budget.max_lines,
            max_chars: budget.max_chars,
        }
    }

    pub fn preview(&self) -> PreviewResult {
        truncation::build_preview(&self.raw_content, self.mode, self.max_lines, self.max_chars)
    }
}

/// Deterministic memory context builder.
///
/// Pure function over pre-read sources: accepts the backing blobs and an
/// already-computed search string, returns the block to inject plus a
/// machine-readable report.
pub struct MemoryContextBuilder {
    config: ContextConfig,
}

impl MemoryContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Collect the non-empty sections in injection order.
    pub fn sections(
        &self,
        sources: &MemorySources,
        search_results: Option<&str>,
        today: NaiveDate,
    ) -> Vec<ContentSection> {
        let yesterday = today.pred_opt().unwrap_or(today);
        let mut sections = Vec::new();

        if let Some(open) = sources.scratchpad.as_deref().and_then(open_items_blob) {
            sections.push(ContentSection::new(
                SectionKind::Scratchpad,
                injection::SCRATCHPAD_LABEL.into(),
                open,
                self.config.scratchpad,
            ));
        }

        if let Some(log) = non_blank(sources.today.as_deref()) {
            sections.push(ContentSection::new(
                SectionKind::Today,
                injection::today_label(today),
                log.to_string(),
                self.config.today,
            ));
        }

        if let Some(results) = non_blank(search_results) {
            sections.push(ContentSection::new(
                SectionKind::Search,
                injection::SEARCH_LABEL.into(),
                results.to_string(),
                self.config.search,
            ));
        }

        if let Some(memory) = non_blank(sources.long_term.as_deref()) {
            sections.push(ContentSection::new(
                SectionKind::LongTerm,
                injection::LONG_TERM_LABEL.into(),
                memory.to_string(),
                self.config.long_term,
            ));
        }

        if let Some(log) = non_blank(sources.yesterday.as_deref()) {
            sections.push(ContentSection::new(
                SectionKind::Yesterday,
                injection::yesterday_label(yesterday),
                log.to_string(),
                self.config.yesterday,
            ));
        }

        sections
    }

    /// Build the memory block.
    ///
    /// Returns an empty string when no source contributes. When the joined
    /// sections exceed `total_max_chars`, the whole block is cut from the
    /// end, so the last (lowest-priority) sections go first.
    pub fn build(
        &self,
        sources: &MemorySources,
        search_results: Option<&str>,
        today: NaiveDate,
    ) -> (String, ContextReport) {
        let mut rendered: Vec<String> = Vec::new();
        let mut reports: Vec<SectionReport> = Vec::new();

        for section in self.sections(sources, search_results, today) {
            let preview = section.preview();
            if preview.preview.is_empty() {
                continue;
            }
            rendered.push(injection::format_section(&section.label, &preview));
            reports.push(SectionReport {
                kind: section.kind,
                label: section.label,
                mode: section.mode,
                total_lines: preview.total_lines,
                total_chars: preview.total_chars,
                preview_lines: preview.preview_lines,
                preview_chars: preview.preview_chars,
                truncated: preview.truncated,
            });
        }

        let assembled = injection::assemble(&rendered);
        let assembled_chars = assembled.chars().count();
        let total_max = self.config.total_max_chars;

        let (output, overall_truncated) = if total_max > 0 && assembled_chars as i64 > total_max {
            tracing::debug!(assembled_chars, total_max, "memory context over overall cap");
            let (mut cut, _) =
                truncation::truncate_text(&assembled, total_max, TruncationMode::KeepStart);
            cut.push_str(&injection::format_overall_notice(
                total_max as usize,
                assembled_chars,
            ));
            (cut, true)
        } else {
            (assembled, false)
        };

        let report = ContextReport {
            search_chars: search_results.map(|s| s.trim().chars().count()).unwrap_or(0),
            assembled_chars,
            total_chars: output.chars().count(),
            overall_truncated,
            sections: reports,
        };

        TraceEvent::ContextBuilt {
            total_chars: report.total_chars,
            sections_included: report.sections.len(),
            sections_truncated: report.sections.iter().filter(|s| s.truncated).count(),
            search_chars: report.search_chars,
            overall_truncated,
        }
        .emit();

        (output, report)
    }
}

/// Read the store and build the memory block for `today`.
pub fn build_memory_context(
    store: &MemoryStore,
    config: &ContextConfig,
    search_results: Option<&str>,
    today: NaiveDate,
) -> String {
    let sources = store.load_sources(today);
    MemoryContextBuilder::new(config.clone())
        .build(&sources, search_results, today)
        .0
}

/// Re-serialize only the open items; `None` when there are none.
fn open_items_blob(scratchpad: &str) -> Option<String> {
    let open: Vec<ScratchpadItem> = parse_scratchpad(scratchpad)
        .into_iter()
        .filter(|item| !item.done)
        .collect();
    if open.is_empty() {
        return None;
    }
    Some(serialize_scratchpad(&open))
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}
