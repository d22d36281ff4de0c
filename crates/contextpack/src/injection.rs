use chrono::NaiveDate;

use crate::truncation::PreviewResult;

pub const MEMORY_HEADING: &str = "# Memory";
pub const SECTION_DIVIDER: &str = "\n\n---\n\n";

pub const SCRATCHPAD_LABEL: &str = "Open scratchpad items";
pub const SEARCH_LABEL: &str = "Relevant memories (auto-retrieved)";
pub const LONG_TERM_LABEL: &str = "MEMORY.md (long-term)";

/// Upper bound on the length of [`format_overall_notice`]'s output.
pub const OVERALL_NOTICE_MAX_CHARS: usize = 120;

pub fn today_label(date: NaiveDate) -> String {
    format!("Daily log: {} (today)", date.format("%Y-%m-%d"))
}

pub fn yesterday_label(date: NaiveDate) -> String {
    format!("Daily log: {} (yesterday)", date.format("%Y-%m-%d"))
}

/// Format one labelled section. Truncated sections carry a one-line note
/// with the surviving share.
pub fn format_section(label: &str, preview: &PreviewResult) -> String {
    let mut out = format!("## {label}\n\n{}", preview.preview);
    if preview.truncated {
        out.push_str(&format!(
            "\n\n[truncated: showing {} of {} lines, {} of {} chars]",
            preview.preview_lines, preview.total_lines, preview.preview_chars, preview.total_chars
        ));
    }
    out
}

/// Join rendered sections under the top-level heading.
///
/// No sections → empty string, never a bare heading.
pub fn assemble(sections: &[String]) -> String {
    if sections.is_empty() {
        return String::new();
    }
    format!("{MEMORY_HEADING}\n\n{}", sections.join(SECTION_DIVIDER))
}

/// Notice appended after the overall cap cut the block.
pub fn format_overall_notice(shown_chars: usize, total_chars: usize) -> String {
    format!("\n\n[... memory context truncated: showing {shown_chars} of {total_chars} chars ...]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sections_assemble_to_nothing() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn sections_are_divided() {
        let out = assemble(&["## A\n\na".into(), "## B\n\nb".into()]);
        assert_eq!(out, "# Memory\n\n## A\n\na\n\n---\n\n## B\n\nb");
    }

    #[test]
    fn truncation_note_only_when_truncated() {
        let mut p = PreviewResult {
            preview: "x".into(),
            truncated: false,
            total_lines: 1,
            total_chars: 1,
            preview_lines: 1,
            preview_chars: 1,
        };
        assert_eq!(format_section("L", &p), "## L\n\nx");
        p.truncated = true;
        p.total_lines = 9;
        assert!(format_section("L", &p).ends_with("[truncated: showing 1 of 9 lines, 1 of 1 chars]"));
    }

    #[test]
    fn notice_fits_its_allowance() {
        let notice = format_overall_notice(usize::MAX, usize::MAX);
        assert!(notice.chars().count() <= OVERALL_NOTICE_MAX_CHARS);
    }
}
