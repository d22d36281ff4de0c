use serde::{Deserialize, Serialize};

/// Inserted between head and tail by [`TruncationMode::KeepMiddle`].
pub const TRUNCATION_MARKER: &str = "... (truncated) ...";

/// Below this many chars a middle cut is not attempted.
const MIN_MIDDLE_CHARS: i64 = 10;

/// Which part of over-budget content survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationMode {
    /// Keep the beginning.
    KeepStart,
    /// Keep the end (logs: newest entries are last).
    KeepEnd,
    /// Keep both ends around [`TRUNCATION_MARKER`].
    KeepMiddle,
}

/// Result of applying a line cap and then a char cap to one section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewResult {
    pub preview: String,
    pub truncated: bool,
    pub total_lines: usize,
    pub total_chars: usize,
    pub preview_lines: usize,
    pub preview_chars: usize,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Line budget
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cap `lines` at `max_lines`. A limit of zero or less means no limit.
pub fn truncate_lines<'a>(
    lines: &[&'a str],
    max_lines: i64,
    mode: TruncationMode,
) -> (Vec<&'a str>, bool) {
    if max_lines <= 0 || lines.len() as i64 <= max_lines {
        return (lines.to_vec(), false);
    }
    let max = max_lines as usize;
    let kept = match mode {
        TruncationMode::KeepStart => lines[..max].to_vec(),
        TruncationMode::KeepEnd => lines[lines.len() - max..].to_vec(),
        TruncationMode::KeepMiddle => middle_lines(lines, max),
    };
    (kept, true)
}

/// One slot goes to the marker line; head gets the extra line when the
/// remainder is odd.
fn middle_lines<'a>(lines: &[&'a str], max: usize) -> Vec<&'a str> {
    let keep = max - 1;
    if keep == 0 {
        return lines[..max].to_vec();
    }
    let head = keep.div_ceil(2);
    let tail = keep / 2;

    let mut out = Vec::with_capacity(max);
    out.extend_from_slice(&lines[..head]);
    out.push(TRUNCATION_MARKER);
    out.extend_from_slice(&lines[lines.len() - tail..]);
    out
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Char budget
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cap `text` at `max_chars` Unicode scalar values. A limit of zero or less
/// means no limit.
pub fn truncate_text(text: &str, max_chars: i64, mode: TruncationMode) -> (String, bool) {
    let total = text.chars().count();
    if max_chars <= 0 || total as i64 <= max_chars {
        return (text.to_string(), false);
    }
    let max = max_chars as usize;
    let kept = match mode {
        TruncationMode::KeepStart => char_prefix(text, max).to_string(),
        TruncationMode::KeepEnd => char_suffix(text, total, max).to_string(),
        TruncationMode::KeepMiddle => middle_text(text, total, max_chars),
    };
    (kept, true)
}

fn middle_text(text: &str, total: usize, max_chars: i64) -> String {
    let keep = max_chars - TRUNCATION_MARKER.chars().count() as i64;
    if keep <= 0 || max_chars <= MIN_MIDDLE_CHARS {
        return char_prefix(text, max_chars as usize).to_string();
    }
    let keep = keep as usize;
    let head = keep.div_ceil(2);
    let tail = keep / 2;
    format!(
        "{}{TRUNCATION_MARKER}{}",
        char_prefix(text, head),
        char_suffix(text, total, tail)
    )
}

fn char_prefix(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn char_suffix(text: &str, total: usize, n: usize) -> &str {
    if n >= total {
        return text;
    }
    match text.char_indices().nth(total - n) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Preview
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trim `content`, apply the line cap, then the char cap to what the line
/// cap left.
///
/// Whitespace-only content yields an all-zero result.
pub fn build_preview(
    content: &str,
    mode: TruncationMode,
    max_lines: i64,
    max_chars: i64,
) -> PreviewResult {
    let normalized = content.replace("\r\n", "\n");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return PreviewResult::default();
    }

    let lines: Vec<&str> = trimmed.split('\n').collect();
    let (kept, lines_cut) = truncate_lines(&lines, max_lines, mode);
    let (preview, chars_cut) = truncate_text(&kept.join("\n"), max_chars, mode);

    let preview_lines = if preview.is_empty() {
        0
    } else {
        preview.split('\n').count()
    };
    let preview_chars = preview.chars().count();

    PreviewResult {
        truncated: lines_cut || chars_cut,
        total_lines: lines.len(),
        total_chars: trimmed.chars().count(),
        preview_lines,
        preview_chars,
        preview,
    }
}
