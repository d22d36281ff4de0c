//! Scratchpad checklist format.
//!
//! ```text
//! # Scratchpad
//!
//! <!-- 2026-03-01 09:12:44 [sess-1] -->
//! - [ ] Fix flaky login test
//! - [x] Ship release notes
//! ```
//!
//! An item is a line of exactly `- [ ] text`, `- [x] text` or `- [X] text`.
//! A whole-line HTML comment directly above an item is that item's `meta`.
//! Everything else (headings, prose, plain bullets) is ignored on parse.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;

pub const SCRATCHPAD_TITLE: &str = "# Scratchpad";

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[([ xX])\] (.*)$").expect("item pattern is valid"));
static META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<!--.*-->$").expect("meta pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScratchpadItem {
    pub done: bool,
    pub text: String,
    /// Whole-line `<!-- ... -->` comment preceding the item, or empty.
    pub meta: String,
}

impl ScratchpadItem {
    pub fn open(text: impl Into<String>, meta: impl Into<String>) -> Self {
        Self {
            done: false,
            text: text.into(),
            meta: meta.into(),
        }
    }

    /// The checkbox line without meta.
    pub fn checkbox_line(&self) -> String {
        let mark = if self.done { 'x' } else { ' ' };
        format!("- [{mark}] {}", self.text)
    }
}

/// Parse a scratchpad blob into items, in file order.
pub fn parse_scratchpad(content: &str) -> Vec<ScratchpadItem> {
    let lines: Vec<&str> = content.lines().collect();
    let mut items = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = ITEM_RE.captures(line) else {
            continue;
        };
        let done = !caps[1].trim().is_empty();
        let text = caps[2].to_string();
        let meta = match i.checked_sub(1).map(|p| lines[p]) {
            Some(prev) if META_RE.is_match(prev) => prev.to_string(),
            _ => String::new(),
        };
        items.push(ScratchpadItem { done, text, meta });
    }

    items
}

/// Serialize items under the scratchpad title, one trailing newline.
pub fn serialize_scratchpad(items: &[ScratchpadItem]) -> String {
    let mut lines: Vec<String> = vec![SCRATCHPAD_TITLE.to_string(), String::new()];
    for item in items {
        if !item.meta.is_empty() {
            lines.push(item.meta.clone());
        }
        lines.push(item.checkbox_line());
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// `<!-- YYYY-MM-DD HH:MM:SS [session] -->` tag used for new entries.
pub fn meta_comment(now: NaiveDateTime, session_id: &str) -> String {
    let session: String = session_id
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .replace("-->", "");
    format!("<!-- {} [{}] -->", now.format("%Y-%m-%d %H:%M:%S"), session.trim())
}

fn single_line(text: &str) -> String {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory checklist
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A parsed scratchpad that mutation operations act on before it is
/// written back wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scratchpad {
    pub items: Vec<ScratchpadItem>,
}

impl Scratchpad {
    pub fn parse(content: &str) -> Self {
        Self {
            items: parse_scratchpad(content),
        }
    }

    pub fn serialize(&self) -> String {
        serialize_scratchpad(&self.items)
    }

    /// Append a new unchecked item. Line breaks in `text` collapse to single
    /// spaces so one item always stays one line.
    pub fn add(&mut self, text: &str, meta: String) -> &ScratchpadItem {
        self.items.push(ScratchpadItem::open(single_line(text), meta));
        &self.items[self.items.len() - 1]
    }

    /// Flip the first item whose state is the opposite of `done` and whose
    /// text contains `needle` (case-insensitive). Only one item changes.
    pub fn set_done(&mut self, needle: &str, done: bool) -> Option<&ScratchpadItem> {
        let needle = needle.trim().to_lowercase();
        let idx = self
            .items
            .iter()
            .position(|item| item.done != done && item.text.to_lowercase().contains(&needle))?;
        self.items[idx].done = done;
        Some(&self.items[idx])
    }

    /// Remove all checked items, keeping the rest in order. Returns how
    /// many were removed.
    pub fn clear_done(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.done);
        before - self.items.len()
    }

    pub fn open_items(&self) -> Vec<ScratchpadItem> {
        self.items.iter().filter(|item| !item.done).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
