use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use mk_domain::error::Result;
use mk_domain::trace::TraceEvent;

use crate::scratchpad::Scratchpad;

pub const LONG_TERM_FILE: &str = "MEMORY.md";
pub const SCRATCHPAD_FILE: &str = "SCRATCHPAD.md";
pub const DAILY_DIR: &str = "daily";

/// How a write to a free-form blob combines with existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    #[default]
    Append,
    Overwrite,
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Overwrite => "overwrite",
        }
    }
}

/// Fresh reads of the four backing blobs for one assembly pass.
///
/// `None` covers missing, unreadable and whitespace-only files alike.
#[derive(Debug, Clone, Default)]
pub struct MemorySources {
    pub scratchpad: Option<String>,
    pub today: Option<String>,
    pub long_term: Option<String>,
    pub yesterday: Option<String>,
}

/// Flat-file memory directory.
pub struct MemoryStore {
    dir: PathBuf,
}

impl MemoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn long_term_path(&self) -> PathBuf {
        self.dir.join(LONG_TERM_FILE)
    }

    pub fn scratchpad_path(&self) -> PathBuf {
        self.dir.join(SCRATCHPAD_FILE)
    }

    pub fn daily_dir(&self) -> PathBuf {
        self.dir.join(DAILY_DIR)
    }

    pub fn daily_path(&self, date: NaiveDate) -> PathBuf {
        self.daily_dir().join(format!("{}.md", date.format("%Y-%m-%d")))
    }

    /// Create the memory directory and `daily/` if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.daily_dir())?;
        Ok(())
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub fn read_long_term(&self) -> Result<Option<String>> {
        read_optional(&self.long_term_path())
    }

    pub fn read_scratchpad(&self) -> Result<Option<String>> {
        read_optional(&self.scratchpad_path())
    }

    pub fn read_daily(&self, date: NaiveDate) -> Result<Option<String>> {
        read_optional(&self.daily_path(date))
    }

    /// Dates that have a daily log, newest first.
    pub fn list_daily(&self) -> Result<Vec<NaiveDate>> {
        let entries = match std::fs::read_dir(self.daily_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dates: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let stem = name.to_str()?.strip_suffix(".md")?;
                NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
            })
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    /// Read all sources the context builder consumes.
    ///
    /// Never fails: a source that cannot be read is logged and treated as
    /// absent.
    pub fn load_sources(&self, today: NaiveDate) -> MemorySources {
        let yesterday = today.pred_opt().unwrap_or(today);
        MemorySources {
            scratchpad: read_source(&self.scratchpad_path()),
            today: read_source(&self.daily_path(today)),
            long_term: read_source(&self.long_term_path()),
            yesterday: read_source(&self.daily_path(yesterday)),
        }
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Write to MEMORY.md. Appends get the `meta` comment as a separator.
    pub fn write_long_term(&self, content: &str, mode: WriteMode, meta: &str) -> Result<()> {
        self.ensure_dirs()?;
        let path = self.long_term_path();
        let body = match mode {
            WriteMode::Overwrite => ensure_trailing_newline(content.trim_end()),
            WriteMode::Append => {
                let existing = read_optional(&path)?.unwrap_or_default();
                append_entry(&existing, content, meta)
            }
        };
        std::fs::write(&path, &body)?;

        TraceEvent::MemoryWritten {
            target: "long_term".into(),
            mode: mode.as_str().into(),
            chars: content.chars().count(),
        }
        .emit();
        Ok(())
    }

    /// Append an entry to the daily log for `date`, creating it with a
    /// heading if needed.
    pub fn append_daily(&self, date: NaiveDate, content: &str, meta: &str) -> Result<()> {
        self.ensure_dirs()?;
        let path = self.daily_path(date);
        let existing = match read_optional(&path)? {
            Some(existing) => existing,
            None => format!("# Daily log: {}\n", date.format("%Y-%m-%d")),
        };
        std::fs::write(&path, append_entry(&existing, content, meta))?;

        TraceEvent::MemoryWritten {
            target: "daily".into(),
            mode: WriteMode::Append.as_str().into(),
            chars: content.chars().count(),
        }
        .emit();
        Ok(())
    }

    pub fn load_scratchpad(&self) -> Result<Scratchpad> {
        Ok(Scratchpad::parse(
            &self.read_scratchpad()?.unwrap_or_default(),
        ))
    }

    pub fn save_scratchpad(&self, pad: &Scratchpad) -> Result<()> {
        self.ensure_dirs()?;
        std::fs::write(self.scratchpad_path(), pad.serialize())?;
        Ok(())
    }

    /// Read-modify-write the scratchpad. The file is rewritten wholesale
    /// after `f` returns.
    pub fn mutate_scratchpad<T>(&self, f: impl FnOnce(&mut Scratchpad) -> T) -> Result<T> {
        let mut pad = self.load_scratchpad()?;
        let out = f(&mut pad);
        self.save_scratchpad(&pad)?;
        Ok(out)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_source(path: &Path) -> Option<String> {
    match read_optional(path) {
        Ok(Some(content)) if !content.trim().is_empty() => Some(content),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "memory source unreadable, skipping");
            TraceEvent::MemorySourceUnreadable {
                path: path.display().to_string(),
                error: e.to_string(),
            }
            .emit();
            None
        }
    }
}

fn append_entry(existing: &str, content: &str, meta: &str) -> String {
    let mut out = existing.trim_end().to_string();
    if !out.is_empty() {
        out.push_str("\n\n");
    }
    if !meta.is_empty() {
        out.push_str(meta);
        out.push('\n');
    }
    out.push_str(content.trim_end());
    out.push('\n');
    out
}

fn ensure_trailing_newline(s: &str) -> String {
    let mut out = s.to_string();
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_files_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        assert!(store.read_long_term().unwrap().is_none());
        assert!(store.read_daily(date(2026, 1, 1)).unwrap().is_none());
        assert!(store.list_daily().unwrap().is_empty());
    }

    #[test]
    fn load_sources_skips_blank_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        store.ensure_dirs().unwrap();
        std::fs::write(store.long_term_path(), "  \n\t\n").unwrap();
        std::fs::write(store.daily_path(date(2026, 3, 2)), "today stuff").unwrap();
        std::fs::write(store.daily_path(date(2026, 3, 1)), "yesterday stuff").unwrap();

        let sources = store.load_sources(date(2026, 3, 2));
        assert!(sources.long_term.is_none());
        assert!(sources.scratchpad.is_none());
        assert_eq!(sources.today.as_deref(), Some("today stuff"));
        assert_eq!(sources.yesterday.as_deref(), Some("yesterday stuff"));
    }

    #[test]
    fn unreadable_source_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        // A directory where a file is expected cannot be read as text.
        std::fs::create_dir_all(store.long_term_path()).unwrap();
        let sources = store.load_sources(date(2026, 3, 2));
        assert!(sources.long_term.is_none());
    }

    #[test]
    fn long_term_append_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());

        store
            .write_long_term("Remember dark mode", WriteMode::Append, "<!-- a -->")
            .unwrap();
        store
            .write_long_term("Prefers tabs", WriteMode::Append, "<!-- b -->")
            .unwrap();
        let content = store.read_long_term().unwrap().unwrap();
        assert_eq!(
            content,
            "<!-- a -->\nRemember dark mode\n\n<!-- b -->\nPrefers tabs\n"
        );

        store
            .write_long_term("fresh start\n\n", WriteMode::Overwrite, "<!-- c -->")
            .unwrap();
        assert_eq!(store.read_long_term().unwrap().unwrap(), "fresh start\n");
    }

    #[test]
    fn daily_append_creates_heading() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        let d = date(2026, 3, 2);

        store.append_daily(d, "first", "").unwrap();
        store.append_daily(d, "second", "<!-- m -->").unwrap();
        assert_eq!(
            store.read_daily(d).unwrap().unwrap(),
            "# Daily log: 2026-03-02\n\nfirst\n\n<!-- m -->\nsecond\n"
        );
    }

    #[test]
    fn list_daily_newest_first_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());
        store.ensure_dirs().unwrap();
        for name in ["2026-01-02.md", "2026-03-01.md", "notes.md", "2026-02-30.md"] {
            std::fs::write(store.daily_dir().join(name), "x").unwrap();
        }
        assert_eq!(
            store.list_daily().unwrap(),
            vec![date(2026, 3, 1), date(2026, 1, 2)]
        );
    }

    #[test]
    fn mutate_scratchpad_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path());

        store
            .mutate_scratchpad(|pad| {
                pad.add("Fix bug", String::new());
                pad.add("Ship release", "<!-- m -->".into());
            })
            .unwrap();
        let flipped = store
            .mutate_scratchpad(|pad| pad.set_done("ship", true).is_some())
            .unwrap();
        assert!(flipped);

        assert_eq!(
            store.read_scratchpad().unwrap().unwrap(),
            "# Scratchpad\n\n- [ ] Fix bug\n<!-- m -->\n- [x] Ship release\n"
        );
    }
}
