use std::path::Path;

use mk_domain::config::ConfigSeverity;
use mk_memory::store::MemoryStore;

use crate::session::MemorySession;

/// Print the state of the memory directory, the config and the search
/// tool. Returns `false` when a check failed.
pub async fn run(session: &MemorySession, config_path: &Path) -> anyhow::Result<bool> {
    println!("memkeep status");
    println!("==============\n");

    let mut all_passed = true;
    let store = session.store();

    check_config(session, config_path, &mut all_passed);
    check_memory_dir(store, &mut all_passed);
    report_files(store)?;
    check_search(session).await;

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }
    Ok(all_passed)
}

// ── Individual checks ─────────────────────────────────────────────────

fn check_config(session: &MemorySession, config_path: &Path, all_passed: &mut bool) {
    let exists = config_path.exists();
    print_check(
        "Config file",
        true,
        if exists {
            config_path.display().to_string()
        } else {
            format!("{} not found (using defaults)", config_path.display())
        },
    );

    let issues = session.config().validate();
    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    print_check(
        "Config validation",
        error_count == 0,
        format!("{} issue(s) ({error_count} error(s))", issues.len()),
    );
    for issue in &issues {
        println!("      {issue}");
    }
    if error_count > 0 {
        *all_passed = false;
    }
}

fn check_memory_dir(store: &MemoryStore, all_passed: &mut bool) {
    let dir = store.dir();
    let exists = dir.exists();
    let writable = exists && {
        let probe = dir.join(".memkeep_status_probe");
        let ok = std::fs::write(&probe, b"probe").is_ok();
        let _ = std::fs::remove_file(&probe);
        ok
    };

    let detail = match (exists, writable) {
        (true, true) => format!("{} (writable)", dir.display()),
        (true, false) => format!("{} (not writable)", dir.display()),
        _ => format!("{} (created on first write)", dir.display()),
    };
    print_check("Memory directory", !exists || writable, detail);
    if exists && !writable {
        *all_passed = false;
    }
}

fn report_files(store: &MemoryStore) -> anyhow::Result<()> {
    let long_term = store.read_long_term()?.unwrap_or_default();
    println!("  [INFO] Long-term memory: {} chars", long_term.chars().count());

    let pad = store.load_scratchpad()?;
    let open = pad.open_items().len();
    println!(
        "  [INFO] Scratchpad: {open} open, {} done",
        pad.items.len() - open
    );

    let days = store.list_daily()?;
    match days.first() {
        Some(latest) => println!(
            "  [INFO] Daily logs: {} (latest {})",
            days.len(),
            latest.format("%Y-%m-%d")
        ),
        None => println!("  [INFO] Daily logs: none"),
    }
    Ok(())
}

/// Search is optional, so an unavailable tool is reported but never fails
/// the status run.
async fn check_search(session: &MemorySession) {
    let cfg = session.config().search.clone();
    if !cfg.enabled {
        println!("  [INFO] Search: disabled");
        return;
    }
    let available = session.on_session_start().await;
    print_check(
        "Search tool",
        available,
        if available {
            format!("`{}` responding", cfg.command)
        } else {
            format!("`{}` not found or not responding", cfg.command)
        },
    );
    if available {
        print_check(
            "Search collection",
            session.search().has_collection(),
            cfg.collection.clone(),
        );
    }
}

// ── Formatting helper ─────────────────────────────────────────────────

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
