use std::path::Path;

use mk_domain::config::{Config, ConfigSeverity};

/// Validate the config, printing any issues. `false` when errors were found.
pub fn validate(config: &Config, config_path: &Path) -> bool {
    let issues = config.validate();
    let path = config_path.display();

    if issues.is_empty() {
        println!("Config OK ({path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }
    println!("\n{error_count} error(s), {warning_count} warning(s) in {path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)?;
    print!("{output}");
    Ok(())
}
