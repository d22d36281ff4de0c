use clap::Parser;
use tracing_subscriber::EnvFilter;

use mk_runtime::cli::{self, commands, Cli, Command, ConfigCommand};
use mk_runtime::MemorySession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing();

    let (config, config_path) = cli::load_config()?;

    let session = MemorySession::with_cli_backend(
        args.session.unwrap_or_else(cli::new_session_id),
        config,
    );
    let result = run(&session, args.command, &config_path).await;
    session.on_session_end();
    result
}

async fn run(
    session: &MemorySession,
    command: Command,
    config_path: &std::path::Path,
) -> anyhow::Result<()> {
    match command {
        Command::Context { prompt, report } => {
            commands::context(session, prompt.as_deref(), report).await
        }
        Command::Write {
            content,
            target,
            overwrite,
        } => commands::write(session, content, target, overwrite).await,
        Command::Read { target, date } => commands::read(session, target, date),
        Command::Scratchpad(sub) => commands::scratchpad(session, sub).await,
        Command::Search {
            query,
            mode,
            limit,
            json,
        } => commands::search(session, query, mode, limit, json).await,
        Command::Handoff => commands::handoff(session).await,
        Command::Status => {
            if !cli::status::run(session, config_path).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Validate) => {
            if !cli::config::validate(session.config(), config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => cli::config::show(session.config()),
    }
}

/// Compact stderr-only tracing so stdout carries only command output.
///
/// Filter comes from `MEMKEEP_LOG`, defaulting to `warn`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MEMKEEP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
