//! Beacon - command-line host for the event journal.

mod app;
mod run;

use std::path::PathBuf;

use beacon_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};
use event_journal::{Payload, PayloadValue};

/// Beacon command-line interface.
#[derive(Parser)]
#[command(name = "beacon")]
#[command(about = "Record analytics events and retry failed deliveries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config, store and logs. Defaults to ~/.beacon
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one event and wait for its delivery attempt
    Record {
        /// Event name
        name: String,
        /// Payload entry as key=value (repeatable)
        #[arg(short, long = "data", value_parser = parse_pair)]
        data: Vec<(String, PayloadValue)>,
    },
    /// Show events waiting for retry (the only events kept across runs)
    Pending,
    /// Retry every queued event once
    Flush,
    /// Show the user id and a fresh session id
    Whoami,
    /// Forget the persisted user id
    Forget,
    /// Read JSON lines from stdin and record them until EOF
    Run,
}

fn parse_pair(raw: &str) -> Result<(String, PayloadValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), PayloadValue::parse_loose(value)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging("beacon", level, &paths);

    let journal = app::build_journal(&config, &paths)?;

    match cli.command {
        Commands::Record { name, data } => {
            let payload: Payload = data.into_iter().collect();
            let recorded = journal.record(&name, payload)?;
            let outcome = recorded.delivery.wait().await;
            println!("{}", serde_json::to_string_pretty(&recorded.event)?);
            if !outcome.is_delivered() {
                eprintln!("delivery failed, event queued for retry");
            }
        }
        Commands::Pending => {
            println!(
                "{}",
                serde_json::to_string_pretty(&journal.retry_store().pending())?
            );
        }
        Commands::Flush => {
            let report = journal.flush_retries().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Whoami => {
            println!("user_id:    {}", journal.user_id());
            println!("session_id: {}", journal.session_id());
        }
        Commands::Forget => {
            journal.identity().clear_user_id()?;
            println!("user id cleared");
        }
        Commands::Run => {
            let overview = run::run(journal, &config).await?;
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
    }

    Ok(())
}
