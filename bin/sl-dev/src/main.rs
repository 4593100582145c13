//! SubLedger Development Harness
//!
//! Runs an in-memory subscription ledger on the system clock and executes
//! line commands from stdin, printing one JSON result per line. Stands in
//! for the wallet UI when exercising the ledger locally.

mod commands;

use std::sync::Arc;
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use sl_config::{AppConfig, ConfigLoader};
use sl_ledger::{SubscriptionLedger, SystemClock};

use commands::{Command, USAGE};

/// SubLedger Development Harness
#[derive(Parser, Debug)]
#[command(name = "sl-dev")]
#[command(about = "Drive an in-memory subscription ledger from line commands")]
struct Args {
    /// Path to a TOML config file (standard locations are searched otherwise)
    #[arg(long, env = "SUBLEDGER_CONFIG")]
    config: Option<String>,

    /// Print an example configuration and exit
    #[arg(long, default_value = "false")]
    print_example_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_example_config {
        print!("{}", AppConfig::example_toml());
        return Ok(());
    }

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("failed to load configuration")?;

    let log_format = Some(config.logging.format.as_str()).filter(|f| !f.is_empty());
    sl_common::logging::init_logging("sl-dev", log_format);

    let ledger = Arc::new(
        SubscriptionLedger::from_config(&config, Arc::new(SystemClock))
            .context("failed to build ledger")?,
    );
    info!(tiers = ledger.tiers().len(), "SubLedger dev harness ready");
    eprintln!("{}", USAGE);

    let mut events = ledger.events();
    let event_logger = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(
                        event_id = %event.id,
                        principal = %event.principal,
                        kind = event.kind.name(),
                        occurred_at = event.occurred_at,
                        "Ledger event"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged behind ledger");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                println!("{}", run_line(&ledger, &line));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    event_logger.abort();
    info!("SubLedger dev harness stopped");
    Ok(())
}

fn run_line(ledger: &SubscriptionLedger, line: &str) -> serde_json::Value {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => return json!({ "ok": false, "error": e.to_string(), "usage": USAGE }),
    };

    match command.execute(ledger) {
        Ok(result) => json!({ "ok": true, "result": result }),
        Err(e) => json!({ "ok": false, "error": e.to_string() }),
    }
}
