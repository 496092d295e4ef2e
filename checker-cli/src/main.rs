mod config;
mod prompt;
mod remote;

use anyhow::{anyhow, Result};
use checker_core::{
    batch, config::write_example_config, setup_logger, AccountRotator, BatchDispatcher,
    ContactLookupAdapter, PacingController, QuotaStore, ResultWriter, SessionCache,
};
use clap::Parser;
use dotenv::dotenv;
use prompt::TerminalPrompts;
use remote::HttpGateway;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Check phone numbers against a messaging platform, \
rotating accounts to stay under per-account daily quotas")]
struct Args {
    /// CSV file with phone numbers in the first column
    #[arg(default_value = "phone_numbers.csv")]
    input: String,

    /// Output CSV, appended across runs
    #[arg(default_value = "check_results.csv")]
    output: String,

    /// Numbers per batch
    #[arg(default_value_t = 10)]
    batch_size: usize,

    /// First batch to process (for resuming a partial run)
    #[arg(default_value_t = 0)]
    batch_start: usize,

    /// One past the last batch to process
    batch_end: Option<usize>,

    /// Configuration file
    #[arg(default_value = "config.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = setup_logger();
    dotenv().ok();

    let args = Args::parse();

    let cfg = if Path::new(&args.config).exists() {
        info!("Loading configuration from {}", args.config);
        config::load(&args.config)?
    } else {
        if !Path::new("config.example.yaml").exists() {
            if write_example_config("config.example.yaml").is_ok() {
                info!("Wrote example configuration to config.example.yaml");
            }
        }
        config::fallback_single_account()?
    };

    info!("Input file: {}", args.input);
    info!("Output file: {}", args.output);
    info!("Batch size: {}", args.batch_size);
    info!("Config file: {}", args.config);
    info!("Accounts available: {}", cfg.accounts.len());

    let batches = match batch::read_phone_batches(Path::new(&args.input), args.batch_size) {
        Ok(batches) => batches,
        Err(e) => {
            error!("{e}");
            return Err(e.into());
        }
    };
    let batches = batch::select_range(batches, args.batch_start, args.batch_end);
    if batches.is_empty() {
        info!("No numbers to process.");
        return Ok(());
    }
    let total: usize = batches.iter().map(Vec::len).sum();
    info!("Found {} numbers in {} batches", total, batches.len());

    let gateway_url = cfg
        .settings
        .gateway_url
        .clone()
        .or_else(|| std::env::var("CHECKER_GATEWAY_URL").ok())
        .ok_or_else(|| {
            anyhow!("no lookup gateway configured: set settings.gateway_url or CHECKER_GATEWAY_URL")
        })?;

    let gateway = Arc::new(HttpGateway::new(&gateway_url, Arc::new(TerminalPrompts)));
    let quota = QuotaStore::load(&cfg.settings.quota_file);
    let mut dispatcher = BatchDispatcher::new(
        AccountRotator::new(cfg.accounts.clone(), cfg.settings.daily_limit),
        quota,
        PacingController::new(&cfg.settings),
        ContactLookupAdapter::new(),
        SessionCache::new(gateway),
        ResultWriter::new(&args.output),
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, finishing up...");
                signal_token.cancel();
            }
            Err(e) => error!("Unable to listen for shutdown signal: {e}"),
        }
    });

    let stats = dispatcher.run(&batches, cancel).await?;
    info!(
        "Done: {} of {} numbers checked, results in {}",
        stats.processed, stats.total, args.output
    );

    Ok(())
}
