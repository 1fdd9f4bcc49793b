// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # chainlog node
//!
//! Entry point for the `chainlog-node` binary. Parses CLI arguments,
//! initializes logging, opens the ledger under `<data-dir>/db` and runs
//! one subcommand:
//!
//! - `init`     create the database and seed the genesis block
//! - `append`   append one block
//! - `run`      append blocks on an interval, then audit the chain
//! - `show`     print one block as JSON
//! - `validate` audit the chain; non-zero exit on any finding
//! - `status`   print chain length and tip
//! - `version`  print build version information

mod cli;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;

use chainlog::{BlockStore, ChainReport, HashAlgorithm, Ledger, LedgerConfig, SledStore};

use cli::{ChainlogCli, Commands};
use logging::LogFormat;
use metrics::{LedgerMetrics, SharedMetrics};

#[tokio::main]
async fn main() -> Result<()> {
    let ChainlogCli {
        data_dir,
        hash,
        log_format,
        log_level,
        command,
    } = ChainlogCli::parse();

    logging::init_logging(&log_level, LogFormat::from_str_lossy(&log_format));

    let db_path = data_dir.join("db");
    match command {
        Commands::Init => init_ledger(&open_ledger(&db_path, hash)?, &data_dir),
        Commands::Append(args) => append_one(&open_ledger(&db_path, hash)?, args),
        Commands::Run(args) => run_ledger(Arc::new(open_ledger(&db_path, hash)?), args).await,
        Commands::Show(args) => show_block(&open_ledger(&db_path, hash)?, args.height),
        Commands::Validate => validate_ledger(&open_ledger(&db_path, hash)?),
        Commands::Status => print_status(&open_ledger(&db_path, hash)?),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens (or creates) the sled-backed ledger at `db_path`.
fn open_ledger(db_path: &Path, hash: HashAlgorithm) -> Result<Ledger<SledStore>> {
    let store = SledStore::open(db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    let config = LedgerConfig::default()
        .with_hash_algorithm(hash)
        .with_flush_on_append(true);
    let ledger = Ledger::open(store, config)
        .with_context(|| format!("failed to open ledger at {}", db_path.display()))?;
    tracing::debug!(path = %db_path.display(), "database opened");
    Ok(ledger)
}

fn init_ledger(ledger: &Ledger<SledStore>, data_dir: &Path) -> Result<()> {
    let genesis = ledger.get_block(0)?;
    let count = ledger.block_count()?;

    println!("Ledger initialized.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Digest         : {}", ledger.hash_algorithm());
    println!("  Blocks         : {}", count);
    println!("  Genesis hash   : {}", genesis.self_hash);
    Ok(())
}

fn append_one(ledger: &Ledger<SledStore>, args: cli::AppendArgs) -> Result<()> {
    let body = if args.json {
        serde_json::from_str(&args.body).context("--json body is not valid JSON")?
    } else {
        serde_json::Value::String(args.body)
    };

    let block = ledger.append_body(body)?;
    println!("{} {}", block.height, block.self_hash);
    Ok(())
}

fn show_block(ledger: &Ledger<SledStore>, height: u64) -> Result<()> {
    let block = ledger.get_block(height)?;
    println!("{}", serde_json::to_string_pretty(&block)?);
    Ok(())
}

fn validate_ledger(ledger: &Ledger<SledStore>) -> Result<()> {
    let report = ledger.audit()?;

    for finding in &report.findings {
        println!("{finding}");
    }
    for line in summary_lines(&report) {
        println!("{line}");
    }

    if report.is_intact() {
        return Ok(());
    }
    bail!(
        "chain failed validation: {} of {} blocks flagged",
        report.flagged_heights().len(),
        report.block_count
    )
}

/// Closing lines of a validation run. The error count is the number of
/// findings; the height list is deduplicated.
fn summary_lines(report: &ChainReport) -> Vec<String> {
    if report.is_intact() {
        return vec![format!("No errors detected ({} blocks)", report.block_count)];
    }
    vec![
        format!("Block errors = {}", report.findings.len()),
        format!("Blocks: {:?}", report.flagged_heights()),
    ]
}

fn print_status(ledger: &Ledger<SledStore>) -> Result<()> {
    let count = ledger.block_count()?;
    let tip = ledger.tip()?;

    println!("Blocks      : {}", count);
    println!("Tip height  : {}", tip.height);
    println!("Tip hash    : {}", tip.self_hash);
    println!("Tip time    : {}", tip.timestamp);
    println!("Digest      : {}", ledger.hash_algorithm());
    Ok(())
}

/// Appends blocks on a timer, optionally serving metrics, then audits the
/// chain once the loop finishes or a shutdown signal arrives.
async fn run_ledger(ledger: Arc<Ledger<SledStore>>, args: cli::RunArgs) -> Result<()> {
    let metrics: SharedMetrics =
        Arc::new(LedgerMetrics::new().context("failed to create metrics registry")?);
    metrics
        .block_height
        .set(ledger.tip()?.height.try_into().unwrap_or(i64::MAX));

    let metrics_server = if args.metrics {
        let addr = format!("0.0.0.0:{}", args.metrics_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind metrics listener on {addr}"))?;
        tracing::info!("metrics server listening on {addr}");

        let router = metrics::router(Arc::clone(&metrics));
        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "metrics server error");
            }
        }))
    } else {
        None
    };

    tracing::info!(
        count = args.count,
        interval_ms = args.interval_ms,
        prefix = %args.prefix,
        "starting append loop"
    );

    let interval = Duration::from_millis(args.interval_ms.max(1));
    tokio::select! {
        res = append_loop(Arc::clone(&ledger), Arc::clone(&metrics), args.count, interval, args.prefix) => {
            let appended = res?;
            tracing::info!(appended, "append loop finished");
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, stopping append loop");
        }
    }

    let audited = Arc::clone(&ledger);
    let report = tokio::task::spawn_blocking(move || audited.audit())
        .await
        .context("audit task panicked")??;
    metrics
        .validation_errors
        .set(report.flagged_heights().len().try_into().unwrap_or(i64::MAX));

    if let Some(handle) = metrics_server {
        handle.abort();
    }

    for line in summary_lines(&report) {
        println!("{line}");
    }
    if report.is_intact() {
        Ok(())
    } else {
        bail!("chain failed validation after run")
    }
}

/// Appends `count` blocks (forever when `count` is 0), one per `interval`.
/// Block `i` gets the body `"<prefix> - i"`, counting from 1.
///
/// Returns the number of blocks appended.
async fn append_loop<S: BlockStore + 'static>(
    ledger: Arc<Ledger<S>>,
    metrics: SharedMetrics,
    count: u64,
    interval: Duration,
    prefix: String,
) -> Result<u64> {
    let mut ticker = tokio::time::interval(interval);
    let mut appended = 0u64;

    while count == 0 || appended < count {
        ticker.tick().await;

        let body = format!("{prefix} - {}", appended + 1);
        let writer = Arc::clone(&ledger);
        let started = Instant::now();
        let block = tokio::task::spawn_blocking(move || writer.append_body(body))
            .await
            .context("append task panicked")??;

        metrics
            .append_latency_seconds
            .observe(started.elapsed().as_secs_f64());
        metrics.blocks_appended_total.inc();
        metrics
            .block_height
            .set(block.height.try_into().unwrap_or(i64::MAX));
        appended += 1;

        tracing::info!(height = block.height, hash = %block.self_hash, "block appended");
    }

    Ok(appended)
}

fn print_version() {
    println!("chainlog-node {}", env!("CARGO_PKG_VERSION"));
    println!("digest        {} (default)", HashAlgorithm::default());
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that signal is never delivered.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
