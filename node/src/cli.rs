//! # CLI Interface
//!
//! Defines the command-line argument structure for `chainlog-node` using
//! `clap` derive. Global options select the data directory, digest and
//! logging; subcommands drive the ledger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chainlog::config::{
    DEFAULT_APPEND_COUNT, DEFAULT_APPEND_INTERVAL_MS, DEFAULT_BODY_PREFIX, DEFAULT_METRICS_PORT,
};
use chainlog::HashAlgorithm;

/// chainlog ledger node.
///
/// Maintains an append-only, hash-linked ledger in a local database.
/// Appends blocks on demand or on a timer, and audits the chain for
/// tampering.
#[derive(Parser, Debug)]
#[command(
    name = "chainlog-node",
    about = "Append-only, tamper-evident block ledger",
    version,
    propagate_version = true
)]
pub struct ChainlogCli {
    /// Directory holding the ledger database. Created if missing.
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "CHAINLOG_DATA_DIR",
        default_value = "./chainlog-data"
    )]
    pub data_dir: PathBuf,

    /// Digest used to seal blocks: sha256 or blake3.
    ///
    /// Must match the digest the ledger was created with.
    #[arg(long, global = true, env = "CHAINLOG_HASH", default_value = "sha256")]
    pub hash: HashAlgorithm,

    /// Log output format: pretty or json.
    #[arg(long, global = true, env = "CHAINLOG_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(
        long,
        global = true,
        env = "CHAINLOG_LOG",
        default_value = "chainlog=info,chainlog_node=info"
    )]
    pub log_level: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory and seed the genesis block.
    Init,
    /// Append a single block.
    Append(AppendArgs),
    /// Append blocks on a fixed interval until done or interrupted.
    Run(RunArgs),
    /// Print the block at a given height.
    Show(ShowArgs),
    /// Audit the whole chain. Exits non-zero when errors are found.
    Validate,
    /// Print chain length, tip and digest.
    Status,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `append` subcommand.
#[derive(Parser, Debug)]
pub struct AppendArgs {
    /// Block body. Stored as a string unless `--json` is given.
    pub body: String,

    /// Parse the body as a JSON document.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Number of blocks to append. 0 runs until interrupted.
    #[arg(long, short = 'n', default_value_t = DEFAULT_APPEND_COUNT)]
    pub count: u64,

    /// Delay between blocks in milliseconds.
    #[arg(long, env = "CHAINLOG_INTERVAL_MS", default_value_t = DEFAULT_APPEND_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Body prefix; block `i` gets "<prefix> - i".
    #[arg(long, default_value = DEFAULT_BODY_PREFIX)]
    pub prefix: String,

    /// Serve Prometheus metrics while running.
    #[arg(long)]
    pub metrics: bool,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CHAINLOG_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
}

/// Arguments for the `show` subcommand.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Height of the block to print.
    pub height: u64,
}
