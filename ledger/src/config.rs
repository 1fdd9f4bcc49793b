//! # Ledger Configuration & Constants
//!
//! Every magic value the ledger depends on lives here. Changing any of the
//! storage constants after a chain has been written makes that chain
//! unreadable, so treat them as part of the on-disk format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::HashAlgorithm;

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// Body of the genesis block. Identifies block 0 to anyone reading the raw
/// store with no other context.
pub const GENESIS_BODY: &str = "First block in the chain - Genesis block";

// ---------------------------------------------------------------------------
// Storage Layout
// ---------------------------------------------------------------------------

/// sled tree holding serialized blocks, keyed by big-endian height.
pub const BLOCKS_TREE: &str = "blocks";

/// sled tree holding ledger metadata (UTF-8 keys and values).
pub const METADATA_TREE: &str = "metadata";

/// Metadata key recording the digest algorithm the chain was sealed with.
pub const META_HASH_ALGORITHM: &str = "hash_algorithm";

/// Metadata key holding the number of stored blocks (8-byte big-endian),
/// written in the same transaction as the block that extends the chain.
pub const META_BLOCK_COUNT: &str = "block_count";

// ---------------------------------------------------------------------------
// Driver Defaults
// ---------------------------------------------------------------------------

/// Delay between two blocks appended by the periodic driver.
pub const DEFAULT_APPEND_INTERVAL_MS: u64 = 1_000;

/// Number of blocks the periodic driver appends before stopping.
pub const DEFAULT_APPEND_COUNT: u64 = 10;

/// Body prefix for blocks appended by the periodic driver.
pub const DEFAULT_BODY_PREFIX: &str = "Test Block";

/// Default Prometheus metrics port for the driver binary.
pub const DEFAULT_METRICS_PORT: u16 = 9752;

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`Ledger`](crate::storage::Ledger).
///
/// Deserializable so it can be embedded in a larger config file; every
/// field has a default, so an empty document is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Digest used to seal new blocks and to verify existing ones.
    pub hash_algorithm: HashAlgorithm,
    /// Body of the genesis block seeded into an empty store.
    pub genesis_body: Value,
    /// Flush the store after every append. Slower, but an acknowledged
    /// append survives a crash.
    pub flush_on_append: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            genesis_body: Value::String(GENESIS_BODY.to_string()),
            flush_on_append: false,
        }
    }
}

impl LedgerConfig {
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn with_genesis_body(mut self, body: impl Into<Value>) -> Self {
        self.genesis_body = body.into();
        self
    }

    pub fn with_flush_on_append(mut self, flush: bool) -> Self {
        self.flush_on_append = flush;
        self
    }
}
