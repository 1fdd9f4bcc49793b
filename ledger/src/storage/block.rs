//! # Block Structure
//!
//! A block is one record in the ledger: a caller-supplied body plus the
//! metadata that chains it to its predecessor.
//!
//! ## Block Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  height        u64      (0 = genesis)           │
//! │  body          JSON     (caller payload)        │
//! │  timestamp     u64      (unix seconds)          │
//! │  previousHash  hex      (selfHash of height-1)  │
//! │  selfHash      hex      (digest, see below)     │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Canonical Form
//!
//! A block is encoded as a JSON object with exactly these five keys, in
//! exactly this order. The same encoding is used for persistence and for
//! hashing: the self hash is the digest of the canonical form with
//! `selfHash` set to the empty string. Object keys inside `body` are
//! sorted by `serde_json`, so a body read back from the store encodes to
//! the same bytes it was sealed with.
//!
//! Unknown keys are rejected on decode. A stored block with a sixth field
//! is corrupt, not "forward compatible".

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::HashAlgorithm;

/// A single ledger record.
///
/// Construct with [`Block::new`]; every other field is filled in by
/// [`Ledger::append`](crate::storage::Ledger::append). Once persisted a
/// block is only ever read back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Block {
    /// Zero-based position in the chain.
    pub height: u64,
    /// Opaque payload supplied by the caller.
    pub body: Value,
    /// Unix timestamp (seconds) assigned at append time.
    pub timestamp: u64,
    /// Self hash of the block at `height - 1`. Empty for genesis.
    pub previous_hash: String,
    /// Digest of this block's canonical form with this field blanked.
    pub self_hash: String,
}

/// Borrowed view of a block with `selfHash` pinned to the empty string.
/// Field order must match [`Block`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Unsealed<'a> {
    height: u64,
    body: &'a Value,
    timestamp: u64,
    previous_hash: &'a str,
    self_hash: &'a str,
}

impl Block {
    /// A fresh, unsealed block carrying `body`.
    pub fn new(body: impl Into<Value>) -> Self {
        Block {
            height: 0,
            body: body.into(),
            timestamp: 0,
            previous_hash: String::new(),
            self_hash: String::new(),
        }
    }

    /// Whether this block sits at height 0.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Whether the self hash has been filled in.
    pub fn is_sealed(&self) -> bool {
        !self.self_hash.is_empty()
    }

    /// Canonical bytes the self hash is computed over.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&Unsealed {
            height: self.height,
            body: &self.body,
            timestamp: self.timestamp,
            previous_hash: &self.previous_hash,
            self_hash: "",
        })
    }

    /// Recompute the self hash from the current field values.
    pub fn compute_hash(&self, algorithm: HashAlgorithm) -> serde_json::Result<String> {
        Ok(algorithm.hex_digest(&self.canonical_bytes()?))
    }

    /// Fill in `self_hash` from the other fields.
    pub fn seal(&mut self, algorithm: HashAlgorithm) -> serde_json::Result<()> {
        self.self_hash = self.compute_hash(algorithm)?;
        Ok(())
    }

    /// Serialize into the stored form.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a stored block.
    pub fn decode(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
