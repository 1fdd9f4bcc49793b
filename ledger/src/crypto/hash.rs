//! # Hashing Utilities
//!
//! Digest functions used to seal blocks. Two algorithms are supported and
//! the ledger refuses to mix them:
//!
//! - **SHA-256** — the default. Every tool on the planet can reproduce it,
//!   which matters when someone outside this codebase wants to audit a
//!   chain with `sha256sum` and a JSON pretty-printer.
//!
//! - **BLAKE3** — faster on every architecture that matters. Pick it when
//!   you own both ends of the pipeline.
//!
//! Both produce 32-byte digests, rendered as 64 lowercase hex characters
//! wherever they are stored in a block.
//!
//! The algorithm a ledger was sealed with is recorded next to the chain
//! on first open. Verifying a SHA-256 chain with BLAKE3 would flag every
//! single block as tampered, which is true in the most useless way.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of every digest produced by this module, in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use chainlog::crypto::sha256;
///
/// let hash = sha256(b"chainlog");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; DIGEST_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use chainlog::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"chainlog");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    *blake3::hash(data).as_bytes()
}

/// Digest algorithm used to compute block self hashes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (FIPS 180-4).
    #[default]
    Sha256,
    /// BLAKE3 in its default 256-bit output mode.
    Blake3,
}

impl HashAlgorithm {
    /// Stable lowercase name, used in ledger metadata and on the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Raw 32-byte digest of `data`.
    pub fn digest(&self, data: &[u8]) -> [u8; DIGEST_LENGTH] {
        match self {
            HashAlgorithm::Sha256 => sha256(data),
            HashAlgorithm::Blake3 => blake3_hash(data),
        }
    }

    /// Lowercase hex digest of `data`. This is the form stored in blocks.
    pub fn hex_digest(&self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing an algorithm name we don't know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hash algorithm: {0} (expected sha256 or blake3)")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for HashAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}
