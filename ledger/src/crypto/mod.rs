//! # Cryptographic Primitives
//!
//! Thin, type-safe wrappers around audited digest implementations. The
//! ledger never touches `sha2` or `blake3` directly; everything goes
//! through [`HashAlgorithm`] so that the algorithm a chain was sealed with
//! stays a single, recorded decision.

pub mod hash;

pub use hash::{blake3_hash, sha256, HashAlgorithm, UnknownAlgorithm, DIGEST_LENGTH};
