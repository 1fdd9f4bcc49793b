// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # chainlog — Core Library
//!
//! An append-only, tamper-evident ledger. Each block carries the hash of
//! the block before it, every block is sealed with a digest over its own
//! content, and the whole thing sits in an ordered key-value store where
//! anyone can re-walk it and check nobody rewrote history.
//!
//! This is not a blockchain in the marketing sense. There is one writer,
//! no peers, no consensus and no mining. What you get is the useful core:
//! a log you can prove was not edited after the fact.
//!
//! ## Architecture
//!
//! - **crypto** — digest primitives (SHA-256, BLAKE3).
//! - **storage** — blocks, stores, and the [`Ledger`] that ties them.
//! - **config** — constants and [`LedgerConfig`].
//!
//! ## Quick Start
//!
//! ```
//! use chainlog::{Ledger, LedgerConfig, MemoryStore};
//!
//! let ledger = Ledger::open(MemoryStore::new(), LedgerConfig::default())?;
//! ledger.append_body("A")?;
//! ledger.append_body("B")?;
//!
//! assert_eq!(ledger.block_count()?, 3); // genesis + 2
//! assert!(ledger.validate_chain()?.is_empty());
//! # Ok::<(), chainlog::LedgerError>(())
//! ```

pub mod config;
pub mod crypto;
pub mod storage;

pub use config::LedgerConfig;
pub use crypto::HashAlgorithm;
pub use storage::{
    Block, BlockCheck, BlockStore, ChainReport, Finding, Ledger, LedgerError, LedgerResult,
    MemoryStore, SledStore, StoreError,
};
