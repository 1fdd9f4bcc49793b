//! # Storage Module
//!
//! Blocks, the store they live in, and the ledger that chains them.
//!
//! ## Architecture
//!
//! ```text
//! block.rs  — Block structure, canonical encoding, seal/verify
//! store.rs  — BlockStore contract + in-memory store
//! db.rs     — sled-backed persistent store
//! chain.rs  — Ledger: genesis seeding, append, validation
//! audit.rs  — structured validation findings
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! Block::new(body) ─► Ledger::append ─► BlockStore::put(height, json)
//!                                              │
//! Ledger::validate_chain ◄─ BlockStore::get ◄──┘
//! ```
//!
//! ## Design Decisions
//!
//! 1. **JSON on disk.** The stored form is also the hashed form, and it
//!    is readable with nothing but a text editor.
//!
//! 2. **The store knows nothing about blocks.** It moves strings by
//!    height. Everything that gives those strings meaning (sealing,
//!    linking, verifying) lives in the ledger, so swapping sled for
//!    anything ordered is a one-trait job.
//!
//! 3. **One writer.** Heights come from `count()`, so count-then-put is a
//!    critical section. The ledger owns that lock; stores don't need to.

pub mod audit;
pub mod block;
pub mod chain;
pub mod db;
pub mod store;

pub use audit::{BlockCheck, ChainReport, Finding};
pub use block::Block;
pub use chain::{Ledger, LedgerError, LedgerResult};
pub use db::SledStore;
pub use store::{BlockStore, MemoryStore, StoreError, StoreResult};
