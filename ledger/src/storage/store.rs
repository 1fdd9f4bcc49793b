//! # Store Collaborator
//!
//! The ledger delegates every byte of durability to an ordered key-value
//! store. This module defines the narrow contract it relies on and ships
//! an in-memory implementation for tests and throwaway chains. The
//! sled-backed implementation lives in [`db`](super::db).
//!
//! ## Contract
//!
//! - `count()` is the number of blocks persisted. Heights are contiguous,
//!   so it is also the next free height.
//! - `put(height, block)` is a durable-once-flushed write; a subsequent
//!   `get`/`count` observes it.
//! - `get(height)` returns what was put, or `None`.
//!
//! Stores do not retry. A failed operation is reported once and the
//! caller decides what to do about it.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors raised by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid UTF-8: {0}")]
    Encoding(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// BlockStore
// ---------------------------------------------------------------------------

/// Ordered, height-keyed block persistence consumed by the ledger.
///
/// Implementations must be safe to share across threads. Serializing
/// writers is the ledger's job, not the store's.
pub trait BlockStore: Send + Sync {
    /// Number of blocks currently stored.
    fn count(&self) -> StoreResult<u64>;

    /// Store a serialized block at `height`, replacing any previous value.
    fn put(&self, height: u64, block: &str) -> StoreResult<()>;

    /// Read back the serialized block at `height`.
    fn get(&self, height: u64) -> StoreResult<Option<String>>;

    /// Read a ledger metadata entry.
    fn get_meta(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a ledger metadata entry.
    fn put_meta(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Block until all pending writes are durable. No-op by default.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

impl<S: BlockStore + ?Sized> BlockStore for Arc<S> {
    fn count(&self) -> StoreResult<u64> {
        (**self).count()
    }

    fn put(&self, height: u64, block: &str) -> StoreResult<()> {
        (**self).put(height, block)
    }

    fn get(&self, height: u64) -> StoreResult<Option<String>> {
        (**self).get(height)
    }

    fn get_meta(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_meta(key)
    }

    fn put_meta(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).put_meta(key, value)
    }

    fn flush(&self) -> StoreResult<()> {
        (**self).flush()
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Volatile store backed by a `BTreeMap`. Everything is gone on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blocks: RwLock<BTreeMap<u64, String>>,
    metadata: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for MemoryStore {
    fn count(&self) -> StoreResult<u64> {
        Ok(self.blocks.read().len() as u64)
    }

    fn put(&self, height: u64, block: &str) -> StoreResult<()> {
        self.blocks.write().insert(height, block.to_string());
        Ok(())
    }

    fn get(&self, height: u64) -> StoreResult<Option<String>> {
        Ok(self.blocks.read().get(&height).cloned())
    }

    fn get_meta(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.metadata.read().get(key).cloned())
    }

    fn put_meta(&self, key: &str, value: &str) -> StoreResult<()> {
        self.metadata
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
