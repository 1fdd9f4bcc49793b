//! # SledStore — Persistent Block Store
//!
//! The on-disk [`BlockStore`], built on sled's embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree       | Key              | Value                    |
//! |------------|------------------|--------------------------|
//! | `blocks`   | `height` (8B BE) | block JSON (UTF-8)       |
//! | `metadata` | key (UTF-8)      | value (UTF-8)            |
//! | `metadata` | `block_count`    | count (8B BE)            |
//!
//! Heights are stored as big-endian u64 so that sled's lexicographic
//! ordering matches numeric ordering and a range scan walks the chain in
//! order.
//!
//! `Tree::len` walks every key, so the block count is kept under its own
//! metadata key instead. A `put` that extends the chain writes the block
//! and the new count in one transaction across both trees.
//!
//! ## Durability
//!
//! sled buffers writes. A `put` is visible to every reader immediately but
//! only survives a crash after [`flush`](BlockStore::flush). The ledger
//! flushes after genesis and, when configured, after every append.

use std::path::Path;

use sled::transaction::{
    ConflictableTransactionError, TransactionError, TransactionResult, Transactional,
};
use sled::{Db, IVec, Tree};

use super::store::{BlockStore, StoreError, StoreResult};
use crate::config::{BLOCKS_TREE, META_BLOCK_COUNT, METADATA_TREE};

/// Persistent block store backed by sled.
///
/// sled trees support lock-free concurrent reads and serialized writes,
/// so a `SledStore` can be shared across threads via `Arc` without extra
/// locking. Cloning is cheap and yields a handle to the same database.
#[derive(Debug, Clone)]
pub struct SledStore {
    /// The underlying sled database handle.
    db: Db,
    /// Blocks indexed by height (big-endian u64 keys).
    blocks: Tree,
    /// Ledger metadata (digest algorithm, ...).
    metadata: Tree,
}

impl SledStore {
    /// Open or create a store at the given filesystem path.
    ///
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary store that is removed when dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let blocks = db.open_tree(BLOCKS_TREE)?;
        let metadata = db.open_tree(METADATA_TREE)?;
        Ok(Self {
            db,
            blocks,
            metadata,
        })
    }

    /// Count derived from the highest stored key. Used only when the
    /// count key has never been written.
    fn count_from_last_key(&self) -> StoreResult<u64> {
        match self.blocks.last()? {
            Some((key, _)) => {
                let raw: [u8; 8] = key
                    .as_ref()
                    .try_into()
                    .map_err(|_| StoreError::Encoding("invalid block key".to_string()))?;
                Ok(u64::from_be_bytes(raw) + 1)
            }
            None => Ok(0),
        }
    }
}

fn utf8(bytes: &[u8], what: impl FnOnce() -> String) -> StoreResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| StoreError::Encoding(what()))
}

fn decode_count(bytes: &IVec) -> StoreResult<u64> {
    let raw: [u8; 8] = bytes
        .as_ref()
        .try_into()
        .map_err(|_| StoreError::Encoding("invalid block count bytes".to_string()))?;
    Ok(u64::from_be_bytes(raw))
}

impl BlockStore for SledStore {
    fn count(&self) -> StoreResult<u64> {
        match self.metadata.get(META_BLOCK_COUNT)? {
            Some(bytes) => decode_count(&bytes),
            None => self.count_from_last_key(),
        }
    }

    fn put(&self, height: u64, block: &str) -> StoreResult<()> {
        let stored = self.count()?;
        let key = height.to_be_bytes();

        let result: TransactionResult<(), StoreError> =
            (&self.blocks, &self.metadata).transaction(|(blocks, metadata)| {
                blocks.insert(&key[..], block.as_bytes())?;

                let current = match metadata.get(META_BLOCK_COUNT)? {
                    Some(bytes) => {
                        decode_count(&bytes).map_err(ConflictableTransactionError::Abort)?
                    }
                    None => stored,
                };
                let count = current.max(height + 1);
                metadata.insert(META_BLOCK_COUNT, &count.to_be_bytes()[..])?;
                Ok(())
            });

        result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => StoreError::Sled(e),
        })
    }

    fn get(&self, height: u64) -> StoreResult<Option<String>> {
        match self.blocks.get(height.to_be_bytes())? {
            Some(bytes) => utf8(&bytes, || format!("block {height}")).map(Some),
            None => Ok(None),
        }
    }

    fn get_meta(&self, key: &str) -> StoreResult<Option<String>> {
        match self.metadata.get(key.as_bytes())? {
            Some(bytes) => utf8(&bytes, || format!("metadata key {key}")).map(Some),
            None => Ok(None),
        }
    }

    fn put_meta(&self, key: &str, value: &str) -> StoreResult<()> {
        self.metadata.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}
