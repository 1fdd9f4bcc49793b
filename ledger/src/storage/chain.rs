//! # Ledger
//!
//! Chain construction and chain validation on top of a [`BlockStore`].
//!
//! ## Append
//!
//! ```text
//! lock ─► height = count() ─► prev = get(height-1) ─► timestamp = now
//!      ─► previousHash = prev.selfHash ─► seal ─► put(height) ─► unlock
//! ```
//!
//! Everything between `count()` and `put()` runs under the write half of
//! a single lock, so two appends can never claim the same height. The
//! block is fully sealed before it is handed to the store; a failure at
//! any step leaves the store untouched.
//!
//! ## Genesis
//!
//! The genesis block is seeded exactly once, when a ledger is opened on
//! an empty store. `append` never special-cases height 0: on an empty
//! store it refuses to run at all.
//!
//! ## Validation
//!
//! Two checks, both read-only:
//!
//! 1. **Block integrity** — recompute the self hash over the stored
//!    fields and compare with the stored self hash.
//! 2. **Linkage** — block `h + 1` must carry block `h`'s self hash as its
//!    previous hash.
//!
//! A chain audit holds the read half of the append lock for its whole
//! scan, so it never observes a chain that grows underneath it.

use std::ops::Range;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::audit::{BlockCheck, ChainReport, Finding};
use super::block::Block;
use super::store::{BlockStore, StoreError};
use crate::config::{LedgerConfig, META_HASH_ALGORITHM};
use crate::crypto::HashAlgorithm;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during ledger operations.
///
/// Hash and link mismatches are not errors; they are reported as
/// [`Finding`]s by the validation methods.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The store failed to read or write. Not retried.
    #[error("store failure: {0}")]
    Io(#[from] StoreError),

    /// The requested height is outside `[0, count)`.
    #[error("block {height} not found (chain has {count} blocks)")]
    NotFound { height: u64, count: u64 },

    /// A structurally required block is missing or malformed.
    #[error("chain corruption: {0}")]
    ChainCorruption(String),

    /// The chain was sealed with a different digest than configured.
    #[error("ledger was sealed with {stored}, but is configured for {configured}")]
    DigestMismatch {
        stored: HashAlgorithm,
        configured: HashAlgorithm,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

fn serialization(err: serde_json::Error) -> LedgerError {
    LedgerError::Serialization(err.to_string())
}

/// Current time, truncated to whole seconds.
fn unix_now() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Append-only, hash-linked block ledger.
///
/// All persistent state lives in the store. Share a ledger between
/// threads with `Arc<Ledger<_>>`; appends are serialized internally.
#[derive(Debug)]
pub struct Ledger<S: BlockStore> {
    store: S,
    config: LedgerConfig,
    /// Write half: one append at a time. Read half: chain audits.
    append_lock: RwLock<()>,
}

impl<S: BlockStore> Ledger<S> {
    /// Open a ledger over `store`.
    ///
    /// Seeds the genesis block if the store is empty. Otherwise checks
    /// that the stored chain was sealed with the configured digest and
    /// that block 0 is a well-formed genesis block.
    pub fn open(store: S, config: LedgerConfig) -> LedgerResult<Self> {
        let ledger = Self {
            store,
            config,
            append_lock: RwLock::new(()),
        };

        if ledger.store.count()? == 0 {
            ledger.seed_genesis()?;
        } else {
            ledger.check_hash_algorithm()?;
            ledger.check_genesis()?;
        }

        info!(
            blocks = ledger.store.count()?,
            hash_algorithm = %ledger.config.hash_algorithm,
            "ledger opened"
        );
        Ok(ledger)
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.config.hash_algorithm
    }

    // -- Genesis ------------------------------------------------------------

    fn seed_genesis(&self) -> LedgerResult<()> {
        let _guard = self.append_lock.write();
        if self.store.count()? != 0 {
            return Err(LedgerError::ChainCorruption(
                "refusing to seed a second genesis block".to_string(),
            ));
        }

        self.store
            .put_meta(META_HASH_ALGORITHM, self.config.hash_algorithm.name())?;

        let mut genesis = Block::new(self.config.genesis_body.clone());
        genesis.timestamp = unix_now();
        self.seal_and_put(&mut genesis)?;
        self.store.flush()?;

        info!(hash = %genesis.self_hash, "genesis block seeded");
        Ok(())
    }

    fn check_hash_algorithm(&self) -> LedgerResult<()> {
        let configured = self.config.hash_algorithm;
        match self.store.get_meta(META_HASH_ALGORITHM)? {
            Some(name) => {
                let stored = name
                    .parse::<HashAlgorithm>()
                    .map_err(|e| LedgerError::ChainCorruption(format!("{e}")))?;
                if stored != configured {
                    return Err(LedgerError::DigestMismatch { stored, configured });
                }
            }
            None => {
                warn!(%configured, "chain has no recorded hash algorithm, assuming configured one");
            }
        }
        Ok(())
    }

    fn check_genesis(&self) -> LedgerResult<()> {
        let genesis = self.load(0)?.ok_or_else(|| {
            LedgerError::ChainCorruption("store holds blocks but none at height 0".to_string())
        })?;
        if genesis.height != 0 || !genesis.previous_hash.is_empty() {
            return Err(LedgerError::ChainCorruption(format!(
                "block 0 is not a genesis block (height={}, previousHash={:?})",
                genesis.height, genesis.previous_hash
            )));
        }
        Ok(())
    }

    // -- Append -------------------------------------------------------------

    /// Append `block` to the chain and return it sealed.
    ///
    /// Height, timestamp, previous hash and self hash are assigned here;
    /// whatever the caller put in those fields is overwritten. Only the
    /// body is kept.
    pub fn append(&self, mut block: Block) -> LedgerResult<Block> {
        let _guard = self.append_lock.write();

        let height = self.store.count()?;
        if height == 0 {
            return Err(LedgerError::ChainCorruption(
                "cannot append to a chain without a genesis block".to_string(),
            ));
        }

        let previous = self.load(height - 1)?.ok_or_else(|| {
            LedgerError::ChainCorruption(format!("predecessor block {} is missing", height - 1))
        })?;

        block.height = height;
        block.timestamp = unix_now();
        block.previous_hash = previous.self_hash;
        self.seal_and_put(&mut block)?;

        if self.config.flush_on_append {
            self.store.flush()?;
        }

        debug!(height, hash = %block.self_hash, "block appended");
        Ok(block)
    }

    /// Shorthand for `append(Block::new(body))`.
    pub fn append_body(&self, body: impl Into<Value>) -> LedgerResult<Block> {
        self.append(Block::new(body))
    }

    fn seal_and_put(&self, block: &mut Block) -> LedgerResult<()> {
        block
            .seal(self.config.hash_algorithm)
            .map_err(serialization)?;
        let encoded = block.encode().map_err(serialization)?;
        self.store.put(block.height, &encoded)?;
        Ok(())
    }

    // -- Reads --------------------------------------------------------------

    /// Number of blocks in the chain, genesis included.
    pub fn block_count(&self) -> LedgerResult<u64> {
        Ok(self.store.count()?)
    }

    /// The block at `height`.
    pub fn get_block(&self, height: u64) -> LedgerResult<Block> {
        let count = self.block_count()?;
        if height >= count {
            return Err(LedgerError::NotFound { height, count });
        }
        self.load(height)?
            .ok_or_else(|| missing_below_count(height, count))
    }

    /// The most recently appended block.
    pub fn tip(&self) -> LedgerResult<Block> {
        let count = self.block_count()?;
        match count.checked_sub(1) {
            Some(height) => self.get_block(height),
            None => Err(LedgerError::NotFound { height: 0, count }),
        }
    }

    /// Blocks in `range`, clamped to the current chain length.
    pub fn blocks(&self, range: Range<u64>) -> LedgerResult<Vec<Block>> {
        let count = self.block_count()?;
        (range.start..range.end.min(count))
            .map(|height| {
                self.load(height)?
                    .ok_or_else(|| missing_below_count(height, count))
            })
            .collect()
    }

    fn load(&self, height: u64) -> LedgerResult<Option<Block>> {
        match self.store.get(height)? {
            Some(raw) => Block::decode(&raw).map(Some).map_err(|e| {
                LedgerError::ChainCorruption(format!("block {height} is malformed: {e}"))
            }),
            None => Ok(None),
        }
    }

    // -- Validation ---------------------------------------------------------

    /// Stored and recomputed self hash of the block at `height`.
    pub fn inspect_block(&self, height: u64) -> LedgerResult<BlockCheck> {
        let block = self.get_block(height)?;
        self.check(height, &block)
    }

    /// Whether the block at `height` still matches its self hash.
    ///
    /// A mismatch is logged with both hashes and reported as `false`.
    pub fn validate_block(&self, height: u64) -> LedgerResult<bool> {
        let check = self.inspect_block(height)?;
        if !check.is_valid() {
            warn!(
                height,
                stored = %check.stored,
                computed = %check.computed,
                "block hash mismatch"
            );
        }
        Ok(check.is_valid())
    }

    /// Heights in error, ascending and deduplicated. Empty means intact.
    pub fn validate_chain(&self) -> LedgerResult<Vec<u64>> {
        Ok(self.audit()?.flagged_heights())
    }

    /// Full chain audit with a finding per problem.
    ///
    /// Every block's self hash is checked, the tip included, and every
    /// adjacent pair's linkage is checked.
    pub fn audit(&self) -> LedgerResult<ChainReport> {
        let _guard = self.append_lock.read();

        let count = self.store.count()?;
        let mut findings = Vec::new();
        let mut previous: Option<Block> = None;

        for height in 0..count {
            let block = self
                .load(height)?
                .ok_or_else(|| missing_below_count(height, count))?;

            if let Some(prev) = previous.take() {
                if prev.self_hash != block.previous_hash {
                    warn!(
                        height = height - 1,
                        expected = %prev.self_hash,
                        found = %block.previous_hash,
                        "broken link"
                    );
                    findings.push(Finding::BrokenLink {
                        height: height - 1,
                        expected: prev.self_hash,
                        found: block.previous_hash.clone(),
                    });
                }
            }

            let check = self.check(height, &block)?;
            if !check.is_valid() {
                warn!(
                    height,
                    stored = %check.stored,
                    computed = %check.computed,
                    "block hash mismatch"
                );
                findings.push(check.into());
            }

            previous = Some(block);
        }

        let report = ChainReport::new(count, findings);
        if report.is_intact() {
            info!(blocks = count, "no errors detected");
        } else {
            warn!(
                errors = report.findings.len(),
                heights = ?report.flagged_heights(),
                "block errors detected"
            );
        }
        Ok(report)
    }

    fn check(&self, height: u64, block: &Block) -> LedgerResult<BlockCheck> {
        let computed = block
            .compute_hash(self.config.hash_algorithm)
            .map_err(serialization)?;
        Ok(BlockCheck {
            height,
            stored: block.self_hash.clone(),
            computed,
        })
    }
}

fn missing_below_count(height: u64, count: u64) -> LedgerError {
    LedgerError::ChainCorruption(format!(
        "block {height} is missing from a chain of {count} blocks"
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GENESIS_BODY;
    use crate::storage::store::{MemoryStore, StoreResult};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    // -- Helpers ------------------------------------------------------------

    fn ledger() -> Ledger<MemoryStore> {
        Ledger::open(MemoryStore::new(), LedgerConfig::default()).expect("open ledger")
    }

    fn ledger_with(bodies: &[&str]) -> Ledger<MemoryStore> {
        let ledger = ledger();
        for body in bodies {
            ledger.append_body(*body).unwrap();
        }
        ledger
    }

    /// Rewrites a stored block behind the ledger's back.
    fn tamper<S: BlockStore>(ledger: &Ledger<S>, height: u64, edit: impl FnOnce(&mut Block)) {
        let raw = ledger.store().get(height).unwrap().expect("block exists");
        let mut block = Block::decode(&raw).unwrap();
        edit(&mut block);
        ledger
            .store()
            .put(height, &block.encode().unwrap())
            .unwrap();
    }

    /// Memory store whose writes can be switched off. Counts `count()`
    /// calls.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: AtomicBool,
        count_calls: AtomicUsize,
    }

    impl BlockStore for FlakyStore {
        fn count(&self) -> StoreResult<u64> {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.count()
        }

        fn put(&self, height: u64, block: &str) -> StoreResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
            }
            self.inner.put(height, block)
        }

        fn get(&self, height: u64) -> StoreResult<Option<String>> {
            self.inner.get(height)
        }

        fn get_meta(&self, key: &str) -> StoreResult<Option<String>> {
            self.inner.get_meta(key)
        }

        fn put_meta(&self, key: &str, value: &str) -> StoreResult<()> {
            self.inner.put_meta(key, value)
        }
    }

    // -- Genesis ------------------------------------------------------------

    #[test]
    fn open_seeds_genesis_on_empty_store() {
        let ledger = ledger();
        assert_eq!(ledger.block_count().unwrap(), 1);

        let genesis = ledger.get_block(0).unwrap();
        assert!(genesis.is_genesis());
        assert!(genesis.previous_hash.is_empty());
        assert_eq!(genesis.body, Value::from(GENESIS_BODY));
        assert!(genesis.timestamp > 0);
        assert!(ledger.validate_block(0).unwrap());
    }

    #[test]
    fn open_records_hash_algorithm() {
        let ledger = ledger();
        assert_eq!(
            ledger.store().get_meta(META_HASH_ALGORITHM).unwrap().as_deref(),
            Some("sha256")
        );
    }

    #[test]
    fn reopen_does_not_reseed_genesis() {
        let store = Arc::new(MemoryStore::new());
        let first = Ledger::open(Arc::clone(&store), LedgerConfig::default()).unwrap();
        let genesis = first.get_block(0).unwrap();
        first.append_body("A").unwrap();
        drop(first);

        let second = Ledger::open(Arc::clone(&store), LedgerConfig::default()).unwrap();
        assert_eq!(second.block_count().unwrap(), 2);
        assert_eq!(second.get_block(0).unwrap(), genesis);
    }

    #[test]
    fn second_genesis_is_refused() {
        let ledger = ledger();
        let err = ledger.seed_genesis().unwrap_err();
        assert!(matches!(err, LedgerError::ChainCorruption(_)));
        assert_eq!(ledger.block_count().unwrap(), 1);
    }

    #[test]
    fn custom_genesis_body() {
        let config = LedgerConfig::default().with_genesis_body(json!({"network": "dev"}));
        let ledger = Ledger::open(MemoryStore::new(), config).unwrap();
        assert_eq!(ledger.get_block(0).unwrap().body, json!({"network": "dev"}));
    }

    #[test]
    fn reopen_with_other_digest_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        Ledger::open(Arc::clone(&store), LedgerConfig::default()).unwrap();

        let config = LedgerConfig::default().with_hash_algorithm(HashAlgorithm::Blake3);
        let err = Ledger::open(Arc::clone(&store), config).err().expect("mismatch");
        assert!(matches!(
            err,
            LedgerError::DigestMismatch {
                stored: HashAlgorithm::Sha256,
                configured: HashAlgorithm::Blake3,
            }
        ));
    }

    #[test]
    fn open_rejects_malformed_genesis() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::open(Arc::clone(&store), LedgerConfig::default()).unwrap();
        tamper(&ledger, 0, |b| b.previous_hash = "ff".repeat(32));
        drop(ledger);

        let err = Ledger::open(store, LedgerConfig::default()).err().expect("corrupt");
        assert!(matches!(err, LedgerError::ChainCorruption(_)));
    }

    #[test]
    fn open_rejects_store_without_block_zero() {
        let store = MemoryStore::new();
        store.put(1, "{}").unwrap();
        let err = Ledger::open(store, LedgerConfig::default()).err().expect("corrupt");
        assert!(matches!(err, LedgerError::ChainCorruption(_)));
    }

    // -- Append -------------------------------------------------------------

    #[test]
    fn append_assigns_sequential_heights() {
        let ledger = ledger();
        for expected in 1..=5u64 {
            let block = ledger.append_body(format!("block {expected}")).unwrap();
            assert_eq!(block.height, expected);
        }
        assert_eq!(ledger.block_count().unwrap(), 6);
    }

    #[test]
    fn append_links_to_predecessor() {
        let ledger = ledger_with(&["A", "B", "C"]);
        for h in 1..ledger.block_count().unwrap() {
            let block = ledger.get_block(h).unwrap();
            let parent = ledger.get_block(h - 1).unwrap();
            assert_eq!(block.previous_hash, parent.self_hash);
        }
    }

    #[test]
    fn append_returns_what_was_stored() {
        let ledger = ledger();
        let appended = ledger.append_body(json!({"k": [1, 2, 3]})).unwrap();
        assert!(appended.is_sealed());
        assert_eq!(ledger.get_block(appended.height).unwrap(), appended);
    }

    #[test]
    fn append_overwrites_caller_metadata() {
        let ledger = ledger();
        let mut block = Block::new("body");
        block.height = 99;
        block.timestamp = 7;
        block.previous_hash = "bogus".into();
        block.self_hash = "bogus".into();

        let sealed = ledger.append(block).unwrap();
        assert_eq!(sealed.height, 1);
        assert_ne!(sealed.timestamp, 7);
        assert_eq!(sealed.previous_hash, ledger.get_block(0).unwrap().self_hash);
        assert_ne!(sealed.self_hash, "bogus");
        assert!(ledger.validate_block(1).unwrap());
    }

    #[test]
    fn append_timestamp_is_current_seconds() {
        let ledger = ledger();
        let before = unix_now();
        let block = ledger.append_body("now").unwrap();
        let after = unix_now();
        assert!(before <= block.timestamp && block.timestamp <= after);
    }

    #[test]
    fn append_without_genesis_is_corruption() {
        let ledger = Ledger {
            store: MemoryStore::new(),
            config: LedgerConfig::default(),
            append_lock: RwLock::new(()),
        };
        let err = ledger.append_body("orphan").unwrap_err();
        assert!(matches!(err, LedgerError::ChainCorruption(_)));
        assert_eq!(ledger.block_count().unwrap(), 0);
    }

    #[test]
    fn append_with_missing_predecessor_is_corruption() {
        let ledger = Ledger {
            store: MemoryStore::new(),
            config: LedgerConfig::default(),
            append_lock: RwLock::new(()),
        };
        // Count says 1, but the block lives at the wrong key.
        ledger.store.put(5, "{}").unwrap();
        let err = ledger.append_body("x").unwrap_err();
        assert!(matches!(err, LedgerError::ChainCorruption(_)));
    }

    #[test]
    fn store_write_failure_is_io_error() {
        let ledger = Ledger::open(FlakyStore::default(), LedgerConfig::default()).unwrap();
        ledger.store().fail_writes.store(true, Ordering::SeqCst);

        let err = ledger.append_body("lost").unwrap_err();
        assert!(matches!(err, LedgerError::Io(StoreError::Io(_))));
        assert_eq!(ledger.block_count().unwrap(), 1);

        ledger.store().fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(ledger.append_body("kept").unwrap().height, 1);
    }

    #[test]
    fn block_count_never_decreases() {
        let ledger = ledger();
        let mut last = ledger.block_count().unwrap();
        for i in 0..10 {
            ledger.append_body(i).unwrap();
            let now = ledger.block_count().unwrap();
            assert_eq!(now, last + 1);
            last = now;
        }
        assert_eq!(last, 11);
    }

    #[test]
    fn concurrent_appends_get_unique_heights() {
        let ledger = Arc::new(ledger());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    (0..25)
                        .map(|i| ledger.append_body(format!("t{t}-{i}")).unwrap().height)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut heights: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("appender should not panic"))
            .collect();
        heights.sort_unstable();

        assert_eq!(heights, (1..=200).collect::<Vec<u64>>());
        assert_eq!(ledger.block_count().unwrap(), 201);
        assert!(ledger.validate_chain().unwrap().is_empty());
    }

    // -- Reads --------------------------------------------------------------

    #[test]
    fn get_block_one_past_end_is_not_found() {
        let ledger = ledger_with(&["A"]);
        let count = ledger.block_count().unwrap();
        let err = ledger.get_block(count).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { height: 2, count: 2 }));
    }

    #[test]
    fn tip_is_latest_block() {
        let ledger = ledger_with(&["A", "B"]);
        let tip = ledger.tip().unwrap();
        assert_eq!(tip.height, 2);
        assert_eq!(tip.body, Value::from("B"));
    }

    #[test]
    fn blocks_range_is_clamped() {
        let ledger = ledger_with(&["A", "B"]);
        let blocks = ledger.blocks(1..10).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].height, 1);
        assert!(ledger.blocks(5..9).unwrap().is_empty());
    }

    #[test]
    fn blocks_range_counts_once() {
        let ledger = Ledger::open(FlakyStore::default(), LedgerConfig::default()).unwrap();
        for i in 0..20 {
            ledger.append_body(format!("entry {i}")).unwrap();
        }

        ledger.store().count_calls.store(0, Ordering::SeqCst);
        let blocks = ledger.blocks(0..21).unwrap();
        assert_eq!(blocks.len(), 21);
        assert!(blocks.iter().enumerate().all(|(i, b)| b.height == i as u64));
        assert_eq!(ledger.store().count_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocks_range_reports_a_hole_as_corruption() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::open(Arc::clone(&store), LedgerConfig::default()).unwrap();
        ledger.append_body("A").unwrap();
        // A count of three with nothing at height 2.
        store.put(3, "{}").unwrap();
        assert!(matches!(
            ledger.blocks(0..4),
            Err(LedgerError::ChainCorruption(_))
        ));
    }

    #[test]
    fn malformed_block_is_corruption() {
        let ledger = ledger_with(&["A"]);
        ledger.store().put(1, "not json").unwrap();
        assert!(matches!(
            ledger.get_block(1),
            Err(LedgerError::ChainCorruption(_))
        ));
        assert!(matches!(
            ledger.validate_chain(),
            Err(LedgerError::ChainCorruption(_))
        ));
    }

    // -- Validation ---------------------------------------------------------

    #[test]
    fn untouched_chain_validates() {
        let ledger = ledger_with(&["A", "B", "C", "D"]);
        for h in 0..ledger.block_count().unwrap() {
            assert!(ledger.validate_block(h).unwrap());
        }
        assert!(ledger.validate_chain().unwrap().is_empty());
        assert!(ledger.audit().unwrap().is_intact());
    }

    #[test]
    fn genesis_only_chain_validates() {
        assert!(ledger().validate_chain().unwrap().is_empty());
    }

    #[test]
    fn validate_block_out_of_range_is_not_found() {
        let ledger = ledger();
        assert!(matches!(
            ledger.validate_block(1),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn tampering_any_field_breaks_block_hash() {
        let edits: Vec<(&str, Box<dyn Fn(&mut Block)>)> = vec![
            ("height", Box::new(|b: &mut Block| b.height = 42)),
            ("body", Box::new(|b: &mut Block| b.body = json!("forged"))),
            ("timestamp", Box::new(|b: &mut Block| b.timestamp += 1)),
            ("previousHash", Box::new(|b: &mut Block| b.previous_hash = "00".repeat(32))),
            ("selfHash", Box::new(|b: &mut Block| b.self_hash = "00".repeat(32))),
        ];

        for (field, edit) in edits {
            let ledger = ledger_with(&["A", "B"]);
            tamper(&ledger, 1, |b| edit(b));
            assert!(!ledger.validate_block(1).unwrap(), "{field} edit went unnoticed");
            assert!(ledger.validate_block(0).unwrap());
            assert!(ledger.validate_block(2).unwrap());
        }
    }

    #[test]
    fn inspect_block_reports_both_hashes() {
        let ledger = ledger_with(&["A"]);
        let original = ledger.get_block(1).unwrap().self_hash;
        tamper(&ledger, 1, |b| b.body = json!("B"));

        let check = ledger.inspect_block(1).unwrap();
        assert_eq!(check.height, 1);
        assert_eq!(check.stored, original);
        assert_ne!(check.computed, original);
        assert!(!check.is_valid());
    }

    #[test]
    fn tampered_previous_hash_flags_link_and_block() {
        let ledger = ledger_with(&["A", "B", "C"]);
        assert_eq!(ledger.block_count().unwrap(), 4);
        assert!(ledger.validate_chain().unwrap().is_empty());

        tamper(&ledger, 2, |b| b.previous_hash = "not-a-hash".into());

        // Link 1 -> 2 is broken, and previousHash is covered by block 2's digest.
        assert_eq!(ledger.validate_chain().unwrap(), vec![1, 2]);
        assert!(ledger.validate_block(1).unwrap());
        assert!(!ledger.validate_block(2).unwrap());

        let report = ledger.audit().unwrap();
        assert!(report
            .findings
            .iter()
            .any(|f| matches!(f, Finding::BrokenLink { height: 1, .. })));
    }

    #[test]
    fn resealed_block_still_breaks_the_next_link() {
        let ledger = ledger_with(&["A", "B", "C"]);
        tamper(&ledger, 1, |b| {
            b.body = json!("forged");
            b.seal(HashAlgorithm::Sha256).unwrap();
        });

        // Block 1 is self-consistent again, but block 2 still points at the old hash.
        assert!(ledger.validate_block(1).unwrap());
        assert_eq!(ledger.validate_chain().unwrap(), vec![1]);
    }

    #[test]
    fn tampered_tip_is_detected() {
        let ledger = ledger_with(&["A", "B", "C"]);
        tamper(&ledger, 3, |b| b.body = json!("forged"));
        assert_eq!(ledger.validate_chain().unwrap(), vec![3]);
    }

    #[test]
    fn validation_does_not_mutate_the_chain() {
        let ledger = ledger_with(&["A", "B"]);
        tamper(&ledger, 1, |b| b.timestamp = 1);
        let before: Vec<_> = (0..3).map(|h| ledger.store().get(h).unwrap()).collect();

        assert_eq!(ledger.validate_chain().unwrap(), vec![1]);
        let after: Vec<_> = (0..3).map(|h| ledger.store().get(h).unwrap()).collect();
        assert_eq!(before, after);
        assert_eq!(ledger.block_count().unwrap(), 3);
    }

    #[test]
    fn blake3_chain_validates() {
        let config = LedgerConfig::default().with_hash_algorithm(HashAlgorithm::Blake3);
        let ledger = Ledger::open(MemoryStore::new(), config).unwrap();
        ledger.append_body("A").unwrap();
        let block = ledger.get_block(1).unwrap();
        assert_eq!(
            block.self_hash,
            block.compute_hash(HashAlgorithm::Blake3).unwrap()
        );
        assert!(ledger.validate_chain().unwrap().is_empty());
    }
}
