//! Structured results of block and chain validation.
//!
//! Validation reports, it never throws: a tampered block is a finding the
//! caller gets to look at, not an error that aborts the scan.

use std::collections::BTreeSet;
use std::fmt;

/// Stored versus recomputed self hash of one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCheck {
    pub height: u64,
    /// Self hash as persisted.
    pub stored: String,
    /// Self hash recomputed from the persisted fields.
    pub computed: String,
}

impl BlockCheck {
    pub fn is_valid(&self) -> bool {
        self.stored == self.computed
    }
}

/// A single integrity problem found while auditing the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Finding {
    /// The block's stored self hash does not match its content.
    HashMismatch {
        height: u64,
        stored: String,
        computed: String,
    },
    /// The block at `height + 1` does not point back at the block at
    /// `height`. Reported against the predecessor.
    BrokenLink {
        height: u64,
        expected: String,
        found: String,
    },
}

impl Finding {
    /// Height the finding is recorded against.
    pub fn height(&self) -> u64 {
        match self {
            Finding::HashMismatch { height, .. } | Finding::BrokenLink { height, .. } => *height,
        }
    }
}

impl From<BlockCheck> for Finding {
    fn from(check: BlockCheck) -> Self {
        Finding::HashMismatch {
            height: check.height,
            stored: check.stored,
            computed: check.computed,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::HashMismatch {
                height,
                stored,
                computed,
            } => write!(f, "block #{height} invalid hash: {stored} <> {computed}"),
            Finding::BrokenLink {
                height,
                expected,
                found,
            } => write!(
                f,
                "block #{} does not link to #{height}: expected {expected}, found {found}",
                height + 1
            ),
        }
    }
}

/// Outcome of a full chain audit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainReport {
    /// Number of blocks the audit covered.
    pub block_count: u64,
    /// Findings in scan order.
    pub findings: Vec<Finding>,
}

impl ChainReport {
    pub fn new(block_count: u64, findings: Vec<Finding>) -> Self {
        Self {
            block_count,
            findings,
        }
    }

    /// True when no findings were recorded.
    pub fn is_intact(&self) -> bool {
        self.findings.is_empty()
    }

    /// Heights in error, ascending and without duplicates.
    pub fn flagged_heights(&self) -> Vec<u64> {
        self.findings
            .iter()
            .map(Finding::height)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
