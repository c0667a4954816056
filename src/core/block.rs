use crate::config::GENESIS_PREV_HASH;
use crate::error::Result;
use crate::utils::{current_timestamp, hex_digest, to_canonical_json};
use serde::{Deserialize, Serialize};

use super::{Transaction, TxStatus};

/// An ordered transaction container chained to its predecessor by hash.
///
/// A block never stores its own hash; `hash()` recomputes it from the
/// canonical JSON of the whole record, so any mutation is visible to
/// verification. Field order is the canonical JSON order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    block_number: u64,
    prev_hash: String,
    timestamp: i64,
    nonce: i64,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Create an empty block candidate with the current timestamp.
    pub fn new(prev_hash: &str, nonce: i64, block_number: u64) -> Result<Block> {
        Ok(Block {
            block_number,
            prev_hash: prev_hash.to_string(),
            timestamp: current_timestamp()?,
            nonce,
            transactions: vec![],
        })
    }

    /// The unique block 0. Exempt from the difficulty check.
    pub fn genesis() -> Result<Block> {
        Block::new(GENESIS_PREV_HASH, 0, 0)
    }

    /// `"0x" + hex(SHA256(canonical_json(block)))`.
    pub fn hash(&self) -> Result<String> {
        let bytes = to_canonical_json(self)?;
        Ok(hex_digest(&bytes))
    }

    /// Whether the `difficulty` hex characters after the `0x` prefix of this
    /// block's hash are all `'0'`.
    pub fn meets_difficulty(&self, difficulty: usize) -> Result<bool> {
        let hash = self.hash()?;
        Ok(hash[2..2 + difficulty].bytes().all(|c| c == b'0'))
    }

    /// Add a mempool transaction to the candidate, flipping its status:
    /// `VerificationSuccess` becomes `Success`, everything else `Failed`.
    pub fn add_transaction(&mut self, mut txn: Transaction) {
        if txn.status() == TxStatus::VerificationSuccess {
            txn.set_status(TxStatus::Success);
        } else {
            txn.set_status(TxStatus::Failed);
        }
        self.transactions.push(txn);
    }

    /// Append a transaction as-is. Used for the mining reward, which is
    /// already in its final `Success` state.
    pub fn push_transaction(&mut self, txn: Transaction) {
        self.transactions.push(txn);
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn prev_hash(&self) -> &str {
        &self.prev_hash
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> i64 {
        self.nonce
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}
