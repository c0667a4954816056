//! Helpers for building nodes, funded accounts, and mined chains in tests.

use crate::config::BLOCKCHAIN_ADDRESS;
use crate::core::{Block, ChainState, Node, Transaction, TxStatus};
use crate::storage::CheckpointStore;
use crate::wallet::Wallet;
use tempfile::TempDir;

pub const TEST_NODE_URL: &str = "http://127.0.0.1:8000";

/// Checkpoint store in a throwaway directory.
pub fn test_store() -> (CheckpointStore, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = CheckpointStore::open(dir.path().join("suntzuchain.db")).expect("open store");
    (store, dir)
}

/// Fresh genesis-only node.
pub fn test_node() -> (Node, TempDir) {
    let (store, dir) = test_store();
    let state = ChainState::new(Block::genesis().expect("genesis"), TEST_NODE_URL.to_string());
    let node = Node::new(state, store).expect("create node");
    (node, dir)
}

/// Node whose chain grants `amount` to `address` in block 1, so admission
/// tests have a balance to spend.
pub fn funded_node(address: &str, amount: u64) -> (Node, TempDir) {
    let (node, dir) = test_node();
    let mut grant = Transaction::new(BLOCKCHAIN_ADDRESS, address, amount, vec![]).expect("grant");
    grant.set_status(TxStatus::Success);

    let prev_hash = node.last_block_hash().expect("tip hash");
    let mut block = Block::new(&prev_hash, 0, 1).expect("block");
    block.push_transaction(grant);
    node.append_block(block).expect("append");
    (node, dir)
}

/// A signed pending transfer from `wallet` to `to`.
pub fn signed_transfer(wallet: &Wallet, to: &str, value: u64) -> Transaction {
    let txn = Transaction::new(&wallet.address(), to, value, vec![]).expect("transaction");
    wallet.sign_transaction(txn).expect("sign")
}

/// Search nonces until the block meets `difficulty`. Intended for low
/// difficulties; tests never mine at the network difficulty.
pub fn mine_block(prev_hash: &str, block_number: u64, difficulty: usize) -> Block {
    let mut nonce = 0;
    loop {
        let block = Block::new(prev_hash, nonce, block_number).expect("block");
        if block.meets_difficulty(difficulty).expect("difficulty") {
            return block;
        }
        nonce += 1;
    }
}

/// A linked chain of `length` blocks starting at genesis, every non-genesis
/// block mined at `difficulty`.
pub fn mined_chain(length: usize, difficulty: usize) -> Vec<Block> {
    let mut blocks = vec![Block::genesis().expect("genesis")];
    while blocks.len() < length {
        let prev = blocks.last().expect("non-empty chain");
        let prev_hash = prev.hash().expect("hash");
        blocks.push(mine_block(&prev_hash, prev.block_number() + 1, difficulty));
    }
    blocks
}
