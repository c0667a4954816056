// Proof-of-work mining loop. The hash search never holds the ledger mutex:
// each candidate re-snapshots the mempool and chain height, the search
// hashes lock-free, and only the final append re-enters the lock.

use crate::config::MINING_DIFFICULTY;
use crate::error::Result;
use log::{error, info};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use super::{Block, Node, Transaction};

/// How long the miner sleeps between checks while the advisory gate is set.
const MINING_GATE_POLL: Duration = Duration::from_millis(200);

/// Run the mining loop until shutdown. Every mined block credits
/// `miner_address` with the reward.
pub fn run_mining_loop(node: &Node, miner_address: &str, shutdown: &AtomicBool) {
    info!("Mining started, rewards go to {miner_address}");
    while !shutdown.load(Ordering::Relaxed) {
        match mine_next_block(node, miner_address, MINING_DIFFICULTY, shutdown) {
            Ok(Some(block)) => {
                info!(
                    "Mined block {} at nonce {}",
                    block.block_number(),
                    block.nonce()
                );
            }
            Ok(None) => return,
            Err(e) => {
                // Checkpoint failures are fatal.
                error!("Mining aborted: {e}");
                process::exit(1);
            }
        }
    }
}

/// Search nonces until a block satisfying `difficulty` is found, then
/// append it (with the reward transaction) to the chain. Returns `None`
/// when shutdown is requested mid-search.
///
/// The previous hash is sampled once at the start of the search. If a
/// concurrent chain adoption replaces the suffix before the append, the
/// freshly minted block is appended regardless; the next consensus round
/// repairs the divergence.
pub fn mine_next_block(
    node: &Node,
    miner_address: &str,
    difficulty: usize,
    shutdown: &AtomicBool,
) -> Result<Option<Block>> {
    let prev_hash = node.last_block_hash()?;
    let mut nonce: i64 = 0;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(None);
        }
        while node.mining_locked() {
            if shutdown.load(Ordering::Relaxed) {
                return Ok(None);
            }
            thread::sleep(MINING_GATE_POLL);
        }

        let mut candidate = build_candidate(node, &prev_hash, nonce)?;
        if candidate.meets_difficulty(difficulty)? {
            candidate.push_transaction(Transaction::new_reward(miner_address)?);
            node.append_block(candidate.clone())?;
            return Ok(Some(candidate));
        }
        nonce += 1;
    }
}

/// Assemble one candidate: current chain height as block number, a clone of
/// every pooled transaction with its status resolved, and the given nonce.
fn build_candidate(node: &Node, prev_hash: &str, nonce: i64) -> Result<Block> {
    let (block_number, pool) = node.candidate_basis();
    let mut candidate = Block::new(prev_hash, nonce, block_number)?;
    for txn in pool {
        candidate.add_transaction(txn);
    }
    Ok(candidate)
}
