// Longest-chain consensus: poll live peers for their recent blocks, verify
// the heaviest candidate, and adopt it when it is strictly longer than ours.

use crate::config::{CONSENSUS_PAUSE_INTERVAL, MINING_DIFFICULTY};
use crate::core::{Block, Node};
use crate::error::{NodeError, Result};
use crate::network::PeerClient;
use log::{error, info, warn};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Structural verification of a candidate chain window.
///
/// The first block is exempt from the difficulty check only when it is the
/// genesis block (`block_number == 0`); every other block must link to its
/// predecessor's hash and satisfy the difficulty. An empty window fails.
pub fn verify_chain(blocks: &[Block], difficulty: usize) -> bool {
    let first = match blocks.first() {
        Some(first) => first,
        None => return false,
    };
    if first.block_number() != 0 && !meets_difficulty(first, difficulty) {
        warn!(
            "Chain verification failed for block {}",
            first.block_number()
        );
        return false;
    }

    for pair in blocks.windows(2) {
        let prev_hash = match pair[0].hash() {
            Ok(hash) => hash,
            Err(_) => return false,
        };
        if prev_hash != pair[1].prev_hash() {
            warn!(
                "Prev hash verification failed for block {}",
                pair[1].block_number()
            );
            return false;
        }
        if !meets_difficulty(&pair[1], difficulty) {
            warn!(
                "Chain verification failed for block {}",
                pair[1].block_number()
            );
            return false;
        }
    }

    true
}

fn meets_difficulty(block: &Block, difficulty: usize) -> bool {
    block.meets_difficulty(difficulty).unwrap_or(false)
}

/// One consensus pass. Returns whether a remote chain was adopted.
///
/// Fetch and decode failures skip the peer; a candidate that fails
/// verification (or whose window starts beyond our chain) is discarded.
/// Only checkpoint failures propagate as errors.
pub fn consensus_round(node: &Node, client: &PeerClient, difficulty: usize) -> Result<bool> {
    let own = node.snapshot();
    let mut best = own.blocks().to_vec();
    let mut best_len = match best.last() {
        Some(last) => last.block_number() + 1,
        None => 0,
    };
    let mut replaced = false;

    for peer in node.live_peers() {
        let fetched = match client.fetch_blocks(&peer) {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Error fetching blocks from {peer}: {e}");
                continue;
            }
        };
        let candidate_len = match fetched.blocks().last() {
            Some(last) => last.block_number() + 1,
            None => continue,
        };
        if candidate_len > best_len {
            best = fetched.blocks().to_vec();
            best_len = candidate_len;
            replaced = true;
        }
    }

    if !replaced {
        info!("Our chain is the longest, not updating");
        return Ok(false);
    }

    if !verify_chain(&best, difficulty) {
        warn!("Chain verification failed, keeping local chain");
        return Ok(false);
    }

    node.set_mining_locked(true);
    let adopted = node.adopt_chain(&best);
    node.set_mining_locked(false);

    match adopted {
        Ok(()) => {
            info!("Blockchain update complete");
            Ok(true)
        }
        Err(NodeError::InvalidChain(msg)) => {
            warn!("Discarding remote chain: {msg}");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Periodic consensus loop; runs until shutdown.
pub fn run_consensus(node: &Node, client: &PeerClient, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        info!("Running consensus");
        if let Err(e) = consensus_round(node, client, MINING_DIFFICULTY) {
            error!("Consensus aborted: {e}");
            process::exit(1);
        }
        thread::sleep(CONSENSUS_PAUSE_INTERVAL);
    }
}
