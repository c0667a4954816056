// Ledger core: the replicated chain, the mempool, the peer map, and the
// single mutex that serializes every mutation. The checkpoint is re-written
// under that mutex after each mutation, so the on-disk state never diverges
// from memory.

use crate::config::FETCH_BLOCK_NUMBER;
use crate::error::{NodeError, Result};
use crate::storage::CheckpointStore;
use crate::utils::to_canonical_json;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{Block, Transaction, TxStatus};

/// The complete serializable node state: chain, mempool, own URL, peer map,
/// and a snapshot of the advisory mining gate. This record is what `GET /`
/// returns, what sync installs, and what the checkpoint persists.
///
/// Field order is the canonical JSON order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainState {
    transaction_pool: Vec<Transaction>,
    blocks: Vec<Block>,
    address: String,
    peers: BTreeMap<String, bool>,
    mining_locked: bool,
}

impl ChainState {
    /// Fresh state: the given genesis block, an empty mempool, and a peer
    /// map seeded with this node itself.
    pub fn new(genesis: Block, address: String) -> ChainState {
        let mut peers = BTreeMap::new();
        peers.insert(address.clone(), true);
        ChainState {
            transaction_pool: vec![],
            blocks: vec![genesis],
            address,
            peers,
            mining_locked: false,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn transaction_pool(&self) -> &[Transaction] {
        &self.transaction_pool
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn peers(&self) -> &BTreeMap<String, bool> {
        &self.peers
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Balance fold: over every transaction in every block and in the
    /// mempool with status `Success`, credit `value` received and debit
    /// `value` sent. Debits saturate at zero rather than wrapping.
    pub fn balance(&self, address: &str) -> u64 {
        let block_txns = self.blocks.iter().flat_map(|b| b.transactions().iter());
        let pool_txns = self.transaction_pool.iter();

        let mut balance: u64 = 0;
        for txn in block_txns.chain(pool_txns) {
            if txn.status() != TxStatus::Success {
                continue;
            }
            if txn.to_address() == address {
                balance = balance.saturating_add(txn.value());
            }
            if txn.from_address() == address {
                balance = balance.saturating_sub(txn.value());
            }
        }
        balance
    }

    /// Balance of `from` projected through its own pending sends: walk the
    /// mempool in insertion order and subtract each verified outgoing value
    /// that still fits, stopping at the first that does not.
    pub fn simulated_balance(&self, from: &str) -> u64 {
        let mut balance = self.balance(from);
        for txn in &self.transaction_pool {
            if txn.from_address() != from || txn.status() != TxStatus::VerificationSuccess {
                continue;
            }
            if balance >= txn.value() {
                balance -= txn.value();
            } else {
                break;
            }
        }
        balance
    }

    /// Mempool entries newest-first, then block transactions not issued by
    /// the faucet, newest-first.
    pub fn non_rewarded_transactions(&self) -> Vec<Transaction> {
        let mut txns: Vec<Transaction> = self.transaction_pool.iter().rev().cloned().collect();
        for block in self.blocks.iter().rev() {
            for txn in block.transactions().iter().rev() {
                if !txn.is_reward() {
                    txns.push(txn.clone());
                }
            }
        }
        txns
    }

    /// The last `FETCH_BLOCK_NUMBER` blocks (or all, if fewer), wrapped in
    /// a state record with only the `blocks` field populated.
    pub fn consensus_window(&self) -> ChainState {
        let start = self.blocks.len().saturating_sub(FETCH_BLOCK_NUMBER);
        ChainState {
            blocks: self.blocks[start..].to_vec(),
            ..ChainState::default()
        }
    }

    #[cfg(test)]
    pub(crate) fn push_block_for_test(&mut self, block: Block) {
        self.blocks.push(block);
    }
}

/// The running node: exclusive owner of the `ChainState`, the advisory
/// mining gate, and the checkpoint store. Shared across the server, miner,
/// gossip, and consensus threads as `Arc<Node>`.
pub struct Node {
    state: Mutex<ChainState>,
    mining_locked: AtomicBool,
    store: CheckpointStore,
}

impl Node {
    /// Wrap a state and write the initial checkpoint.
    pub fn new(state: ChainState, store: CheckpointStore) -> Result<Node> {
        let node = Node {
            state: Mutex::new(state),
            mining_locked: AtomicBool::new(false),
            store,
        };
        {
            let mut state = node.lock_state();
            node.checkpoint(&mut state)?;
        }
        Ok(node)
    }

    /// Boot from the local checkpoint when one exists, otherwise mint a
    /// fresh genesis chain.
    pub fn bootstrap(store: CheckpointStore, self_url: &str) -> Result<Node> {
        let state = match store.load()? {
            Some(mut state) => {
                info!("Restoring node state from checkpoint");
                state.address = self_url.to_string();
                state.peers.insert(self_url.to_string(), true);
                state
            }
            None => {
                info!("No checkpoint found, creating genesis block");
                ChainState::new(Block::genesis()?, self_url.to_string())
            }
        };
        Node::new(state, store)
    }

    /// Boot from a state fetched off a remote node: keep its chain, pool,
    /// and peers, but claim our own URL and join the peer map.
    pub fn from_synced(mut synced: ChainState, self_url: &str, store: CheckpointStore) -> Result<Node> {
        if synced.blocks.is_empty() {
            return Err(NodeError::InvalidChain(
                "Synced state carries no blocks".to_string(),
            ));
        }
        synced.address = self_url.to_string();
        synced.peers.insert(self_url.to_string(), true);
        Node::new(synced, store)
    }

    fn lock_state(&self) -> MutexGuard<'_, ChainState> {
        self.state
            .lock()
            .expect("Node state mutex poisoned - this should never happen")
    }

    /// Re-write the checkpoint. Callers treat a failure here as fatal.
    fn checkpoint(&self, state: &mut ChainState) -> Result<()> {
        state.mining_locked = self.mining_locked.load(Ordering::Relaxed);
        self.store.save(state)
    }

    /// Consistent copy of the full state.
    pub fn snapshot(&self) -> ChainState {
        let mut state = self.lock_state().clone();
        state.mining_locked = self.mining_locked.load(Ordering::Relaxed);
        state
    }

    /// The full state as canonical JSON, as served by `GET /`.
    pub fn state_json(&self) -> Result<Vec<u8>> {
        to_canonical_json(&self.snapshot())
    }

    pub fn self_address(&self) -> String {
        self.lock_state().address.clone()
    }

    pub fn peers(&self) -> BTreeMap<String, bool> {
        self.lock_state().peers.clone()
    }

    /// Live peers other than this node, in map order.
    pub fn live_peers(&self) -> Vec<String> {
        let state = self.lock_state();
        state
            .peers
            .iter()
            .filter(|(peer, live)| peer.as_str() != state.address && **live)
            .map(|(peer, _)| peer.clone())
            .collect()
    }

    pub fn balance(&self, address: &str) -> u64 {
        self.lock_state().balance(address)
    }

    pub fn chain_length(&self) -> u64 {
        self.lock_state().blocks.len() as u64
    }

    /// Hash of the current chain tip.
    pub fn last_block_hash(&self) -> Result<String> {
        let state = self.lock_state();
        let last = state
            .last_block()
            .ok_or_else(|| NodeError::InvalidChain("Chain is empty".to_string()))?;
        last.hash()
    }

    /// Snapshot for one mining candidate: next block number and a clone of
    /// the current mempool.
    pub fn candidate_basis(&self) -> (u64, Vec<Transaction>) {
        let state = self.lock_state();
        (state.blocks.len() as u64, state.transaction_pool.clone())
    }

    pub fn consensus_window(&self) -> ChainState {
        self.lock_state().consensus_window()
    }

    pub fn non_rewarded_transactions(&self) -> Vec<Transaction> {
        self.lock_state().non_rewarded_transactions()
    }

    /// Admit a transaction into the mempool.
    ///
    /// Re-admission of a hash already pooled is a silent no-op (gossip
    /// deduplication) and returns `None`. Otherwise the transaction is
    /// stamped `VerificationSuccess` when both the signature and the
    /// simulated balance hold, `VerificationFailed` when either does not;
    /// its public key is dropped; and the admitted copy is returned for
    /// broadcast.
    pub fn admit_transaction(&self, mut txn: Transaction) -> Result<Option<Transaction>> {
        let mut state = self.lock_state();

        if state
            .transaction_pool
            .iter()
            .any(|pooled| pooled.transaction_hash() == txn.transaction_hash())
        {
            return Ok(None);
        }

        let signature_valid = txn.verify();
        let covered = state.simulated_balance(txn.from_address()) >= txn.value();
        if signature_valid && covered {
            txn.set_status(TxStatus::VerificationSuccess);
        } else {
            txn.set_status(TxStatus::VerificationFailed);
        }
        txn.clear_public_key();

        info!(
            "Admitting transaction {} with status {:?}",
            txn.transaction_hash(),
            txn.status()
        );
        state.transaction_pool.push(txn.clone());
        self.checkpoint(&mut state)?;
        Ok(Some(txn))
    }

    /// Append a mined block: evict its transactions from the mempool, push
    /// it onto the chain, checkpoint.
    pub fn append_block(&self, block: Block) -> Result<()> {
        let mut state = self.lock_state();

        let included: HashSet<&str> = block
            .transactions()
            .iter()
            .map(|txn| txn.transaction_hash())
            .collect();
        state
            .transaction_pool
            .retain(|txn| !included.contains(txn.transaction_hash()));

        info!(
            "Appending block {} with {} transaction(s)",
            block.block_number(),
            block.transactions().len()
        );
        state.blocks.push(block);
        self.checkpoint(&mut state)?;
        Ok(())
    }

    /// Adopt a longer remote chain: replace our suffix from the window's
    /// first block number onward, then drop every pooled transaction the
    /// new blocks already include.
    pub fn adopt_chain(&self, best: &[Block]) -> Result<()> {
        let first = best
            .first()
            .ok_or_else(|| NodeError::InvalidChain("Adopted chain is empty".to_string()))?;

        let mut state = self.lock_state();
        let init = first.block_number() as usize;
        if init > state.blocks.len() {
            return Err(NodeError::InvalidChain(format!(
                "Adoption window starts at {} beyond local chain of length {}",
                init,
                state.blocks.len()
            )));
        }

        state.blocks.truncate(init);
        state.blocks.extend_from_slice(best);

        let included: HashSet<&str> = best
            .iter()
            .flat_map(|block| block.transactions().iter())
            .map(|txn| txn.transaction_hash())
            .collect();
        state
            .transaction_pool
            .retain(|txn| !included.contains(txn.transaction_hash()));

        info!(
            "Adopted remote chain, new length {}",
            state.blocks.len()
        );
        self.checkpoint(&mut state)?;
        Ok(())
    }

    /// Replace the peer map. The node itself is always kept live.
    pub fn update_peers(&self, peers: BTreeMap<String, bool>) -> Result<()> {
        let mut state = self.lock_state();
        state.peers = peers;
        let address = state.address.clone();
        state.peers.insert(address, true);
        self.checkpoint(&mut state)?;
        Ok(())
    }

    pub fn mining_locked(&self) -> bool {
        self.mining_locked.load(Ordering::Relaxed)
    }

    pub fn set_mining_locked(&self, locked: bool) {
        self.mining_locked.store(locked, Ordering::Relaxed);
    }

    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BLOCKCHAIN_ADDRESS, MINING_REWARD};
    use crate::testnet::test_utils::{
        funded_node, signed_transfer, test_node, test_store, TEST_NODE_URL,
    };
    use crate::utils::from_json_slice;
    use crate::wallet::Wallet;

    #[test]
    fn test_genesis_state() {
        let (node, _dir) = test_node();
        let state = node.snapshot();
        assert_eq!(state.blocks().len(), 1);
        assert_eq!(state.blocks()[0].block_number(), 0);
        assert!(state.transaction_pool().is_empty());
        assert_eq!(state.peers().get(TEST_NODE_URL), Some(&true));
        assert_eq!(node.balance("suntzunobody"), 0);
    }

    #[test]
    fn test_balance_counts_only_success() {
        let mut state = ChainState::new(Block::genesis().unwrap(), TEST_NODE_URL.to_string());

        let mut block = Block::new("0xprev", 0, 1).unwrap();
        let mut credited = Transaction::new(BLOCKCHAIN_ADDRESS, "alice", 500, vec![]).unwrap();
        credited.set_status(TxStatus::Success);
        block.push_transaction(credited);
        let mut ignored = Transaction::new(BLOCKCHAIN_ADDRESS, "alice", 900, vec![]).unwrap();
        ignored.set_status(TxStatus::Failed);
        block.push_transaction(ignored);
        state.push_block_for_test(block);

        assert_eq!(state.balance("alice"), 500);
    }

    #[test]
    fn test_balance_saturates_instead_of_wrapping() {
        let mut state = ChainState::new(Block::genesis().unwrap(), TEST_NODE_URL.to_string());

        let mut block = Block::new("0xprev", 0, 1).unwrap();
        let mut debit = Transaction::new("alice", "bob", 300, vec![]).unwrap();
        debit.set_status(TxStatus::Success);
        block.push_transaction(debit);
        state.push_block_for_test(block);

        assert_eq!(state.balance("alice"), 0);
        assert_eq!(state.balance("bob"), 300);
    }

    #[test]
    fn test_admit_valid_transaction() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), 5000);

        let admitted = node
            .admit_transaction(signed_transfer(&wallet, "bob", 2000))
            .unwrap()
            .expect("not a duplicate");
        assert_eq!(admitted.status(), TxStatus::VerificationSuccess);
        assert!(admitted.public_key().is_empty());
        // Not yet mined, so no balance movement.
        assert_eq!(node.balance("bob"), 0);
    }

    #[test]
    fn test_admit_unsigned_transaction_fails_verification() {
        let (node, _dir) = test_node();
        let txn = Transaction::new("alice", "bob", 10, vec![]).unwrap();
        let admitted = node.admit_transaction(txn).unwrap().unwrap();
        assert_eq!(admitted.status(), TxStatus::VerificationFailed);
    }

    #[test]
    fn test_admit_zero_value_fails_verification() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), 5000);
        let admitted = node
            .admit_transaction(signed_transfer(&wallet, "bob", 0))
            .unwrap()
            .unwrap();
        assert_eq!(admitted.status(), TxStatus::VerificationFailed);
    }

    #[test]
    fn test_admit_is_idempotent_by_hash() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), 5000);

        let txn = signed_transfer(&wallet, "bob", 2000);
        assert!(node.admit_transaction(txn.clone()).unwrap().is_some());
        assert!(node.admit_transaction(txn).unwrap().is_none());
        assert_eq!(node.snapshot().transaction_pool().len(), 1);
    }

    #[test]
    fn test_double_spend_simulation() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), 5000);

        let first = node
            .admit_transaction(signed_transfer(&wallet, "bob", 4000))
            .unwrap()
            .unwrap();
        let second = node
            .admit_transaction(signed_transfer(&wallet, "carol", 4000))
            .unwrap()
            .unwrap();

        assert_eq!(first.status(), TxStatus::VerificationSuccess);
        // Simulated balance after the first send is 1000 < 4000.
        assert_eq!(second.status(), TxStatus::VerificationFailed);
    }

    #[test]
    fn test_simulated_balance_skips_unverified_entries() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), 5000);

        let unsigned = Transaction::new(&wallet.address(), "bob", 4000, vec![]).unwrap();
        node.admit_transaction(unsigned).unwrap().unwrap();

        // The failed entry reserves nothing, so a real spend still fits.
        let spend = node
            .admit_transaction(signed_transfer(&wallet, "carol", 4000))
            .unwrap()
            .unwrap();
        assert_eq!(spend.status(), TxStatus::VerificationSuccess);
    }

    #[test]
    fn test_append_block_evicts_included_transactions() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), 5000);

        let pooled = node
            .admit_transaction(signed_transfer(&wallet, "bob", 2000))
            .unwrap()
            .unwrap();

        let prev_hash = node.last_block_hash().unwrap();
        let mut block = Block::new(&prev_hash, 0, 2).unwrap();
        block.add_transaction(pooled);
        node.append_block(block).unwrap();

        let state = node.snapshot();
        assert!(state.transaction_pool().is_empty());
        assert_eq!(state.blocks().len(), 3);
        assert_eq!(node.balance("bob"), 2000);
    }

    #[test]
    fn test_adopt_chain_replaces_suffix_and_cleans_pool() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), 5000);
        let pooled = node
            .admit_transaction(signed_transfer(&wallet, "bob", 2000))
            .unwrap()
            .unwrap();

        // Remote chain re-mines block 1 onward and includes the pooled send.
        let genesis_hash = node.snapshot().blocks()[0].hash().unwrap();
        let mut remote_1 = Block::new(&genesis_hash, 7, 1).unwrap();
        remote_1.add_transaction(pooled);
        let mut remote = vec![remote_1];
        let remote_2 = Block::new(&remote[0].hash().unwrap(), 8, 2).unwrap();
        remote.push(remote_2);

        node.adopt_chain(&remote).unwrap();

        let state = node.snapshot();
        assert_eq!(state.blocks().len(), 3);
        assert_eq!(state.blocks()[1].nonce(), 7);
        assert!(state.transaction_pool().is_empty());
    }

    #[test]
    fn test_adopt_chain_rejects_window_beyond_local_chain() {
        let (node, _dir) = test_node();
        let orphan = Block::new("0xelsewhere", 0, 40).unwrap();
        assert!(matches!(
            node.adopt_chain(&[orphan]),
            Err(NodeError::InvalidChain(_))
        ));
    }

    #[test]
    fn test_update_peers_keeps_self_live() {
        let (node, _dir) = test_node();
        let mut peers = BTreeMap::new();
        peers.insert("http://127.0.0.1:9000".to_string(), false);
        node.update_peers(peers).unwrap();

        let snapshot = node.peers();
        assert_eq!(snapshot.get(TEST_NODE_URL), Some(&true));
        assert_eq!(snapshot.get("http://127.0.0.1:9000"), Some(&false));
        assert!(node.live_peers().is_empty());
    }

    #[test]
    fn test_consensus_window_caps_block_count() {
        let (node, _dir) = test_node();
        for number in 1..=(FETCH_BLOCK_NUMBER as u64 + 5) {
            let prev_hash = node.last_block_hash().unwrap();
            node.append_block(Block::new(&prev_hash, 0, number).unwrap())
                .unwrap();
        }

        let window = node.consensus_window();
        assert_eq!(window.blocks().len(), FETCH_BLOCK_NUMBER);
        assert_eq!(
            window.blocks().last().unwrap().block_number(),
            FETCH_BLOCK_NUMBER as u64 + 5
        );
        assert!(window.transaction_pool().is_empty());
        assert!(window.address().is_empty());
    }

    #[test]
    fn test_non_rewarded_transactions_ordering() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), MINING_REWARD);

        let mined = node
            .admit_transaction(signed_transfer(&wallet, "bob", 100))
            .unwrap()
            .unwrap();
        let prev_hash = node.last_block_hash().unwrap();
        let mut block = Block::new(&prev_hash, 0, 2).unwrap();
        block.add_transaction(mined.clone());
        block.push_transaction(Transaction::new_reward("miner").unwrap());
        node.append_block(block).unwrap();

        let pooled = node
            .admit_transaction(signed_transfer(&wallet, "carol", 100))
            .unwrap()
            .unwrap();

        let listed = node.non_rewarded_transactions();
        // Pool entry first, then the mined transfer; faucet issues omitted.
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].transaction_hash(), pooled.transaction_hash());
        assert_eq!(listed[1].transaction_hash(), mined.transaction_hash());
        assert!(listed.iter().all(|txn| !txn.is_reward()));
    }

    #[test]
    fn test_bootstrap_restores_checkpoint() {
        let (store, _dir) = test_store();
        {
            let state = ChainState::new(Block::genesis().unwrap(), TEST_NODE_URL.to_string());
            let node = Node::new(state, store.clone()).unwrap();
            let prev_hash = node.last_block_hash().unwrap();
            node.append_block(Block::new(&prev_hash, 3, 1).unwrap())
                .unwrap();
        }

        let restored = Node::bootstrap(store, TEST_NODE_URL).unwrap();
        assert_eq!(restored.chain_length(), 2);
        assert_eq!(restored.self_address(), TEST_NODE_URL);
    }

    #[test]
    fn test_state_json_round_trip() {
        let wallet = Wallet::generate();
        let (node, _dir) = funded_node(&wallet.address(), 5000);
        node.admit_transaction(signed_transfer(&wallet, "bob", 100))
            .unwrap()
            .unwrap();

        let first = node.state_json().unwrap();
        let decoded: ChainState = from_json_slice(&first).unwrap();
        let second = to_canonical_json(&decoded).unwrap();
        assert_eq!(first, second);
    }
}
