//! # SunTzuChain
//!
//! A minimal proof-of-work cryptocurrency node: a replicated account-based
//! ledger with a signed-transaction mempool, a difficulty-bounded mining
//! loop, HTTP gossip of transactions and membership, and longest-chain
//! consensus that adopts heavier remote chains.
//!
//! ## Layout
//! - `core/`: blocks, transactions, the chain + mempool state, the miner
//! - `wallet/`: ECDSA P-256 keys, signing, addresses, wallet HTTP frontend
//! - `network/`: outbound peer client, gossip loops, consensus, node server
//! - `storage/`: sled-backed JSON checkpoint of the whole node state
//! - `config/`: protocol constants shared by every node
//! - `utils/`: SHA-256 digests and the canonical JSON codec
//! - `cli/`: clap argument parsing for the `chain` and `wallet` commands
//!
//! All chain, mempool, and peer mutations are serialized by one mutex on
//! [`core::Node`] and checkpointed before the lock is released.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;
pub mod wallet;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use core::{Block, ChainState, Node, Transaction, TxStatus};
pub use error::{NodeError, Result};
pub use network::{PeerClient, run_consensus, run_dial_update, run_node_server, verify_chain};
pub use storage::CheckpointStore;
pub use wallet::{run_wallet_server, Wallet};
