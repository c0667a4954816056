//! Peer-to-peer networking
//!
//! Nodes talk plain HTTP/JSON: an inbound server per node and outbound
//! calls for gossip (liveness, peer lists, transactions) and consensus
//! (chain-suffix fetch). All loops run on dedicated threads.

pub mod client;
pub mod consensus;
pub mod gossip;
pub mod server;

pub use client::PeerClient;
pub use consensus::{consensus_round, run_consensus, verify_chain};
pub use gossip::{broadcast_peer_list, broadcast_transaction, dial_update_round, run_dial_update};
pub use server::run_node_server;
