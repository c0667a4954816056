// Membership gossip: liveness probing, peer-list broadcast, transaction
// broadcast. Network I/O here never holds the node mutex; every loop body
// works on snapshots and re-enters the node only for the final map update.

use crate::config::{PEER_LIST_UPDATE_INTERVAL, PEER_PING_INTERVAL};
use crate::core::{Node, Transaction};
use crate::error::Result;
use crate::network::PeerClient;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Send our peer map to every live peer, pacing the sends.
pub fn broadcast_peer_list(node: &Node, client: &PeerClient) {
    let peers = node.peers();
    for peer in node.live_peers() {
        if let Err(e) = client.send_peers_list(&peer, &peers) {
            warn!("Failed to send peer list to {peer}: {e}");
        }
        thread::sleep(PEER_LIST_UPDATE_INTERVAL);
    }
}

/// Gossip one admitted transaction to every live peer, pacing the sends.
pub fn broadcast_transaction(node: &Node, client: &PeerClient, txn: &Transaction) {
    for peer in node.live_peers() {
        info!(
            "Broadcasting transaction {} to {peer}",
            txn.transaction_hash()
        );
        if let Err(e) = client.send_transaction(&peer, txn) {
            warn!("Failed to send transaction to {peer}: {e}");
        }
        thread::sleep(PEER_LIST_UPDATE_INTERVAL);
    }
}

/// One dial-update pass: probe every non-self peer, mark self live, install
/// the fresh map, then broadcast it.
pub fn dial_update_round(node: &Node, client: &PeerClient) -> Result<()> {
    let self_address = node.self_address();
    info!("Pinging peers {:?}", node.peers().keys().collect::<Vec<_>>());

    let mut refreshed = BTreeMap::new();
    for (peer, _) in node.peers() {
        if peer == self_address {
            refreshed.insert(peer, true);
        } else {
            let live = client.check_status(&peer);
            refreshed.insert(peer, live);
            thread::sleep(PEER_LIST_UPDATE_INTERVAL);
        }
    }

    node.update_peers(refreshed)?;
    broadcast_peer_list(node, client);
    Ok(())
}

/// Periodic dial-update loop; runs until shutdown.
pub fn run_dial_update(node: &Node, client: &PeerClient, shutdown: &AtomicBool) {
    loop {
        thread::sleep(PEER_PING_INTERVAL);
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        if let Err(e) = dial_update_round(node, client) {
            error!("Peer update aborted: {e}");
            process::exit(1);
        }
    }
}
