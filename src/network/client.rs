use crate::config::SERVER_STATUS_BODY;
use crate::core::{ChainState, Transaction};
use crate::error::Result;
use log::debug;
use reqwest::blocking::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-request timeout for all outbound peer calls. A peer that does not
/// answer within this window counts as down for the current round.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking HTTP client for every outbound call a node makes to its peers.
#[derive(Clone)]
pub struct PeerClient {
    http: Client,
}

impl PeerClient {
    pub fn new() -> Result<PeerClient> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(PeerClient { http })
    }

    /// Liveness probe: a peer is up iff its status endpoint answers with
    /// the literal status body.
    pub fn check_status(&self, peer: &str) -> bool {
        let url = format!("{peer}/check-server-status");
        match self.http.get(&url).send().and_then(|r| r.text()) {
            Ok(body) => body == SERVER_STATUS_BODY,
            Err(e) => {
                debug!("Status probe of {peer} failed: {e}");
                false
            }
        }
    }

    /// Push our peer map to one peer.
    pub fn send_peers_list(&self, peer: &str, peers: &BTreeMap<String, bool>) -> Result<()> {
        let url = format!("{peer}/send-peers-list");
        self.http.post(&url).json(peers).send()?;
        Ok(())
    }

    /// Gossip one transaction to one peer.
    pub fn send_transaction(&self, peer: &str, txn: &Transaction) -> Result<()> {
        let url = format!("{peer}/send-transaction");
        self.http.post(&url).json(txn).send()?;
        Ok(())
    }

    /// Fetch a peer's consensus window (its most recent blocks).
    pub fn fetch_blocks(&self, peer: &str) -> Result<ChainState> {
        let url = format!("{peer}/fetch-consensus-blocks");
        Ok(self.http.get(&url).send()?.json()?)
    }

    /// Fetch a remote node's full state, used once at boot when joining an
    /// existing network.
    pub fn sync_state(&self, remote: &str) -> Result<ChainState> {
        let url = format!("{remote}/");
        Ok(self.http.get(&url).send()?.json()?)
    }

    /// Raw balance body from a node, proxied by the wallet frontend.
    pub fn fetch_balance_raw(&self, node: &str, address: &str) -> Result<String> {
        let url = format!("{node}/balance?address={address}");
        Ok(self.http.get(&url).send()?.text()?)
    }

    /// Submit a signed transaction to a node, returning its echo body.
    pub fn forward_transaction(&self, node: &str, txn: &Transaction) -> Result<String> {
        let url = format!("{node}/send-transaction");
        Ok(self.http.post(&url).json(txn).send()?.text()?)
    }
}
