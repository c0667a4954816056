// Inbound HTTP surface of the ledger node. Handlers only take consistent
// snapshots or enqueue mutations; admission and peer updates run on their
// own threads so slow gossip never stalls the accept loop.

use crate::config::SERVER_STATUS_BODY;
use crate::core::{Node, Transaction};
use crate::error::NodeError;
use crate::network::{broadcast_transaction, PeerClient};
use crate::utils::to_canonical_json;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct BalanceResponse {
    balance: u64,
}

#[derive(Serialize)]
struct AckResponse {
    success: String,
}

enum Reply {
    Json(Vec<u8>),
    Text(&'static str),
    BadRequest(String),
}

/// Run the node HTTP server on `127.0.0.1:{port}` until shutdown.
pub fn run_node_server(
    node: Arc<Node>,
    client: Arc<PeerClient>,
    port: u16,
    shutdown: Arc<AtomicBool>,
) -> crate::error::Result<()> {
    let server = Server::http(("127.0.0.1", port))
        .map_err(|e| NodeError::Network(format!("Failed to bind to port {port}: {e}")))?;
    info!("Node server listening on 127.0.0.1:{port}");

    for request in server.incoming_requests() {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(());
        }
        handle_request(&node, &client, request);
    }
    Ok(())
}

fn handle_request(node: &Arc<Node>, client: &Arc<PeerClient>, mut request: Request) {
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (url, String::new()),
    };
    let method = request.method().clone();

    let mut body = String::new();
    if method == Method::Post && request.as_reader().read_to_string(&mut body).is_err() {
        send_reply(request, Reply::BadRequest("Invalid body".to_string()));
        return;
    }

    let reply = match (method, path.as_str()) {
        (Method::Get, "/") => node_state(node),
        (Method::Get, "/balance") => balance(node, &query),
        (Method::Get, "/get-non-rewarded-transactions") => {
            json_reply(&node.non_rewarded_transactions())
        }
        (Method::Post, "/send-transaction") => send_transaction(node, client, &body),
        (Method::Post, "/send-peers-list") => send_peers_list(node, &body),
        (Method::Get, "/check-server-status") => Reply::Text(SERVER_STATUS_BODY),
        (Method::Get, "/fetch-consensus-blocks") => json_reply(&node.consensus_window()),
        _ => Reply::BadRequest("Invalid method".to_string()),
    };

    send_reply(request, reply);
}

fn node_state(node: &Arc<Node>) -> Reply {
    match node.state_json() {
        Ok(bytes) => Reply::Json(bytes),
        Err(e) => Reply::BadRequest(e.to_string()),
    }
}

fn balance(node: &Arc<Node>, query: &str) -> Reply {
    let address = query_param(query, "address").unwrap_or_default();
    json_reply(&BalanceResponse {
        balance: node.balance(&address),
    })
}

/// Decode the posted transaction, echo it back, and run admission plus
/// gossip on a worker thread.
fn send_transaction(node: &Arc<Node>, client: &Arc<PeerClient>, body: &str) -> Reply {
    let txn: Transaction = match serde_json::from_str(body) {
        Ok(txn) => txn,
        Err(e) => return Reply::BadRequest(format!("Invalid transaction: {e}")),
    };

    let echo = json_reply(&txn);
    let node = Arc::clone(node);
    let client = Arc::clone(client);
    thread::spawn(move || match node.admit_transaction(txn) {
        Ok(Some(admitted)) => broadcast_transaction(&node, &client, &admitted),
        Ok(None) => {}
        Err(e) => {
            error!("Transaction admission aborted: {e}");
            process::exit(1);
        }
    });
    echo
}

/// Decode the posted peer map and install it on a worker thread.
fn send_peers_list(node: &Arc<Node>, body: &str) -> Reply {
    let peers: BTreeMap<String, bool> = match serde_json::from_str(body) {
        Ok(peers) => peers,
        Err(e) => return Reply::BadRequest(format!("Invalid peers list: {e}")),
    };

    let node = Arc::clone(node);
    thread::spawn(move || {
        if let Err(e) = node.update_peers(peers) {
            error!("Peer update aborted: {e}");
            process::exit(1);
        }
    });
    json_reply(&AckResponse {
        success: "success".to_string(),
    })
}

fn json_reply<T: Serialize>(value: &T) -> Reply {
    match to_canonical_json(value) {
        Ok(bytes) => Reply::Json(bytes),
        Err(e) => Reply::BadRequest(e.to_string()),
    }
}

fn send_reply(request: Request, reply: Reply) {
    let result = match reply {
        Reply::Json(bytes) => request.respond(Response::from_data(bytes).with_header(json_header())),
        Reply::Text(body) => request.respond(Response::from_string(body)),
        Reply::BadRequest(message) => {
            request.respond(Response::from_string(message).with_status_code(400))
        }
    };
    if let Err(e) = result {
        warn!("Failed to write response: {e}");
    }
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("static header is always valid")
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}
