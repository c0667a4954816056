// Wallet HTTP frontend: key generation, balance proxying, and signing of
// outgoing transfers. Holds no state of its own; every ledger question is
// forwarded to the configured node.

use crate::core::Transaction;
use crate::error::NodeError;
use crate::network::PeerClient;
use crate::wallet::Wallet;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::Read;
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Serialize)]
struct NewWalletResponse {
    private_key_hex: String,
    public_key_hex: String,
    address: String,
}

/// Body of `POST /send-wallet-transaction`.
#[derive(Deserialize)]
struct SendRequest {
    to: String,
    value: u64,
}

enum Reply {
    Json(String),
    BadRequest(String),
}

/// Run the wallet frontend on `127.0.0.1:{port}`, forwarding to `node_url`.
pub fn run_wallet_server(port: u16, node_url: &str) -> crate::error::Result<()> {
    let client = PeerClient::new()?;
    let server = Server::http(("127.0.0.1", port))
        .map_err(|e| NodeError::Network(format!("Failed to bind to port {port}: {e}")))?;
    info!("Wallet server listening on 127.0.0.1:{port}");

    for mut request in server.incoming_requests() {
        let url = request.url().to_string();
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (url, String::new()),
        };
        let method = request.method().clone();

        let mut body = String::new();
        if method == Method::Post && request.as_reader().read_to_string(&mut body).is_err() {
            send_reply(request, Reply::BadRequest("Invalid body".to_string()));
            continue;
        }

        let reply = match (method, path.as_str()) {
            (Method::Get, "/create-new-wallet") => create_new_wallet(),
            (Method::Get, "/total-from-wallet") => total_from_wallet(&client, node_url, &query),
            (Method::Post, "/send-wallet-transaction") => {
                send_wallet_transaction(&client, node_url, &query, &body)
            }
            _ => Reply::BadRequest("Invalid method".to_string()),
        };
        send_reply(request, reply);
    }
    Ok(())
}

fn create_new_wallet() -> Reply {
    let wallet = Wallet::generate();
    let response = NewWalletResponse {
        private_key_hex: wallet.private_key_hex(),
        public_key_hex: wallet.public_key_hex(),
        address: wallet.address(),
    };
    match serde_json::to_string(&response) {
        Ok(json) => Reply::Json(json),
        Err(e) => Reply::BadRequest(e.to_string()),
    }
}

fn total_from_wallet(client: &PeerClient, node_url: &str, query: &str) -> Reply {
    let address = query_param(query, "address").unwrap_or_default();
    match client.fetch_balance_raw(node_url, &address) {
        Ok(body) => Reply::Json(body),
        Err(e) => Reply::BadRequest(e.to_string()),
    }
}

/// Rebuild the wallet from the posted private key, sign a fresh transfer,
/// and forward it to the node, echoing the node's response.
fn send_wallet_transaction(
    client: &PeerClient,
    node_url: &str,
    query: &str,
    body: &str,
) -> Reply {
    let private_key_hex = match query_param(query, "privateKey") {
        Some(key) => key,
        None => return Reply::BadRequest("Missing privateKey".to_string()),
    };
    let send: SendRequest = match serde_json::from_str(body) {
        Ok(send) => send,
        Err(e) => return Reply::BadRequest(format!("Invalid request: {e}")),
    };
    let wallet = match Wallet::from_private_key_hex(&private_key_hex) {
        Ok(wallet) => wallet,
        Err(e) => return Reply::BadRequest(e.to_string()),
    };

    let signed = Transaction::new(&wallet.address(), &send.to, send.value, vec![])
        .and_then(|txn| wallet.sign_transaction(txn));
    let signed = match signed {
        Ok(signed) => signed,
        Err(e) => return Reply::BadRequest(e.to_string()),
    };

    match client.forward_transaction(node_url, &signed) {
        Ok(echo) => Reply::Json(echo),
        Err(e) => Reply::BadRequest(e.to_string()),
    }
}

fn send_reply(request: Request, reply: Reply) {
    let result = match reply {
        Reply::Json(body) => request.respond(
            Response::from_string(body).with_header(
                Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                    .expect("static header is always valid"),
            ),
        ),
        Reply::BadRequest(message) => {
            request.respond(Response::from_string(message).with_status_code(400))
        }
    };
    if let Err(e) = result {
        warn!("Failed to write response: {e}");
    }
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}
