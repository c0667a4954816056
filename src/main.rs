use clap::Parser;
use log::{error, info, LevelFilter};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use suntzuchain::config::{BLOCKCHAIN_NAME, DB_FILE};
use suntzuchain::core::{run_mining_loop, Node};
use suntzuchain::network::{run_consensus, run_dial_update, run_node_server, PeerClient};
use suntzuchain::storage::CheckpointStore;
use suntzuchain::wallet::run_wallet_server;
use suntzuchain::{Command, Opt, Result};

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<()> {
    match command {
        Command::Chain {
            port,
            miner,
            remote_node,
        } => run_chain(port, miner, remote_node),
        Command::Wallet { port, node } => run_wallet_server(port, &node),
    }
}

/// Boot the ledger node and run until SIGINT: HTTP server on the main
/// thread, miner, dial-update, and consensus on their own threads.
fn run_chain(port: u16, miner: String, remote_node: Option<String>) -> Result<()> {
    info!("{BLOCKCHAIN_NAME} node starting on port {port}");

    let store = CheckpointStore::open(format!("{port}/{DB_FILE}"))?;
    let self_url = format!("http://127.0.0.1:{port}");
    let client = Arc::new(PeerClient::new()?);

    let node = match remote_node {
        Some(remote) => {
            info!("Syncing blockchain from {remote}");
            let synced = client.sync_state(&remote)?;
            let node = Node::from_synced(synced, &self_url, store)?;
            info!("Blockchain synced");
            node
        }
        None => Node::bootstrap(store, &self_url)?,
    };
    let node = Arc::new(node);
    let shutdown = Arc::new(AtomicBool::new(false));

    install_signal_handler(Arc::clone(&node), Arc::clone(&shutdown))?;

    {
        let node = Arc::clone(&node);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || run_mining_loop(&node, &miner, &shutdown));
    }
    {
        let node = Arc::clone(&node);
        let client = Arc::clone(&client);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || run_dial_update(&node, &client, &shutdown));
    }
    {
        let node = Arc::clone(&node);
        let client = Arc::clone(&client);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || run_consensus(&node, &client, &shutdown));
    }

    run_node_server(node, client, port, shutdown)
}

/// Terminate cleanly on SIGINT/SIGTERM: flip the shutdown flag so loops
/// stop at their next suspension point, flush the checkpoint, and exit.
fn install_signal_handler(node: Arc<Node>, shutdown: Arc<AtomicBool>) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("Shutting down");
            shutdown.store(true, Ordering::Relaxed);
            if let Err(e) = node.flush() {
                error!("Failed to flush checkpoint: {e}");
            }
            process::exit(0);
        }
    });
    Ok(())
}
