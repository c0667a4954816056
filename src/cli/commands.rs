use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "suntzuchain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "chain", about = "Start a ledger node")]
    Chain {
        #[arg(long, default_value_t = 8000, help = "Port to run the node server on")]
        port: u16,
        #[arg(long, help = "Address that receives mining rewards")]
        miner: String,
        #[arg(
            long = "remote_node",
            help = "URL of an existing node to sync the chain from"
        )]
        remote_node: Option<String>,
    },
    #[command(name = "wallet", about = "Start a wallet frontend")]
    Wallet {
        #[arg(long, default_value_t = 8080, help = "Port to run the wallet server on")]
        port: u16,
        #[arg(
            long,
            default_value = "http://127.0.0.1:8000",
            help = "URL of the ledger node to talk to"
        )]
        node: String,
    },
}
