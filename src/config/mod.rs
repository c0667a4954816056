//! Protocol configuration
//!
//! Fixed constants shared by every node on the network. Changing any of
//! these forks the chain, so they live in one place.

pub mod settings;

pub use settings::{
    ADDRESS_PREFIX, BLOCKCHAIN_ADDRESS, BLOCKCHAIN_NAME, CONSENSUS_PAUSE_INTERVAL, CURRENCY_NAME,
    DB_FILE, DB_KEY, DECIMAL, FETCH_BLOCK_NUMBER, GENESIS_PREV_HASH, HEX_PREFIX,
    MINING_DIFFICULTY, MINING_REWARD, PEER_LIST_UPDATE_INTERVAL, PEER_PING_INTERVAL,
    SERVER_STATUS_BODY,
};
