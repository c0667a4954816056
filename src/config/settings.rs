use std::time::Duration;

/// Human-readable network name, used as the log prefix.
pub const BLOCKCHAIN_NAME: &str = "SunTzuChain";

/// Ticker of the native currency.
pub const CURRENCY_NAME: &str = "SZU";

/// Smallest-unit scale: 1 SZU = `DECIMAL` base units.
pub const DECIMAL: u64 = 100;

/// Reward credited to the miner of each block, in base units.
pub const MINING_REWARD: u64 = 100 * DECIMAL;

/// Number of leading `'0'` hex characters (after the `0x` prefix) a block
/// hash must carry to satisfy proof-of-work.
pub const MINING_DIFFICULTY: usize = 5;

/// Reserved issuer identity used as the `from` of reward transactions.
/// Nothing can spend from it; the balance fold only ever debits it.
pub const BLOCKCHAIN_ADDRESS: &str = "SunTzu_Faucet";

/// Prefix of every wallet address on this network.
pub const ADDRESS_PREFIX: &str = "suntzuchain";

/// Prefix of every hex-encoded hash and key.
pub const HEX_PREFIX: &str = "0x";

/// `prev_hash` of the genesis block.
pub const GENESIS_PREV_HASH: &str = "0x0";

/// Checkpoint database file name; the full path embeds the node port so
/// colocated nodes stay isolated.
pub const DB_FILE: &str = "suntzuchain.db";

/// Key under which the whole node state is checkpointed.
pub const DB_KEY: &str = "blockchain_key";

/// Body returned by (and expected from) `/check-server-status`.
pub const SERVER_STATUS_BODY: &str = "running";

/// Delay between consecutive sends when broadcasting to the peer set, and
/// between consecutive liveness probes.
pub const PEER_LIST_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// Period of the dial-update loop that re-probes peer liveness.
pub const PEER_PING_INTERVAL: Duration = Duration::from_secs(60);

/// Pause between consensus rounds.
pub const CONSENSUS_PAUSE_INTERVAL: Duration = Duration::from_secs(10);

/// Maximum number of most-recent blocks served to a consensus fetch.
pub const FETCH_BLOCK_NUMBER: usize = 50;
