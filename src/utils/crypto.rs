use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};

use crate::config::HEX_PREFIX;
use crate::error::{NodeError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| NodeError::Crypto(format!("System time error: {e}")))?
        .as_secs();

    if duration > i64::MAX as u64 {
        return Err(NodeError::Crypto("Timestamp overflow".to_string()));
    }

    Ok(duration as i64)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// `"0x"`-prefixed lowercase hex SHA-256 digest. Every hash that travels
/// between nodes (block hashes, transaction hashes) is in this form.
pub fn hex_digest(data: &[u8]) -> String {
    let digest = sha256_digest(data);
    format!("{}{}", HEX_PREFIX, HEXLOWER.encode(digest.as_slice()))
}
