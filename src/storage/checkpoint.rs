use crate::config::DB_KEY;
use crate::core::ChainState;
use crate::error::{NodeError, Result};
use crate::utils::{from_json_slice, to_canonical_json};
use sled::Db;
use std::path::Path;

/// Sled-backed checkpoint of the node state.
///
/// One key, one JSON value. The store path embeds the node port (e.g.
/// `8000/suntzuchain.db`), so several nodes can run out of one directory.
#[derive(Clone)]
pub struct CheckpointStore {
    db: Db,
}

impl CheckpointStore {
    pub fn open(path: impl AsRef<Path>) -> Result<CheckpointStore> {
        let db = sled::open(path.as_ref())
            .map_err(|e| NodeError::Database(format!("Failed to open checkpoint store: {e}")))?;
        Ok(CheckpointStore { db })
    }

    /// Overwrite the checkpoint with the given state and flush to disk.
    pub fn save(&self, state: &ChainState) -> Result<()> {
        let bytes = to_canonical_json(state)?;
        self.db
            .insert(DB_KEY, bytes)
            .map_err(|e| NodeError::Database(format!("Failed to write checkpoint: {e}")))?;
        self.db
            .flush()
            .map_err(|e| NodeError::Database(format!("Failed to flush checkpoint: {e}")))?;
        Ok(())
    }

    /// Read the checkpoint back, if one has ever been written.
    pub fn load(&self) -> Result<Option<ChainState>> {
        let bytes = self
            .db
            .get(DB_KEY)
            .map_err(|e| NodeError::Database(format!("Failed to read checkpoint: {e}")))?;
        match bytes {
            Some(bytes) => Ok(Some(from_json_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| NodeError::Database(format!("Failed to flush checkpoint: {e}")))?;
        Ok(())
    }
}
