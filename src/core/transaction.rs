// Value-transfer record of the ledger. The account model is balance-based:
// a transaction moves `value` from one address to another, and the ledger
// folds balances over the whole chain instead of tracking outputs.

use crate::config::{BLOCKCHAIN_ADDRESS, MINING_REWARD};
use crate::error::Result;
use crate::utils::{base64_bytes, current_timestamp, hex_digest, to_canonical_json};
use crate::wallet::decode_public_key;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::Signature;
use serde::{Deserialize, Serialize};

/// Lifecycle of a transaction.
///
/// Admission stamps `VerificationSuccess` or `VerificationFailed`; mining
/// flips those to `Success` or `Failed` when the transaction lands in a
/// block. Only `Success` transactions move value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Pending,
    VerificationSuccess,
    VerificationFailed,
    Success,
    Failed,
}

/// A signed value transfer.
///
/// Field order is the canonical JSON order; do not reorder. The
/// `transaction_hash` is computed once at construction over the record with
/// the hash field empty, and is the transaction's identity from then on
/// (later status changes do not re-hash).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    from: String,
    to: String,
    value: u64,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
    status: TxStatus,
    timestamp: u64,
    transaction_hash: String,
    public_key: String,
    #[serde(with = "base64_bytes")]
    signature: Vec<u8>,
}

impl Transaction {
    /// Create a new unsigned transaction with status `Pending` and a fresh
    /// timestamp, and seal its hash.
    pub fn new(from: &str, to: &str, value: u64, data: Vec<u8>) -> Result<Transaction> {
        let mut txn = Transaction {
            from: from.to_string(),
            to: to.to_string(),
            value,
            data,
            status: TxStatus::Pending,
            timestamp: current_timestamp()? as u64,
            transaction_hash: String::new(),
            public_key: String::new(),
            signature: vec![],
        };
        txn.transaction_hash = txn.compute_hash()?;
        Ok(txn)
    }

    /// Create the mining reward credited to `miner_address`. Rewards are
    /// issued by the faucet identity, carry no signature, and are born with
    /// status `Success`.
    pub fn new_reward(miner_address: &str) -> Result<Transaction> {
        let mut txn = Transaction {
            from: BLOCKCHAIN_ADDRESS.to_string(),
            to: miner_address.to_string(),
            value: MINING_REWARD,
            data: vec![],
            status: TxStatus::Success,
            timestamp: current_timestamp()? as u64,
            transaction_hash: String::new(),
            public_key: String::new(),
            signature: vec![],
        };
        txn.transaction_hash = txn.compute_hash()?;
        Ok(txn)
    }

    /// Hash of the record with the `transaction_hash` field emptied:
    /// `"0x" + hex(SHA256(canonical_json))`.
    pub fn compute_hash(&self) -> Result<String> {
        let mut projection = self.clone();
        projection.transaction_hash = String::new();
        let bytes = to_canonical_json(&projection)?;
        Ok(hex_digest(&bytes))
    }

    /// Canonical JSON of the record with `signature` and `public_key`
    /// emptied. This is the byte string signatures commit to.
    pub fn signing_payload(&self) -> Result<Vec<u8>> {
        let mut projection = self.clone();
        projection.signature = vec![];
        projection.public_key = String::new();
        to_canonical_json(&projection)
    }

    /// Admission-level validity: positive value and a good signature.
    pub fn verify(&self) -> bool {
        if self.value == 0 {
            return false;
        }
        self.verify_signature()
    }

    /// Verify the attached ASN.1 DER signature against the attached public
    /// key over the signing payload. Absent signature or key fails.
    pub fn verify_signature(&self) -> bool {
        if self.signature.is_empty() || self.public_key.is_empty() {
            return false;
        }

        let verifying_key = match decode_public_key(&self.public_key) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let signature = match Signature::from_der(&self.signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        let payload = match self.signing_payload() {
            Ok(payload) => payload,
            Err(_) => return false,
        };

        verifying_key.verify(&payload, &signature).is_ok()
    }

    /// Whether this transaction was issued by the faucet identity.
    pub fn is_reward(&self) -> bool {
        self.from == BLOCKCHAIN_ADDRESS
    }

    pub fn from_address(&self) -> &str {
        &self.from
    }

    pub fn to_address(&self) -> &str {
        &self.to
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn status(&self) -> TxStatus {
        self.status
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn transaction_hash(&self) -> &str {
        &self.transaction_hash
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn set_status(&mut self, status: TxStatus) {
        self.status = status;
    }

    /// The public key is dropped once admission has verified the signature.
    pub(crate) fn clear_public_key(&mut self) {
        self.public_key = String::new();
    }

    /// Attach a DER signature and the signer's public key hex.
    pub(crate) fn attach_signature(&mut self, signature: Vec<u8>, public_key_hex: String) {
        self.signature = signature;
        self.public_key = public_key_hex;
    }
}
