use crate::config::{ADDRESS_PREFIX, HEX_PREFIX};
use crate::core::Transaction;
use crate::error::{NodeError, Result};
use crate::utils::sha256_digest;
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::generic_array::GenericArray;
use p256::EncodedPoint;
use rand::rngs::OsRng;

/// Hex length of one P-256 coordinate (32 bytes).
const COORDINATE_HEX_LEN: usize = 64;

/// An ECDSA P-256 keypair.
///
/// Encodings on the wire:
/// - private key: `"0x"` + minimal hex of the scalar (no left zero-padding)
/// - public key: `"0x"` + X + Y, each coordinate zero-padded to 64 hex chars
/// - signature: ASN.1 DER bytes
pub struct Wallet {
    signing_key: SigningKey,
}

impl Wallet {
    /// Generate a fresh random keypair.
    pub fn generate() -> Wallet {
        Wallet {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Reconstruct a wallet from a `"0x"`-prefixed private key hex string.
    pub fn from_private_key_hex(private_key_hex: &str) -> Result<Wallet> {
        let scalar = decode_hex_scalar(private_key_hex)?;
        let signing_key = SigningKey::from_slice(&scalar)
            .map_err(|e| NodeError::Crypto(format!("Invalid private key: {e}")))?;
        Ok(Wallet { signing_key })
    }

    pub fn private_key_hex(&self) -> String {
        let hex = HEXLOWER.encode(&self.signing_key.to_bytes());
        let trimmed = hex.trim_start_matches('0');
        // A zero scalar is not a valid key, so trimmed is never empty.
        format!("{HEX_PREFIX}{trimmed}")
    }

    pub fn public_key_hex(&self) -> String {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let x = point
            .x()
            .expect("P-256 public key is never the identity point");
        let y = point
            .y()
            .expect("P-256 public key is never the identity point");
        format!(
            "{HEX_PREFIX}{}{}",
            HEXLOWER.encode(x),
            HEXLOWER.encode(y)
        )
    }

    /// Address of this wallet's public key.
    pub fn address(&self) -> String {
        address_from_public_key_hex(&self.public_key_hex())
    }

    /// Sign a transaction: hash its signing payload with SHA-256, sign the
    /// digest, and attach the DER signature plus this wallet's public key.
    pub fn sign_transaction(&self, mut txn: Transaction) -> Result<Transaction> {
        let payload = txn.signing_payload()?;
        let signature: Signature = self.signing_key.sign(&payload);
        txn.attach_signature(signature.to_der().as_bytes().to_vec(), self.public_key_hex());
        Ok(txn)
    }
}

/// `"suntzuchain"` + the last 40 hex chars of SHA-256 over the public key
/// hex without its `0x` prefix.
pub fn address_from_public_key_hex(public_key_hex: &str) -> String {
    let stripped = public_key_hex
        .strip_prefix(HEX_PREFIX)
        .unwrap_or(public_key_hex);
    let digest = HEXLOWER.encode(&sha256_digest(stripped.as_bytes()));
    format!("{ADDRESS_PREFIX}{}", &digest[digest.len() - 40..])
}

/// Decode a `"0x"` + X + Y public key hex string into a verifying key. The
/// coordinate split is at offset 64 after the prefix.
pub fn decode_public_key(public_key_hex: &str) -> Result<VerifyingKey> {
    let stripped = public_key_hex
        .strip_prefix(HEX_PREFIX)
        .unwrap_or(public_key_hex);
    if stripped.len() != 2 * COORDINATE_HEX_LEN {
        return Err(NodeError::Crypto(format!(
            "Public key hex must be {} characters, got {}",
            2 * COORDINATE_HEX_LEN,
            stripped.len()
        )));
    }

    let x = decode_coordinate(&stripped[..COORDINATE_HEX_LEN])?;
    let y = decode_coordinate(&stripped[COORDINATE_HEX_LEN..])?;
    let point = EncodedPoint::from_affine_coordinates(
        GenericArray::from_slice(&x),
        GenericArray::from_slice(&y),
        false,
    );
    VerifyingKey::from_encoded_point(&point)
        .map_err(|e| NodeError::Crypto(format!("Invalid public key point: {e}")))
}

fn decode_coordinate(hex: &str) -> Result<Vec<u8>> {
    HEXLOWER_PERMISSIVE
        .decode(hex.as_bytes())
        .map_err(|e| NodeError::Crypto(format!("Invalid coordinate hex: {e}")))
}

/// Decode a private key hex string into the 32-byte scalar, left-padding
/// the minimal hex form back to full width.
fn decode_hex_scalar(private_key_hex: &str) -> Result<Vec<u8>> {
    let stripped = private_key_hex
        .strip_prefix(HEX_PREFIX)
        .unwrap_or(private_key_hex);
    if stripped.is_empty() || stripped.len() > 2 * COORDINATE_HEX_LEN {
        return Err(NodeError::Crypto(format!(
            "Private key hex length {} out of range",
            stripped.len()
        )));
    }
    let padded = format!("{:0>width$}", stripped, width = 2 * COORDINATE_HEX_LEN);
    HEXLOWER_PERMISSIVE
        .decode(padded.as_bytes())
        .map_err(|e| NodeError::Crypto(format!("Invalid private key hex: {e}")))
}
