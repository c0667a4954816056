//! Wallet: key management, address derivation, transaction signing
//!
//! The ledger verifies ECDSA P-256 signatures in ASN.1 DER form; this
//! module owns the key encodings those checks depend on, plus the wallet
//! HTTP frontend.

pub mod server;
pub mod wallet;

pub use server::run_wallet_server;
pub use wallet::{address_from_public_key_hex, decode_public_key, Wallet};
