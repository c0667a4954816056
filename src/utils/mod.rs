//! Utility functions and helpers
//!
//! This module contains the hashing primitives and the canonical JSON
//! codec used for block hashes, transaction hashes, and signatures.

pub mod crypto;
pub mod serialization;

pub use crypto::{current_timestamp, hex_digest, sha256_digest};
pub use serialization::{base64_bytes, from_json_slice, to_canonical_json};
