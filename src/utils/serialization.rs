//! Canonical JSON codec
//!
//! Hashes and signatures are computed over JSON bytes, so the encoding must
//! be byte-deterministic: struct fields serialize in declaration order,
//! peer maps are `BTreeMap` (sorted keys), and byte strings are base64.
//! Any change here is a hard fork.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize a value to its canonical JSON byte form.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Decode a value from JSON bytes.
pub fn from_json_slice<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serde adapter encoding `Vec<u8>` fields as base64 strings, used for the
/// `data` and `signature` fields of transactions. Empty bytes encode as `""`.
pub mod base64_bytes {
    use data_encoding::BASE64;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
