//! Canonical encoding of key and key-format messages.
//!
//! Messages are exchanged as their `serde_json` encoding. Nothing outside this
//! module looks at the encoding itself.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::error::{KeyManagerError, KeyManagerResult};

pub fn encode<M: Serialize + ?Sized>(message: &M) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(message)
}

/// Decodes a serialized key format. Parse failures are `UnsupportedFormat`.
pub fn decode_key_format<F: DeserializeOwned>(bytes: &[u8]) -> KeyManagerResult<F> {
    serde_json::from_slice(bytes).map_err(|e| {
        KeyManagerError::UnsupportedFormat(format!(
            "cannot parse {}: {e}",
            std::any::type_name::<F>()
        ))
    })
}

/// Decodes serialized key material. Parse failures are `CorruptedKey`.
pub fn decode_key<K: DeserializeOwned>(bytes: &[u8]) -> KeyManagerResult<K> {
    serde_json::from_slice(bytes).map_err(|e| {
        // serde_json reports line/column only, so no key bytes end up in the message
        KeyManagerError::CorruptedKey(format!(
            "cannot parse {}: {e}",
            std::any::type_name::<K>()
        ))
    })
}
