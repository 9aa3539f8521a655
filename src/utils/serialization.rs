// Deterministic byte encoding for everything that gets hashed or persisted.
// Hashes are computed over these bytes, so the configuration is pinned:
// fixed-width big-endian integers, length-prefixed byte strings, counted
// lists. Two structurally equal values must encode identically everywhere.
use crate::error::{BlockchainError, Result};
use bincode::config::Configuration;
use serde::{Deserialize, Serialize};

fn codec_config() -> Configuration<bincode::config::BigEndian, bincode::config::Fixint> {
    bincode::config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

/// Serialize a value to its canonical byte encoding
pub fn serialize<T: Serialize + bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    bincode::encode_to_vec(data, codec_config())
        .map_err(|e| BlockchainError::Serialization(format!("Serialization failed: {e}")))
}

/// Decode a value from its canonical byte encoding; truncated or otherwise
/// malformed input is a [`BlockchainError::Serialization`]
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'de> Deserialize<'de> + bincode::Decode<()>,
{
    let (data, _) = bincode::decode_from_slice(bytes, codec_config())
        .map_err(|e| BlockchainError::Serialization(format!("Deserialization failed: {e}")))?;
    Ok(data)
}
