//! Utility functions and helpers
//!
//! Cryptographic primitives, Base58 encoding and the canonical byte codec
//! used for hashing and persistence.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest, sha256_digest,
};

pub use serialization::{deserialize, serialize};
