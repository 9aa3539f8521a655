//! Error handling for the blockchain
//!
//! One error type covers every caller-facing operation; panics are reserved
//! for poisoned locks, which indicate a bug rather than a runtime condition.

use std::fmt;

/// Result type alias for blockchain operations
pub type Result<T> = std::result::Result<T, BlockchainError>;

/// Error types for blockchain operations
#[derive(Debug, Clone)]
pub enum BlockchainError {
    /// KV store failure
    Database(String),
    /// File I/O failure
    Io(String),
    /// Cryptographic operation failure
    Crypto(String),
    /// Encoding or decoding of blocks/transactions failed
    Serialization(String),
    /// Address is not valid Base58, not 25 bytes, or fails its checksum
    InvalidAddress(String),
    /// A transaction offered for mining failed verification
    InvalidTransaction(String),
    /// Spendable-output selection could not reach the requested amount
    InsufficientFunds { required: u64, available: u64 },
    /// Nonce search reached the end of the search space
    MiningExhausted,
    /// The chain store already exists at the given path
    AlreadyInitialized(String),
    /// No chain store exists yet
    NotInitialized,
    /// Lookup by hash, ID or height matched nothing
    NotFound(String),
    /// Keyring file exists but does not decode
    CorruptWalletFile(String),
    /// Wallet operation failure (missing wallet, key reconstruction)
    Wallet(String),
}

impl fmt::Display for BlockchainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainError::Database(msg) => write!(f, "Database error: {msg}"),
            BlockchainError::Io(msg) => write!(f, "I/O error: {msg}"),
            BlockchainError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            BlockchainError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            BlockchainError::InvalidAddress(addr) => write!(f, "Invalid address: {addr}"),
            BlockchainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            BlockchainError::InsufficientFunds {
                required,
                available,
            } => {
                write!(
                    f,
                    "Insufficient funds: required {required}, available {available}"
                )
            }
            BlockchainError::MiningExhausted => {
                write!(f, "Mining exhausted the nonce space without meeting the target")
            }
            BlockchainError::AlreadyInitialized(path) => {
                write!(f, "Blockchain already exists at {path}")
            }
            BlockchainError::NotInitialized => {
                write!(f, "No blockchain found. Create one first")
            }
            BlockchainError::NotFound(what) => write!(f, "Not found: {what}"),
            BlockchainError::CorruptWalletFile(msg) => {
                write!(f, "Corrupt wallet file: {msg}")
            }
            BlockchainError::Wallet(msg) => write!(f, "Wallet error: {msg}"),
        }
    }
}

impl std::error::Error for BlockchainError {}

impl From<std::io::Error> for BlockchainError {
    fn from(err: std::io::Error) -> Self {
        BlockchainError::Io(err.to_string())
    }
}

impl From<sled::Error> for BlockchainError {
    fn from(err: sled::Error) -> Self {
        BlockchainError::Database(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for BlockchainError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for BlockchainError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}
