//! # utxo-chain
//!
//! A minimal UTXO-model blockchain: a persistent, append-only ledger of
//! proof-of-work blocks whose transactions are validated with ECDSA-P256
//! signatures.
//!
//! ## How the code is organized
//! - `core/`: blocks, transactions, the chain store and proof-of-work
//! - `wallet/`: keypairs, Base58Check addresses, the persistent keyring
//! - `storage/`: the UTXO engine deriving unspent outputs from the chain
//! - `query/`: the façade consumed by the CLI and HTTP surfaces
//! - `config/`: explicit configuration (data directory, difficulty, reward)
//! - `utils/`: hashing, Base58, the canonical byte codec
//! - `cli/`: command-line argument parsing
//!
//! ## Key design points
//! - Sled holds the chain: block hash → block bytes, `lh` → tip hash, both
//!   advanced in one write transaction
//! - Hashes are computed over a canonical fixed-width big-endian encoding,
//!   so identical structures hash identically everywhere
//! - Private keys persist as the raw scalar and point coordinates, never as
//!   an opaque runtime-defined structure
//! - The ledger is single-writer; every new transaction is mined into a
//!   block immediately, there is no mempool

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod query;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::{Config, DEFAULT_DIFFICULTY_BITS, GENESIS_REWARD};
pub use core::{Block, Blockchain, BlockchainIterator, ProofOfWork, TXInput, TXOutput, Transaction};
pub use error::{BlockchainError, Result};
pub use query::{BlockView, ChainInfo, QueryService, TransactionReceipt, TransactionView};
pub use storage::UTXOSet;
pub use utils::{
    base58_decode, base58_encode, current_timestamp, ecdsa_p256_sha256_sign_digest,
    ecdsa_p256_sha256_sign_verify, new_key_pair, ripemd160_digest, sha256_digest,
};
pub use wallet::{
    convert_address, get_pub_key_hash_from_address, hash_pub_key, validate_address, Wallet,
    Wallets, ADDRESS_CHECK_SUM_LEN,
};
