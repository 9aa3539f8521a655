//! Wallet management and address derivation
//!
//! Keypair generation, Base58Check address encoding/validation and the
//! persistent keyring.

#[allow(clippy::module_inception)]
pub mod wallet;
pub mod wallets;

pub use wallet::{
    convert_address, get_pub_key_hash_from_address, hash_pub_key, validate_address, Wallet,
    ADDRESS_CHECK_SUM_LEN,
};
pub use wallets::Wallets;
