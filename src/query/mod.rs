//! Query façade
//!
//! The operations external surfaces consume, mapped onto the chain store,
//! UTXO engine and wallet keyring, with serializable hex-encoded views.

pub mod service;
pub mod views;

pub use service::QueryService;
pub use views::{BlockView, ChainInfo, TransactionReceipt, TransactionView};
