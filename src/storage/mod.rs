//! Data derivation over the persistent chain
//!
//! The UTXO engine folds the chain into the set of unspent outputs and
//! answers selection and balance queries.

pub mod utxo_set;

pub use utxo_set::UTXOSet;
