//! Configuration management
//!
//! Paths and chain parameters are carried in an explicit [`Config`] value
//! handed to the subsystems that need them; there is no global mutable state.

pub mod settings;

pub use settings::{Config, DATA_DIR_ENV, DEFAULT_DIFFICULTY_BITS, GENESIS_REWARD};
