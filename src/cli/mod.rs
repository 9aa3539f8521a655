//! Command-line interface
//!
//! Argument parsing for the operator-facing commands.

pub mod commands;

pub use commands::{Command, Opt};
