//! Command-line interface
//!
//! Argument parsing for the two entry points: the ledger node and the
//! wallet frontend.

pub mod commands;

pub use commands::{Command, Opt};
