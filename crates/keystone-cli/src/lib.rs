//! Command-line front end for the keystone engine.
//!
//! Every subcommand is a thin driver over one engine context. Binary
//! inputs come from files or hex arguments; results are written to the
//! supplied writer as lowercase hex, one value per line.

pub mod commands;

pub use commands::{Command, run};
