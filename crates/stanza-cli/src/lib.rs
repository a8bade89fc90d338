//! Command-line interface for Stanza
//!
//! The `stanza` binary lives in `main.rs`; argument parsing, the JSONL job
//! format and the subcommands are exposed here so they can be tested.

pub mod cli;
pub mod commands;
pub mod jsonl;
