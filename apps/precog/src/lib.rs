//! # Precog
//!
//! Library half of the collector binary: HTTP ingest API, CLI commands
//! and config loading. `main.rs` only initialises logging and dispatches.

pub mod api;
pub mod cli;
pub mod config;
