//! CRM query CLI
//!
//! This crate provides the command-line interface for the CRM query backend:
//! - run: Start the server
//! - check: Verify configuration and database connectivity
//! - completion: Generate shell completions (hidden)

pub mod commands;
pub mod logging;

pub use commands::{Cli, Commands, LogFormat};
