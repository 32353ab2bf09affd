//! CLI, configuration, client wiring, agent pipeline
//!
//! This crate provides the `meetagenda` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod secret;
pub mod trajectory;

#[cfg(test)]
mod test_server;

pub use cli::Cli;
pub use context::AppContext;
pub use error::{ClientError, ClientResult};
