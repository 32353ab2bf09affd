//! Subcommand implementations.

pub mod agent;
pub mod calendar;
pub mod config;
pub mod email;
pub mod notion;
pub mod search;
