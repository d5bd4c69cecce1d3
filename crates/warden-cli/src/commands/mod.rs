//! Subcommand implementations. Each returns the text to print.

pub mod config;
pub mod evaluate;
pub mod message;
