//! Command handlers for the `token-factory` binary

pub mod commands;

pub use commands::*;
