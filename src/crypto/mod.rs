//! Hashing utilities for the token factory
//!
//! This module provides:
//! - SHA-256 hashing
//! - Deterministic ledger address derivation

pub mod hash;

pub use hash::{derive_ledger_address, sha256};
