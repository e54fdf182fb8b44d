//! Hashing utilities for ledger addresses
//!
//! Every ledger created by the registry is identified by an address derived
//! from its creator, its symbol and its position in the registry.

use alloy_primitives::Address;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Derive the address of a newly created ledger.
///
/// The address is the first 20 bytes of `sha256("<creator>:<symbol>:<index>")`.
/// The registry index is unique per creation, so two ledgers never share an
/// address even when the same creator reuses a symbol.
pub fn derive_ledger_address(creator: &Address, symbol: &str, index: usize) -> Address {
    let input = format!("{}:{}:{}", creator, symbol, index);
    let hash = sha256(input.as_bytes());
    Address::from_slice(&hash[..20])
}
