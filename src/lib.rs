//! Token Factory: fixed-supply token ledgers with a creation registry
//!
//! This crate provides:
//! - ERC-20 style ledgers (balances, allowances, delegated transfers)
//! - A registry that deploys ledgers and indexes them by creation order and
//!   by creator
//! - Owner-gated registry administration
//! - Append-only notification logs for every ledger and the registry
//! - JSON persistence with backups
//!
//! # Example
//!
//! ```rust
//! use alloy_primitives::{Address, U256};
//! use token_factory::core::CallContext;
//! use token_factory::registry::Registry;
//!
//! let owner = Address::repeat_byte(0xaa);
//! let alice = Address::repeat_byte(1);
//! let bob = Address::repeat_byte(2);
//!
//! let mut registry = Registry::new(&CallContext::now(owner));
//!
//! // Anyone may deploy a token
//! let ctx = CallContext::now(alice);
//! let gold = registry
//!     .deploy_token(&ctx, "Gold".to_string(), "GLD".to_string(), U256::from(1000u64))
//!     .unwrap();
//! assert_eq!(registry.tokens_of(&alice), &[gold.index]);
//!
//! // Holders call the ledger directly through its handle
//! let ledger = registry.ledger_mut(&gold.token).unwrap();
//! ledger.transfer(&ctx, bob, U256::from(300u64)).unwrap();
//! assert_eq!(ledger.balance_of(&alice), U256::from(700u64));
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod registry;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use crate::core::CallContext;
pub use registry::{Deployment, Registry, RegistryError, RegistryEvent, TokenRecord};
pub use storage::{Storage, StorageConfig, StorageError};
pub use token::{ApprovalEvent, Ledger, LedgerError, LedgerEvent, TransferEvent, DECIMALS};
