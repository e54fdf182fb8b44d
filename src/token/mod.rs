//! ERC-20 style fungible token ledger
//!
//! Provides a fixed-supply fungible token with:
//! - Balances per address
//! - Allowances for delegated transfers
//! - Transfer, approve and transfer-from operations
//! - An append-only notification log
//!
//! # Example
//!
//! ```rust
//! use alloy_primitives::{Address, U256};
//! use token_factory::core::CallContext;
//! use token_factory::token::Ledger;
//!
//! let alice = Address::repeat_byte(1);
//! let bob = Address::repeat_byte(2);
//! let ctx = CallContext::now(alice);
//!
//! let mut ledger = Ledger::new(
//!     Address::repeat_byte(0xee),
//!     "Gold".to_string(),
//!     "GLD".to_string(),
//!     U256::from(1000u64),
//!     alice,
//!     ctx.timestamp,
//! );
//!
//! ledger.transfer(&ctx, bob, U256::from(300u64)).unwrap();
//! assert_eq!(ledger.balance_of(&bob), U256::from(300u64));
//! ```

pub mod ledger;

pub use ledger::{ApprovalEvent, Ledger, LedgerError, LedgerEvent, TransferEvent, DECIMALS};
