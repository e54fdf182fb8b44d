//! Token registry
//!
//! Creates ledgers, keeps an append-only directory of every ledger it has
//! created and indexes that directory by creator.

use crate::core::CallContext;
use crate::crypto::derive_ledger_address;
use crate::token::{ApprovalEvent, Ledger, LedgerError, TransferEvent};
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid supply: must be greater than 0")]
    ZeroSupply,
    #[error("Unauthorized: {caller} is not the registry owner")]
    Unauthorized { caller: Address },
    #[error("Invalid recipient: new owner cannot be the zero address")]
    InvalidRecipient,
    #[error("Token not found: {0}")]
    UnknownToken(Address),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Corrupt registry: {0}")]
    Corrupt(String),
}

/// Immutable snapshot of one created ledger
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Handle of the created ledger
    pub token: Address,
    pub creator: Address,
    pub name: String,
    pub symbol: String,
    pub initial_supply: U256,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful deployment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub token: Address,
    pub index: usize,
}

/// Registry notifications
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RegistryEvent {
    TokenDeployed {
        index: usize,
        token: Address,
        creator: Address,
        name: String,
        symbol: String,
        initial_supply: U256,
        timestamp: DateTime<Utc>,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
        timestamp: DateTime<Utc>,
    },
}

/// Directory of every ledger created through the factory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registry {
    owner: Address,
    /// Index = creation order
    records: Vec<TokenRecord>,
    /// Creator -> indices into `records`, in creation order
    creator_index: HashMap<Address, Vec<usize>>,
    /// Ledgers by handle
    ledgers: HashMap<Address, Ledger>,
    events: Vec<RegistryEvent>,
}

impl Registry {
    /// Create an empty registry owned by the caller
    pub fn new(ctx: &CallContext) -> Self {
        Self {
            owner: ctx.caller,
            records: Vec::new(),
            creator_index: HashMap::new(),
            ledgers: HashMap::new(),
            events: vec![RegistryEvent::OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: ctx.caller,
                timestamp: ctx.timestamp,
            }],
        }
    }

    /// Create a new ledger with the whole supply credited to the caller
    pub fn deploy_token(
        &mut self,
        ctx: &CallContext,
        name: String,
        symbol: String,
        initial_supply: U256,
    ) -> Result<Deployment, RegistryError> {
        if initial_supply.is_zero() {
            return Err(RegistryError::ZeroSupply);
        }

        let creator = ctx.caller;
        let index = self.records.len();
        let token = derive_ledger_address(&creator, &symbol, index);

        let ledger = Ledger::new(
            token,
            name.clone(),
            symbol.clone(),
            initial_supply,
            creator,
            ctx.timestamp,
        );

        log::info!(
            "Token deployed: {} ({}) #{} at {} by {}",
            name,
            symbol,
            index,
            token,
            creator
        );

        self.events.push(RegistryEvent::TokenDeployed {
            index,
            token,
            creator,
            name: name.clone(),
            symbol: symbol.clone(),
            initial_supply,
            timestamp: ctx.timestamp,
        });
        self.records.push(TokenRecord {
            token,
            creator,
            name,
            symbol,
            initial_supply,
            created_at: ctx.timestamp,
        });
        self.creator_index.entry(creator).or_default().push(index);
        self.ledgers.insert(token, ledger);

        Ok(Deployment { token, index })
    }

    /// Hand administration of the registry to `new_owner`
    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
    ) -> Result<(), RegistryError> {
        if ctx.caller != self.owner {
            return Err(RegistryError::Unauthorized { caller: ctx.caller });
        }
        if new_owner.is_zero() {
            return Err(RegistryError::InvalidRecipient);
        }

        let previous_owner = std::mem::replace(&mut self.owner, new_owner);
        log::info!("Registry ownership: {} -> {}", previous_owner, new_owner);

        self.events.push(RegistryEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current administrative identity
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Number of ledgers created so far
    pub fn tokens_count(&self) -> usize {
        self.records.len()
    }

    /// Indices of the records created by `user`, in creation order
    pub fn tokens_of(&self, user: &Address) -> &[usize] {
        self.creator_index
            .get(user)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record at a creation index
    pub fn record(&self, index: usize) -> Option<&TokenRecord> {
        self.records.get(index)
    }

    /// All records in creation order
    pub fn records(&self) -> &[TokenRecord] {
        &self.records
    }

    /// Ledger by handle
    pub fn ledger(&self, token: &Address) -> Option<&Ledger> {
        self.ledgers.get(token)
    }

    /// Mutable ledger by handle.
    ///
    /// The registry adds no policy of its own to ledger operations.
    pub fn ledger_mut(&mut self, token: &Address) -> Option<&mut Ledger> {
        self.ledgers.get_mut(token)
    }

    /// Registry notification log
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    // =========================================================================
    // Ledger operations by handle
    // =========================================================================

    /// Transfer on the ledger named by `token`
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        token: &Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferEvent, RegistryError> {
        Ok(self.require_ledger(token)?.transfer(ctx, to, amount)?)
    }

    /// Approve on the ledger named by `token`
    pub fn approve(
        &mut self,
        ctx: &CallContext,
        token: &Address,
        spender: Address,
        amount: U256,
    ) -> Result<ApprovalEvent, RegistryError> {
        Ok(self.require_ledger(token)?.approve(ctx, spender, amount))
    }

    /// Delegated transfer on the ledger named by `token`
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        token: &Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferEvent, RegistryError> {
        Ok(self
            .require_ledger(token)?
            .transfer_from(ctx, from, to, amount)?)
    }

    /// Check the cross-structure invariants of a registry rebuilt from
    /// outside (e.g. loaded from disk).
    ///
    /// Every creator index entry must name a record with that creator, every
    /// record must appear under its creator and own a ledger with the
    /// recorded supply, and every ledger's balances must sum to its supply.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let corrupt = |msg: String| Err(RegistryError::Corrupt(msg));

        let mut indexed = 0;
        for (creator, indices) in &self.creator_index {
            for index in indices {
                match self.records.get(*index) {
                    Some(record) if record.creator == *creator => indexed += 1,
                    Some(_) => {
                        return corrupt(format!("record #{} is not created by {}", index, creator))
                    }
                    None => {
                        return corrupt(format!("{} lists missing record #{}", creator, index))
                    }
                }
            }
        }
        if indexed != self.records.len() {
            return corrupt(format!(
                "{} records but {} creator index entries",
                self.records.len(),
                indexed
            ));
        }

        for (index, record) in self.records.iter().enumerate() {
            if !self.tokens_of(&record.creator).contains(&index) {
                return corrupt(format!("record #{} missing from its creator index", index));
            }
            let Some(ledger) = self.ledgers.get(&record.token) else {
                return corrupt(format!("record #{} has no ledger at {}", index, record.token));
            };
            let matches_record = ledger.address() == record.token
                && ledger.total_supply() == record.initial_supply;
            if !matches_record {
                return corrupt(format!("ledger {} does not match record #{}", record.token, index));
            }
        }
        if self.ledgers.len() != self.records.len() {
            return corrupt(format!(
                "{} ledgers but {} records",
                self.ledgers.len(),
                self.records.len()
            ));
        }

        for ledger in self.ledgers.values() {
            if ledger.balances_sum() != ledger.total_supply() {
                return corrupt(format!(
                    "ledger {} balances sum to {}, supply is {}",
                    ledger.address(),
                    ledger.balances_sum(),
                    ledger.total_supply()
                ));
            }
        }

        Ok(())
    }

    fn require_ledger(&mut self, token: &Address) -> Result<&mut Ledger, RegistryError> {
        self.ledgers
            .get_mut(token)
            .ok_or(RegistryError::UnknownToken(*token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::LedgerEvent;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn ctx(caller: Address) -> CallContext {
        CallContext::at_unix(caller, 1_700_000_000)
    }

    fn amount(value: u64) -> U256 {
        U256::from(value)
    }

    fn deploy(registry: &mut Registry, creator: Address, symbol: &str, supply: u64) -> Deployment {
        registry
            .deploy_token(
                &ctx(creator),
                format!("{} Token", symbol),
                symbol.to_string(),
                amount(supply),
            )
            .unwrap()
    }

    #[test]
    fn test_registry_creation() {
        let registry = Registry::new(&ctx(addr(0xaa)));

        assert_eq!(registry.owner(), addr(0xaa));
        assert_eq!(registry.tokens_count(), 0);
        assert!(registry.tokens_of(&addr(1)).is_empty());
        assert_eq!(
            registry.events(),
            &[RegistryEvent::OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: addr(0xaa),
                timestamp: ctx(addr(0xaa)).timestamp,
            }]
        );
    }

    #[test]
    fn test_deploy_token() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));

        let deployment = registry
            .deploy_token(
                &CallContext::at_unix(addr(1), 1_700_000_123),
                "Gold".to_string(),
                "GLD".to_string(),
                amount(1000),
            )
            .unwrap();

        assert_eq!(deployment.index, 0);
        assert_eq!(registry.tokens_count(), 1);
        assert_eq!(registry.tokens_of(&addr(1)), &[0]);

        let record = registry.record(0).unwrap();
        assert_eq!(record.token, deployment.token);
        assert_eq!(record.creator, addr(1));
        assert_eq!(record.name, "Gold");
        assert_eq!(record.symbol, "GLD");
        assert_eq!(record.initial_supply, amount(1000));
        assert_eq!(record.created_at.timestamp(), 1_700_000_123);

        let ledger = registry.ledger(&deployment.token).unwrap();
        assert_eq!(ledger.address(), deployment.token);
        assert_eq!(ledger.total_supply(), amount(1000));
        assert_eq!(ledger.balance_of(&addr(1)), amount(1000));
        assert!(matches!(
            &ledger.events()[0],
            LedgerEvent::Transfer(event) if event.from == Address::ZERO && event.to == addr(1)
        ));

        match registry.events().last().unwrap() {
            RegistryEvent::TokenDeployed {
                index,
                token,
                creator,
                name,
                symbol,
                initial_supply,
                ..
            } => {
                assert_eq!(*index, 0);
                assert_eq!(*token, deployment.token);
                assert_eq!(*creator, addr(1));
                assert_eq!(name, "Gold");
                assert_eq!(symbol, "GLD");
                assert_eq!(*initial_supply, amount(1000));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_deploy_zero_supply_fails() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));
        deploy(&mut registry, addr(1), "ONE", 10);

        let result = registry.deploy_token(
            &ctx(addr(1)),
            "Nothing".to_string(),
            "NIL".to_string(),
            U256::ZERO,
        );

        assert_eq!(result, Err(RegistryError::ZeroSupply));
        assert_eq!(registry.tokens_count(), 1);
        assert_eq!(registry.tokens_of(&addr(1)), &[0]);
        assert_eq!(registry.events().len(), 2);
        // No ledger was created under the handle the deployment would have used
        assert!(registry
            .ledger(&derive_ledger_address(&addr(1), "NIL", 1))
            .is_none());
    }

    #[test]
    fn test_validate_accepts_live_registry() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));
        assert_eq!(registry.validate(), Ok(()));

        let gold = deploy(&mut registry, addr(1), "GLD", 1000);
        deploy(&mut registry, addr(2), "SLV", 500);
        deploy(&mut registry, addr(1), "GLD", 10);
        registry
            .transfer(&ctx(addr(1)), &gold.token, addr(3), amount(400))
            .unwrap();

        assert_eq!(registry.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_dangling_creator_index() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));
        deploy(&mut registry, addr(1), "GLD", 1000);

        let mut broken = registry.clone();
        broken.records.clear();
        broken.creator_index.insert(addr(1), vec![0, 99]);
        assert!(matches!(broken.validate(), Err(RegistryError::Corrupt(_))));

        let mut broken = registry.clone();
        broken.creator_index.insert(addr(2), vec![0]);
        assert!(matches!(broken.validate(), Err(RegistryError::Corrupt(_))));

        let mut broken = registry.clone();
        broken.creator_index.clear();
        assert!(matches!(broken.validate(), Err(RegistryError::Corrupt(_))));
    }

    #[test]
    fn test_validate_rejects_missing_ledger() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));
        let gold = deploy(&mut registry, addr(1), "GLD", 1000);

        registry.ledgers.remove(&gold.token);
        assert!(matches!(registry.validate(), Err(RegistryError::Corrupt(_))));
    }

    #[test]
    fn test_tokens_of_in_creation_order() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));

        let a0 = deploy(&mut registry, addr(1), "AAA", 100);
        let b0 = deploy(&mut registry, addr(2), "BBB", 200);
        let a1 = deploy(&mut registry, addr(1), "AAA", 300);
        let a2 = deploy(&mut registry, addr(1), "CCC", 400);

        assert_eq!(registry.tokens_count(), 4);
        assert_eq!(
            registry.tokens_of(&addr(1)),
            &[a0.index, a1.index, a2.index]
        );
        assert_eq!(registry.tokens_of(&addr(1)), &[0, 2, 3]);
        assert_eq!(registry.tokens_of(&addr(2)), &[b0.index]);
        assert!(registry.tokens_of(&addr(3)).is_empty());

        // Same creator and symbol still get distinct ledgers
        assert_ne!(a0.token, a1.token);

        for creator in [addr(1), addr(2)] {
            for index in registry.tokens_of(&creator) {
                assert_eq!(registry.record(*index).unwrap().creator, creator);
            }
        }
    }

    #[test]
    fn test_records_only_grow() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));
        let mut last = registry.tokens_count();

        for (i, supply) in [5u64, 0, 7, 0, 9].iter().enumerate() {
            let _ = registry.deploy_token(
                &ctx(addr(i as u8 + 1)),
                "T".to_string(),
                "T".to_string(),
                amount(*supply),
            );
            assert!(registry.tokens_count() >= last);
            last = registry.tokens_count();
        }

        assert_eq!(registry.tokens_count(), 3);
        assert_eq!(registry.records().len(), 3);
    }

    #[test]
    fn test_gold_scenario() {
        let (a, b, c, d) = (addr(0xa), addr(0xb), addr(0xc), addr(0xd));
        let mut registry = Registry::new(&ctx(addr(0xff)));

        let gold = registry
            .deploy_token(&ctx(a), "Gold".to_string(), "GLD".to_string(), amount(1000))
            .unwrap();
        assert_eq!(gold.index, 0);
        assert_eq!(registry.record(0).unwrap().creator, a);

        let token = gold.token;
        registry.transfer(&ctx(a), &token, b, amount(300)).unwrap();
        registry.approve(&ctx(a), &token, c, amount(200)).unwrap();
        registry
            .transfer_from(&ctx(c), &token, a, d, amount(150))
            .unwrap();

        {
            let ledger = registry.ledger(&token).unwrap();
            assert_eq!(ledger.balance_of(&a), amount(550));
            assert_eq!(ledger.balance_of(&b), amount(300));
            assert_eq!(ledger.balance_of(&d), amount(150));
            assert_eq!(ledger.allowance(&a, &c), amount(50));
        }

        let result = registry.transfer_from(&ctx(c), &token, a, d, amount(100));
        assert_eq!(
            result,
            Err(RegistryError::Ledger(LedgerError::InsufficientAllowance {
                have: amount(50),
                need: amount(100),
            }))
        );

        let ledger = registry.ledger(&token).unwrap();
        assert_eq!(ledger.balance_of(&a), amount(550));
        assert_eq!(ledger.balance_of(&d), amount(150));
        assert_eq!(ledger.allowance(&a, &c), amount(50));
        assert_eq!(ledger.balances_sum(), ledger.total_supply());
    }

    #[test]
    fn test_ledger_callable_by_handle() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));
        let deployment = deploy(&mut registry, addr(1), "GLD", 1000);

        let ledger = registry.ledger_mut(&deployment.token).unwrap();
        ledger.transfer(&ctx(addr(1)), addr(2), amount(10)).unwrap();

        assert_eq!(
            registry.ledger(&deployment.token).unwrap().balance_of(&addr(2)),
            amount(10)
        );
    }

    #[test]
    fn test_unknown_token() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));

        let result = registry.transfer(&ctx(addr(1)), &addr(0x77), addr(2), amount(1));
        assert_eq!(result, Err(RegistryError::UnknownToken(addr(0x77))));
        assert!(registry.ledger(&addr(0x77)).is_none());
    }

    #[test]
    fn test_transfer_ownership() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));

        registry
            .transfer_ownership(&ctx(addr(0xaa)), addr(0xbb))
            .unwrap();

        assert_eq!(registry.owner(), addr(0xbb));
        assert_eq!(
            registry.events().last(),
            Some(&RegistryEvent::OwnershipTransferred {
                previous_owner: addr(0xaa),
                new_owner: addr(0xbb),
                timestamp: ctx(addr(0xaa)).timestamp,
            })
        );

        // The previous owner has lost its rights
        let result = registry.transfer_ownership(&ctx(addr(0xaa)), addr(0xcc));
        assert_eq!(
            result,
            Err(RegistryError::Unauthorized { caller: addr(0xaa) })
        );
    }

    #[test]
    fn test_transfer_ownership_by_non_owner() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));

        let result = registry.transfer_ownership(&ctx(addr(0x01)), addr(0x01));

        assert_eq!(
            result,
            Err(RegistryError::Unauthorized { caller: addr(0x01) })
        );
        assert_eq!(registry.owner(), addr(0xaa));
        assert_eq!(registry.events().len(), 1);
    }

    #[test]
    fn test_transfer_ownership_to_zero() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));

        let result = registry.transfer_ownership(&ctx(addr(0xaa)), Address::ZERO);

        assert_eq!(result, Err(RegistryError::InvalidRecipient));
        assert_eq!(registry.owner(), addr(0xaa));
    }

    #[test]
    fn test_deploy_is_open_to_anyone() {
        let mut registry = Registry::new(&ctx(addr(0xaa)));

        // Neither creator is the owner
        deploy(&mut registry, addr(1), "ONE", 1);
        deploy(&mut registry, addr(2), "TWO", 2);

        assert_eq!(registry.tokens_count(), 2);
    }
}
