//! ERC-20 style token ledger
//!
//! A ledger holds the balances and allowances of one fungible token. Its
//! total supply is fixed when it is created: there is no mint or burn, so the
//! sum of all balances always equals [`Ledger::total_supply`].

use crate::core::CallContext;
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Decimal places of every ledger created by the factory
pub const DECIMALS: u8 = 18;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: U256, need: U256 },
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: U256, need: U256 },
    #[error("Invalid recipient: cannot transfer to the zero address")]
    InvalidRecipient,
}

/// Transfer event (emitted when tokens move, including the creation credit)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub token: Address,
    /// `Address::ZERO` for the creation credit
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub timestamp: DateTime<Utc>,
}

/// Approval event (emitted when an allowance is set)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
    pub timestamp: DateTime<Utc>,
}

/// Entry in a ledger's notification log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    Transfer(TransferEvent),
    Approval(ApprovalEvent),
}

/// Balances and allowances of a single fungible token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ledger {
    /// Handle under which the registry knows this ledger
    address: Address,
    name: String,
    symbol: String,
    decimals: u8,
    /// Fixed at creation
    total_supply: U256,
    /// Balances: holder -> amount
    balances: HashMap<Address, U256>,
    /// Allowances: owner -> (spender -> amount)
    allowances: HashMap<Address, HashMap<Address, U256>>,
    /// Append-only notification log, in operation order
    events: Vec<LedgerEvent>,
}

impl Ledger {
    /// Create a ledger with the whole supply credited to `initial_holder`.
    ///
    /// Records a transfer from the zero address for the full supply. A zero
    /// supply is accepted here; the registry is the layer that rejects it.
    pub fn new(
        address: Address,
        name: String,
        symbol: String,
        initial_supply: U256,
        initial_holder: Address,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut balances = HashMap::new();
        balances.insert(initial_holder, initial_supply);

        let mut ledger = Self {
            address,
            name,
            symbol,
            decimals: DECIMALS,
            total_supply: initial_supply,
            balances,
            allowances: HashMap::new(),
            events: Vec::new(),
        };

        ledger.record_transfer(Address::ZERO, initial_holder, initial_supply, timestamp);
        ledger
    }

    // =========================================================================
    // View Functions
    // =========================================================================

    /// Get the ledger handle
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get token name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get token symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Get decimal places
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Get total supply
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Get balance of an address
    pub fn balance_of(&self, holder: &Address) -> U256 {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    /// Get allowance for a spender
    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or_default()
    }

    /// Get all holders with non-zero balances
    pub fn holders(&self) -> Vec<(&Address, &U256)> {
        self.balances.iter().filter(|(_, b)| !b.is_zero()).collect()
    }

    /// Get holder count
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|b| !b.is_zero()).count()
    }

    /// Sum of every recorded balance
    pub fn balances_sum(&self) -> U256 {
        self.balances
            .values()
            .fold(U256::ZERO, |acc, b| acc.saturating_add(*b))
    }

    /// Notification log, creation transfer first
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    // =========================================================================
    // Mutating Functions
    // =========================================================================

    /// Transfer `amount` from the caller to `to`
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        to: Address,
        amount: U256,
    ) -> Result<TransferEvent, LedgerError> {
        let from = ctx.caller;
        let remaining = self.check_balance(&from, amount)?;
        check_recipient(&to)?;

        self.move_balance(from, to, remaining, amount);
        log::debug!("{}: transfer {} from {} to {}", self.symbol, amount, from, to);

        Ok(self.record_transfer(from, to, amount, ctx.timestamp))
    }

    /// Set the caller's allowance for `spender` to exactly `amount`.
    ///
    /// The previous allowance is overwritten, not adjusted. A spender that
    /// sees a pending change can still spend the old allowance first.
    pub fn approve(&mut self, ctx: &CallContext, spender: Address, amount: U256) -> ApprovalEvent {
        let owner = ctx.caller;
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
        log::debug!("{}: {} approved {} for {}", self.symbol, owner, spender, amount);

        let event = ApprovalEvent {
            token: self.address,
            owner,
            spender,
            amount,
            timestamp: ctx.timestamp,
        };
        self.events.push(LedgerEvent::Approval(event.clone()));
        event
    }

    /// Move `amount` from `from` to `to` on behalf of `from`, spending the
    /// caller's allowance
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferEvent, LedgerError> {
        let spender = ctx.caller;
        let remaining = self.check_balance(&from, amount)?;

        let allowed = self.allowance(&from, &spender);
        let remaining_allowance =
            allowed
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientAllowance {
                    have: allowed,
                    need: amount,
                })?;
        check_recipient(&to)?;

        self.allowances
            .entry(from)
            .or_default()
            .insert(spender, remaining_allowance);
        self.move_balance(from, to, remaining, amount);
        log::debug!(
            "{}: {} moved {} from {} to {}",
            self.symbol,
            spender,
            amount,
            from,
            to
        );

        Ok(self.record_transfer(from, to, amount, ctx.timestamp))
    }

    /// Balance of `from` after debiting `amount`
    fn check_balance(&self, from: &Address, amount: U256) -> Result<U256, LedgerError> {
        let have = self.balance_of(from);
        have.checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance { have, need: amount })
    }

    /// `remaining` must come from `check_balance(from, amount)`.
    fn move_balance(&mut self, from: Address, to: Address, remaining: U256, amount: U256) {
        self.balances.insert(from, remaining);
        // Cannot saturate: every balance is bounded by the total supply.
        let credited = self.balance_of(&to).saturating_add(amount);
        self.balances.insert(to, credited);
    }

    fn record_transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
        timestamp: DateTime<Utc>,
    ) -> TransferEvent {
        let event = TransferEvent {
            token: self.address,
            from,
            to,
            amount,
            timestamp,
        };
        self.events.push(LedgerEvent::Transfer(event.clone()));
        event
    }
}

fn check_recipient(to: &Address) -> Result<(), LedgerError> {
    if to.is_zero() {
        return Err(LedgerError::InvalidRecipient);
    }
    Ok(())
}
