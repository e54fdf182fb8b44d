//! CLI commands for the token factory
//!
//! Every mutating command acts as an explicit identity, stamps the call
//! with the wall clock and saves the registry only once the operation has
//! succeeded.

use crate::core::CallContext;
use crate::registry::{Registry, RegistryEvent};
use crate::storage::{save_to_file, Storage, StorageConfig};
use crate::token::LedgerEvent;
use alloy_primitives::{Address, U256};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Parse a `0x`-prefixed 20-byte address
pub fn parse_address(s: &str) -> Result<Address, String> {
    s.parse::<Address>()
        .map_err(|e| format!("invalid address '{}': {}", s, e))
}

/// Parse a decimal (or `0x` hex) 256-bit amount
pub fn parse_amount(s: &str) -> Result<U256, String> {
    s.parse::<U256>()
        .map_err(|e| format!("invalid amount '{}': {}", s, e))
}

/// Application state
pub struct AppState {
    pub registry: Registry,
    pub storage: Storage,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load the registry stored in `data_dir`
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = Storage::new(StorageConfig {
            data_dir: data_dir.clone(),
            ..Default::default()
        })?;

        if !storage.exists() {
            return Err(format!(
                "no registry found in {:?}; run `token-factory init --owner <address>` first",
                data_dir
            )
            .into());
        }

        let registry = storage.load()?;
        log::debug!("Loaded registry with {} tokens", registry.tokens_count());

        Ok(Self {
            registry,
            storage,
            data_dir,
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.registry)?;
        Ok(())
    }
}

/// Initialize a new registry
pub fn cmd_init(data_dir: &Path, owner: Address, force: bool) -> CliResult<()> {
    let storage = Storage::new(StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    })?;

    if storage.exists() && !force {
        println!("⚠️  Registry already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }
    storage.delete()?;

    let registry = Registry::new(&CallContext::now(owner));
    storage.save(&registry)?;

    println!("✅ Registry initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   👑 Owner: {}", registry.owner());

    Ok(())
}

/// Deploy a new token
pub fn cmd_deploy(
    state: &mut AppState,
    creator: Address,
    name: &str,
    symbol: &str,
    supply: U256,
) -> CliResult<()> {
    let deployment = state.registry.deploy_token(
        &CallContext::now(creator),
        name.to_string(),
        symbol.to_string(),
        supply,
    )?;
    state.save()?;

    println!("🪙 Token deployed!");
    println!("   ├─ Index: {}", deployment.index);
    println!("   ├─ Address: {}", deployment.token);
    println!("   ├─ Name: {} ({})", name, symbol);
    println!("   └─ Supply: {}", supply);

    Ok(())
}

/// Transfer tokens
pub fn cmd_transfer(
    state: &mut AppState,
    token: Address,
    from: Address,
    to: Address,
    amount: U256,
) -> CliResult<()> {
    let event = state
        .registry
        .transfer(&CallContext::now(from), &token, to, amount)?;
    state.save()?;

    println!("✅ Transferred {} from {} to {}", event.amount, event.from, event.to);

    Ok(())
}

/// Approve a spender
pub fn cmd_approve(
    state: &mut AppState,
    token: Address,
    owner: Address,
    spender: Address,
    amount: U256,
) -> CliResult<()> {
    let event = state
        .registry
        .approve(&CallContext::now(owner), &token, spender, amount)?;
    state.save()?;

    println!(
        "✅ {} may now spend {} on behalf of {}",
        event.spender, event.amount, event.owner
    );

    Ok(())
}

/// Delegated transfer
pub fn cmd_transfer_from(
    state: &mut AppState,
    token: Address,
    spender: Address,
    from: Address,
    to: Address,
    amount: U256,
) -> CliResult<()> {
    let event =
        state
            .registry
            .transfer_from(&CallContext::now(spender), &token, from, to, amount)?;
    state.save()?;

    let remaining = state
        .registry
        .ledger(&token)
        .map(|ledger| ledger.allowance(&from, &spender))
        .unwrap_or_default();

    println!("✅ Transferred {} from {} to {}", event.amount, event.from, event.to);
    println!("   Remaining allowance: {}", remaining);

    Ok(())
}

/// Show a holder's balance
pub fn cmd_balance(state: &AppState, token: Address, holder: Address) -> CliResult<()> {
    let ledger = state
        .registry
        .ledger(&token)
        .ok_or_else(|| format!("token not found: {}", token))?;

    println!(
        "💰 {} {} held by {}",
        ledger.balance_of(&holder),
        ledger.symbol(),
        holder
    );

    Ok(())
}

/// Show an allowance
pub fn cmd_allowance(
    state: &AppState,
    token: Address,
    owner: Address,
    spender: Address,
) -> CliResult<()> {
    let ledger = state
        .registry
        .ledger(&token)
        .ok_or_else(|| format!("token not found: {}", token))?;

    println!(
        "🔓 {} may spend {} {} of {}",
        spender,
        ledger.allowance(&owner, &spender),
        ledger.symbol(),
        owner
    );

    Ok(())
}

/// Show the number of deployed tokens
pub fn cmd_count(state: &AppState) -> CliResult<()> {
    println!("📊 Tokens deployed: {}", state.registry.tokens_count());
    Ok(())
}

/// List the tokens deployed by a creator
pub fn cmd_tokens_of(state: &AppState, creator: Address) -> CliResult<()> {
    let indices = state.registry.tokens_of(&creator);

    if indices.is_empty() {
        println!("📭 {} has not deployed any tokens", creator);
        return Ok(());
    }

    println!("📋 Tokens deployed by {}:", creator);
    for index in indices {
        if let Some(record) = state.registry.record(*index) {
            println!(
                "   #{} {} ({}) at {}",
                index, record.name, record.symbol, record.token
            );
        }
    }

    Ok(())
}

/// List every token, or show one token in detail
pub fn cmd_info(state: &AppState, index: Option<usize>) -> CliResult<()> {
    let Some(index) = index else {
        let records = state.registry.records();
        if records.is_empty() {
            println!("📭 No tokens deployed yet.");
            return Ok(());
        }

        println!("🪙 Tokens ({}):", records.len());
        for (i, record) in records.iter().enumerate() {
            println!(
                "   #{} {} ({}) at {} by {}",
                i, record.name, record.symbol, record.token, record.creator
            );
        }
        return Ok(());
    };

    let record = state
        .registry
        .record(index)
        .ok_or_else(|| format!("no token at index {}", index))?;

    println!("🪙 Token #{}", index);
    println!("   ├─ Address: {}", record.token);
    println!("   ├─ Name: {}", record.name);
    println!("   ├─ Symbol: {}", record.symbol);
    println!("   ├─ Creator: {}", record.creator);
    println!("   ├─ Initial supply: {}", record.initial_supply);
    println!("   ├─ Created at: {}", record.created_at);

    if let Some(ledger) = state.registry.ledger(&record.token) {
        println!("   ├─ Decimals: {}", ledger.decimals());
        println!("   └─ Holders: {}", ledger.holder_count());

        let mut holders = ledger.holders();
        holders.sort_by(|a, b| b.1.cmp(a.1));
        for (holder, balance) in holders.iter().take(10) {
            println!("      {} = {}", holder, balance);
        }
        if holders.len() > 10 {
            println!("      ... and {} more", holders.len() - 10);
        }
    }

    Ok(())
}

/// Show the registry owner
pub fn cmd_owner(state: &AppState) -> CliResult<()> {
    println!("👑 Owner: {}", state.registry.owner());
    Ok(())
}

/// Transfer registry ownership
pub fn cmd_transfer_ownership(
    state: &mut AppState,
    caller: Address,
    new_owner: Address,
) -> CliResult<()> {
    state
        .registry
        .transfer_ownership(&CallContext::now(caller), new_owner)?;
    state.save()?;

    println!("👑 Ownership transferred to {}", new_owner);

    Ok(())
}

/// Print the registry log, or one ledger's log
pub fn cmd_events(state: &AppState, token: Option<Address>) -> CliResult<()> {
    match token {
        None => {
            println!("📜 Registry events:");
            for event in state.registry.events() {
                match event {
                    RegistryEvent::TokenDeployed {
                        index,
                        token,
                        creator,
                        symbol,
                        initial_supply,
                        timestamp,
                        ..
                    } => println!(
                        "   [{}] Deployed #{} {} at {} by {} (supply {})",
                        timestamp, index, symbol, token, creator, initial_supply
                    ),
                    RegistryEvent::OwnershipTransferred {
                        previous_owner,
                        new_owner,
                        timestamp,
                    } => println!(
                        "   [{}] Ownership {} -> {}",
                        timestamp, previous_owner, new_owner
                    ),
                }
            }
        }
        Some(token) => {
            let ledger = state
                .registry
                .ledger(&token)
                .ok_or_else(|| format!("token not found: {}", token))?;

            println!("📜 {} events:", ledger.symbol());
            for event in ledger.events() {
                match event {
                    LedgerEvent::Transfer(e) => println!(
                        "   [{}] Transfer {} {} -> {}",
                        e.timestamp, e.amount, e.from, e.to
                    ),
                    LedgerEvent::Approval(e) => println!(
                        "   [{}] Approval {} {} -> {}",
                        e.timestamp, e.amount, e.owner, e.spender
                    ),
                }
            }
        }
    }

    Ok(())
}

/// Export the registry to a file
pub fn cmd_export(state: &AppState, output: &Path) -> CliResult<()> {
    save_to_file(&state.registry, output)?;

    println!("✅ Registry exported to {:?}", output);
    println!("   🪙 Tokens: {}", state.registry.tokens_count());

    Ok(())
}

/// List backups, or replace the current registry with one of them.
///
/// Runs without loading the current registry, so a registry that no longer
/// validates can still be recovered.
pub fn cmd_restore(data_dir: &Path, backup: Option<usize>) -> CliResult<()> {
    let storage = Storage::new(StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    })?;

    let Some(backup) = backup else {
        let backups = storage.list_backups();
        if backups.is_empty() {
            println!("📭 No backups found in {:?}", data_dir);
            return Ok(());
        }

        println!("🗄️  Backups (0 = most recent):");
        for index in backups {
            println!("   {}", index);
        }
        return Ok(());
    };

    // Loading validates the backup before it replaces anything
    let registry = storage.restore_backup(backup)?;
    storage.save(&registry)?;

    println!("✅ Restored backup {}", backup);
    println!("   🪙 Tokens: {}", registry.tokens_count());
    println!("   👑 Owner: {}", registry.owner());

    Ok(())
}
