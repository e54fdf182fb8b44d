//! Token Factory CLI Application
//!
//! A command-line interface for deploying and using fixed-supply tokens.

use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use token_factory::cli::{self, parse_address, parse_amount, AppState};

#[derive(Parser)]
#[command(name = "token-factory")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Fixed-supply token ledgers with a creation registry", long_about = None)]
struct Cli {
    /// Data directory for registry storage
    #[arg(short, long, default_value = ".token_factory_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new registry
    Init {
        /// Administrative owner of the registry
        #[arg(short, long, value_parser = parse_address)]
        owner: Address,

        /// Overwrite an existing registry
        #[arg(long)]
        force: bool,
    },

    /// Deploy a new token, crediting the whole supply to the creator
    Deploy {
        /// Creator identity
        #[arg(short, long, value_parser = parse_address)]
        from: Address,

        /// Token name
        #[arg(short, long)]
        name: String,

        /// Token symbol
        #[arg(short, long)]
        symbol: String,

        /// Initial (and total) supply in base units
        #[arg(long, value_parser = parse_amount)]
        supply: U256,
    },

    /// Transfer tokens from the caller
    Transfer {
        /// Token address
        #[arg(short, long, value_parser = parse_address)]
        token: Address,

        /// Sender identity
        #[arg(short, long, value_parser = parse_address)]
        from: Address,

        /// Recipient identity
        #[arg(long, value_parser = parse_address)]
        to: Address,

        /// Amount in base units
        #[arg(short, long, value_parser = parse_amount)]
        amount: U256,
    },

    /// Set a spender's allowance
    Approve {
        /// Token address
        #[arg(short, long, value_parser = parse_address)]
        token: Address,

        /// Owner identity granting the allowance
        #[arg(short, long, value_parser = parse_address)]
        from: Address,

        /// Spender identity
        #[arg(short, long, value_parser = parse_address)]
        spender: Address,

        /// Allowance in base units (replaces any previous allowance)
        #[arg(short, long, value_parser = parse_amount)]
        amount: U256,
    },

    /// Spend an allowance
    TransferFrom {
        /// Token address
        #[arg(short, long, value_parser = parse_address)]
        token: Address,

        /// Spender identity performing the transfer
        #[arg(short, long, value_parser = parse_address)]
        spender: Address,

        /// Owner whose balance is debited
        #[arg(short, long, value_parser = parse_address)]
        owner: Address,

        /// Recipient identity
        #[arg(long, value_parser = parse_address)]
        to: Address,

        /// Amount in base units
        #[arg(short, long, value_parser = parse_amount)]
        amount: U256,
    },

    /// Show a balance
    Balance {
        /// Token address
        #[arg(short, long, value_parser = parse_address)]
        token: Address,

        /// Holder identity
        #[arg(long, value_parser = parse_address)]
        holder: Address,
    },

    /// Show an allowance
    Allowance {
        /// Token address
        #[arg(short, long, value_parser = parse_address)]
        token: Address,

        /// Owner identity
        #[arg(short, long, value_parser = parse_address)]
        owner: Address,

        /// Spender identity
        #[arg(short, long, value_parser = parse_address)]
        spender: Address,
    },

    /// Show the number of deployed tokens
    Count,

    /// List the tokens deployed by a creator
    TokensOf {
        /// Creator identity
        #[arg(short, long, value_parser = parse_address)]
        creator: Address,
    },

    /// List tokens, or show one token by index
    Info {
        /// Creation index
        #[arg(short, long)]
        index: Option<usize>,
    },

    /// Show the registry owner
    Owner,

    /// Hand registry ownership to a new identity
    TransferOwnership {
        /// Current owner
        #[arg(short, long, value_parser = parse_address)]
        caller: Address,

        /// New owner
        #[arg(short, long, value_parser = parse_address)]
        new_owner: Address,
    },

    /// Show the registry log, or a token's log
    Events {
        /// Token address
        #[arg(short, long, value_parser = parse_address)]
        token: Option<Address>,
    },

    /// List backups, or restore the registry from one
    Restore {
        /// Backup index (0 = most recent); omit to list backups
        #[arg(short, long)]
        backup: Option<usize>,
    },

    /// Export registry to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle init separately
    if let Commands::Init { owner, force } = &cli.command {
        return cli::cmd_init(&cli.data_dir, *owner, *force);
    }

    // Restore must work when the current registry no longer loads
    if let Commands::Restore { backup } = &cli.command {
        return cli::cmd_restore(&cli.data_dir, *backup);
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),
        Commands::Restore { .. } => unreachable!(),

        Commands::Deploy {
            from,
            name,
            symbol,
            supply,
        } => {
            cli::cmd_deploy(&mut state, from, &name, &symbol, supply)?;
        }

        Commands::Transfer {
            token,
            from,
            to,
            amount,
        } => {
            cli::cmd_transfer(&mut state, token, from, to, amount)?;
        }

        Commands::Approve {
            token,
            from,
            spender,
            amount,
        } => {
            cli::cmd_approve(&mut state, token, from, spender, amount)?;
        }

        Commands::TransferFrom {
            token,
            spender,
            owner,
            to,
            amount,
        } => {
            cli::cmd_transfer_from(&mut state, token, spender, owner, to, amount)?;
        }

        Commands::Balance { token, holder } => {
            cli::cmd_balance(&state, token, holder)?;
        }

        Commands::Allowance {
            token,
            owner,
            spender,
        } => {
            cli::cmd_allowance(&state, token, owner, spender)?;
        }

        Commands::Count => {
            cli::cmd_count(&state)?;
        }

        Commands::TokensOf { creator } => {
            cli::cmd_tokens_of(&state, creator)?;
        }

        Commands::Info { index } => {
            cli::cmd_info(&state, index)?;
        }

        Commands::Owner => {
            cli::cmd_owner(&state)?;
        }

        Commands::TransferOwnership { caller, new_owner } => {
            cli::cmd_transfer_ownership(&mut state, caller, new_owner)?;
        }

        Commands::Events { token } => {
            cli::cmd_events(&state, token)?;
        }


        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }
    }

    Ok(())
}
