//! # CLI Interface
//!
//! Command-line structure of `credbull-ops`, built with `clap` derive. Each
//! subcommand maps to one operator flow; global flags pick the configuration
//! file and the log format.

use clap::{Args, Parser, Subcommand, ValueEnum};
use credbull_sdk::api::VaultKind;
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Operator tooling for Credbull vaults.
///
/// Provisions users, creates vaults through the vault API, and exercises
/// them end to end against a local or test chain.
#[derive(Parser, Debug)]
#[command(
    name = "credbull-ops",
    about = "Operator tooling for Credbull vaults",
    version,
    propagate_version = true
)]
pub struct OpsCli {
    /// Configuration file (TOML). Defaults to `resource/{ENVIRONMENT}.toml`.
    #[arg(long, short = 'c', global = true, env = "CREDBULL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Environment whose configuration file to load when `--config` is absent.
    #[arg(long, global = true, env = "ENVIRONMENT", default_value = "local")]
    pub environment: String,

    /// Log output format.
    #[arg(long, global = true, value_enum, env = "CREDBULL_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a confirmed user in the account store.
    CreateUser(CreateUserArgs),
    /// Whitelist a wallet address for a user.
    Whitelist(WhitelistArgs),
    /// Create a vault through the vault API.
    CreateVault(CreateVaultArgs),
    /// Run the two-actor deposit and redeem demonstration.
    DepositRedeem(DepositRedeemArgs),
    /// Deposit a batch of records into a vault, at most once per record.
    LoadDeposits(LoadDepositsArgs),
    /// Print a vault's state.
    DescribeVault(DescribeArgs),
    /// Print a token's metadata and supply.
    DescribeToken(DescribeArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    /// Email address of the new user.
    pub email: String,

    /// Password. Generated and printed when omitted.
    #[arg(long)]
    pub password: Option<String>,

    /// Channel recorded in the user's metadata.
    #[arg(long)]
    pub channel: Option<String>,
}

#[derive(Args, Debug)]
pub struct WhitelistArgs {
    /// Wallet address to whitelist.
    pub address: String,

    /// Account the address belongs to.
    #[arg(long)]
    pub user_id: String,
}

#[derive(Args, Debug)]
pub struct CreateVaultArgs {
    /// Backdate the windows and disable the window check.
    #[arg(long)]
    pub matured: bool,

    /// Build an upside vault on top of this fixed-yield vault.
    #[arg(long, value_name = "VAULT_ADDRESS")]
    pub upside: Option<String>,

    /// Email of the tenant the vault belongs to.
    #[arg(long)]
    pub tenant: Option<String>,
}

/// CLI spelling of [`VaultKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VaultKindArg {
    FixedYield,
    Upside,
}

impl From<VaultKindArg> for VaultKind {
    fn from(arg: VaultKindArg) -> Self {
        match arg {
            VaultKindArg::FixedYield => VaultKind::FixedYield,
            VaultKindArg::Upside => VaultKind::FixedYieldUpside,
        }
    }
}

#[derive(Args, Debug)]
pub struct DepositRedeemArgs {
    /// Which kind of vault to use.
    #[arg(long, value_enum, default_value = "fixed-yield")]
    pub kind: VaultKindArg,

    /// Whole asset units each actor deposits.
    #[arg(long, default_value_t = 1_000)]
    pub amount: u64,

    /// Whole asset units of yield repaid on top of the principal.
    #[arg(long = "yield", value_name = "AMOUNT")]
    pub yield_amount: Option<u64>,
}

#[derive(Args, Debug)]
pub struct LoadDepositsArgs {
    /// Vault to deposit into.
    #[arg(long)]
    pub vault: String,

    /// JSON file with `[{ id, amount, receiver }]` records.
    pub batch: PathBuf,

    /// Directory of the processed log.
    #[arg(long, env = "CREDBULL_PROCESSED_LOG", default_value = "processed-log")]
    pub log_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Contract address.
    pub address: String,
}
