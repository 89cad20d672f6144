// Copyright (c) 2026 Credbull. MIT License.
// See LICENSE for details.

//! # Credbull Ops
//!
//! Entry point for the `credbull-ops` binary. Parses arguments, sets up
//! logging, loads configuration, and runs one operator flow.
//!
//! - `create-user`   : provision a confirmed account
//! - `whitelist`     : whitelist a wallet for an account
//! - `create-vault`  : create a fixed-yield or upside vault
//! - `deposit-redeem`: two-actor deposit and redeem demonstration
//! - `load-deposits` : idempotent deposit-batch loader
//! - `describe-vault` / `describe-token`: print contract state
//! - `version`       : print build version information

mod cli;
mod logging;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;

use credbull_ops::config::{required, Config};
use credbull_ops::create_vault::{self, CreateVaultOptions, VaultCreator};
use credbull_ops::deposit_redeem::{self, Actor, DepositRedeemFlow};
use credbull_ops::params::PercentagePoints;
use credbull_ops::schema::{self, parse_address, Constraint, Schema};
use credbull_ops::staking::{self, ProcessedLog};
use credbull_ops::supabase::SupabaseAdmin;
use credbull_ops::users;
use credbull_sdk::api::{login, ApiClient};
use credbull_sdk::chain::EthersChain;
use credbull_sdk::config::DEFAULT_CHAIN_ID;
use credbull_sdk::report;

use cli::{Commands, OpsCli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = OpsCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| Config::default_path(Path::new("."), Some(&cli.environment)));
    let config = Config::load(&path, |key| std::env::var(key).ok())
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    match cli.command {
        Commands::CreateUser(args) => create_user(&config, args).await,
        Commands::Whitelist(args) => whitelist(&config, args).await,
        Commands::CreateVault(args) => create_vault(&config, args).await,
        Commands::DepositRedeem(args) => deposit_redeem(&config, args).await,
        Commands::LoadDeposits(args) => load_deposits(&config, args).await,
        Commands::DescribeVault(args) => describe(&config, args, true).await,
        Commands::DescribeToken(args) => describe(&config, args, false).await,
        Commands::Version => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

fn api_client(config: &Config) -> Result<ApiClient> {
    let url = required(config.api.url.as_deref(), "api.url")?;
    ApiClient::new(url).context("invalid API url")
}

fn supabase_admin(config: &Config) -> Result<SupabaseAdmin> {
    let supabase = &config.services.supabase;
    SupabaseAdmin::new(
        required(supabase.url.as_deref(), "services.supabase.url")?,
        required(supabase.service_role_key.as_deref(), "services.supabase.service_role_key")?,
    )
    .context("invalid Supabase url")
}

/// A signer on the configured chain.
fn signer(config: &Config, private_key: Option<&str>, path: &'static str) -> Result<EthersChain> {
    let key = required(private_key, path)?;
    let rpc = required(config.evm.url.as_deref(), "evm.url")?;
    let chain_id = config.evm.chain_id.unwrap_or(DEFAULT_CHAIN_ID);
    EthersChain::connect(key, rpc, chain_id)
        .with_context(|| format!("failed to build signer from `{path}`"))
}

fn admin_signer(config: &Config) -> Result<EthersChain> {
    signer(
        config,
        config.users.admin.private_key.as_deref(),
        "users.admin.private_key",
    )
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn create_user(config: &Config, args: cli::CreateUserArgs) -> Result<()> {
    config.validate(&users::create_user_schema())?;
    let provisioned = users::create_user(
        &supabase_admin(config)?,
        &args.email,
        args.password.as_deref(),
        args.channel.as_deref(),
    )
    .await
    .with_context(|| format!("failed to create user {}", args.email))?;

    println!("id       : {}", provisioned.user.id);
    println!("email    : {}", args.email);
    if args.password.is_none() {
        println!("password : {}", provisioned.password);
    }
    Ok(())
}

async fn whitelist(config: &Config, args: cli::WhitelistArgs) -> Result<()> {
    config.validate(&users::whitelist_schema())?;
    let address = parse_address(&args.address)?;
    let api = api_client(config)?;
    let admin = &config.users.admin;
    let session = login(
        &api,
        required(admin.email_address.as_deref(), "users.admin.email_address")?,
        required(admin.password.as_deref(), "users.admin.password")?,
    )
    .await
    .context("admin sign-in failed")?;

    let response = users::whitelist(&api, &session, address, &args.user_id)
        .await
        .with_context(|| format!("failed to whitelist {}", args.address))?;
    println!("whitelisted {address:?} (tx {})", response.tx_hash.as_deref().unwrap_or("-"));
    Ok(())
}

async fn create_vault(config: &Config, args: cli::CreateVaultArgs) -> Result<()> {
    config.validate(&create_vault::schema())?;
    let creator = VaultCreator::new(
        config,
        api_client(config)?,
        supabase_admin(config)?,
        admin_signer(config)?,
    );
    let vault = creator
        .create(&CreateVaultOptions {
            matured: args.matured,
            upside: args.upside,
            tenant: args.tenant,
        })
        .await
        .context("vault creation failed")?;

    println!("{} vault {} at {:?}", vault.kind, vault.id, vault.address);
    Ok(())
}

async fn deposit_redeem(config: &Config, args: cli::DepositRedeemArgs) -> Result<()> {
    const ACTORS: [&str; 2] = ["alice", "bob"];

    config.validate(&deposit_redeem::schema(&ACTORS))?;

    let api = api_client(config)?;
    let app_url = required(config.app.url.as_deref(), "app.url")?;
    let admin = admin_signer(config)?;

    let mut actors = Vec::with_capacity(ACTORS.len());
    for name in ACTORS {
        let Some(user) = config.user(name) else {
            bail!("no user section for {name}");
        };
        let chain = signer(config, user.private_key.as_deref(), "users.*.private_key")?;
        let actor = Actor::login(&api, name, user, chain, app_url)
            .await
            .with_context(|| format!("{name} could not sign in"))?;
        actors.push(actor);
    }

    let collateral = config.operation.create_vault.collateral_percentage.unwrap_or(200);
    let mut flow = DepositRedeemFlow::new(&admin, &actors, args.kind.into(), args.amount)
        .with_collateral_percentage(PercentagePoints(collateral));
    if let Some(yield_amount) = args.yield_amount {
        flow = flow.with_yield(yield_amount);
    }

    let report = flow.run().await.context("deposit/redeem run aborted")?;
    for outcome in &report.redemptions {
        println!(
            "{:<6} shares={} preview={} pre={} post={} {}",
            outcome.actor,
            outcome.shares,
            outcome.preview,
            outcome.pre_balance,
            outcome.post_balance,
            if outcome.matches_preview() { "ok" } else { "MISMATCH" },
        );
    }
    if report.redemptions.iter().any(|o| !o.matches_preview()) {
        bail!("a redemption paid out something other than its preview");
    }
    Ok(())
}

async fn load_deposits(config: &Config, args: cli::LoadDepositsArgs) -> Result<()> {
    let needs = schema::evm_rpc().merge(
        Schema::new("operator").require("secret.operator_private_key", Constraint::PrivateKey),
    );
    config.validate(&needs)?;

    let vault = parse_address(&args.vault)?;
    let chain = signer(
        config,
        config.secret.operator_private_key.as_deref(),
        "secret.operator_private_key",
    )?;
    let records = staking::read_batch(&args.batch)?;
    let log = ProcessedLog::open(&args.log_dir)
        .with_context(|| format!("failed to open processed log at {}", args.log_dir.display()))?;

    let report = staking::load_deposits(&chain, vault, &records, &log).await?;
    println!(
        "succeeded={} skipped={} failed={}",
        report.succeeded, report.skipped, report.failed
    );
    Ok(())
}

async fn describe(config: &Config, args: cli::DescribeArgs, vault: bool) -> Result<()> {
    let needs = schema::evm_rpc().merge(
        Schema::new("reader").require("users.admin.private_key", Constraint::PrivateKey),
    );
    config.validate(&needs)?;

    let address = parse_address(&args.address)?;
    let chain = admin_signer(config)?;
    let text = if vault {
        report::describe_vault(&chain, address).await
    } else {
        report::describe_token(&chain, address).await
    }
    .with_context(|| format!("failed to read {}", args.address))?;
    println!("{text}");
    Ok(())
}

fn print_version() {
    println!("credbull-ops {}", env!("CARGO_PKG_VERSION"));
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
