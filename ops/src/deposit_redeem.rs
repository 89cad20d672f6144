//! # Deposit/Redeem Demonstration
//!
//! Walks one or more actors through a full vault lifecycle: link wallet,
//! fund, approve, deposit, then (after the admin repays principal plus
//! yield and lifts the window and maturity checks) redeem everything.
//!
//! Actors run one after another. Each actor signs with its own key and every
//! write waits for its receipt, so no two transactions from the same signer
//! are ever in flight together. Any failed step ends the run.

use credbull_sdk::api::{ApiClient, VaultKind};
use credbull_sdk::chain::VaultChain;
use credbull_sdk::report::{format_amount, scale_whole, BalanceSnapshot};
use credbull_sdk::CredbullSdk;
use ethers::types::{Address, U256};
use tracing::{debug, info};

use crate::config::{required, UserSection};
use crate::error::{OpsError, OpsResult};
use crate::params::PercentagePoints;
use crate::schema::{self, Schema};

/// What `deposit-redeem` needs from the configuration for `actors`.
pub fn schema(actors: &[&str]) -> Schema {
    actors.iter().fold(
        schema::api()
            .merge(schema::app())
            .merge(schema::evm_rpc())
            .merge(schema::admin_user()),
        |acc, name| acc.merge(schema::user(name)),
    )
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

/// A named user driving one side of the demonstration.
pub struct Actor<C> {
    pub name: String,
    pub sdk: CredbullSdk<C>,
}

impl<C: VaultChain> Actor<C> {
    pub fn new(name: impl Into<String>, sdk: CredbullSdk<C>) -> Self {
        Self {
            name: name.into(),
            sdk,
        }
    }

    /// Signs in with the credentials in `user`, signing transactions with
    /// `chain`.
    pub async fn login(
        api: &ApiClient,
        name: &str,
        user: &UserSection,
        chain: C,
        app_url: &str,
    ) -> OpsResult<Self> {
        let email = required(user.email_address.as_deref(), "users.*.email_address")?;
        let password = required(user.password.as_deref(), "users.*.password")?;
        let sdk = CredbullSdk::login(api, email, password, chain, app_url).await?;
        Ok(Self::new(name, sdk))
    }

    pub fn address(&self) -> Address {
        self.sdk.address()
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// One actor's deposit.
#[derive(Clone, Debug)]
pub struct DepositOutcome {
    pub actor: String,
    pub vault: Address,
    pub assets: U256,
    pub before: BalanceSnapshot,
    pub after: BalanceSnapshot,
}

/// One actor's full redemption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedeemOutcome {
    pub actor: String,
    pub vault: Address,
    pub shares: U256,
    /// `previewRedeem(shares)` taken right before redeeming.
    pub preview: U256,
    /// Asset balance before redeeming.
    pub pre_balance: U256,
    /// Asset balance after redeeming.
    pub post_balance: U256,
}

impl RedeemOutcome {
    /// Whether the actor received exactly the previewed amount.
    pub fn matches_preview(&self) -> bool {
        self.pre_balance.checked_add(self.preview) == Some(self.post_balance)
    }
}

#[derive(Clone, Debug, Default)]
pub struct FlowReport {
    pub deposits: Vec<DepositOutcome>,
    pub redemptions: Vec<RedeemOutcome>,
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// Drives the actors through deposit and redemption of one vault kind.
pub struct DepositRedeemFlow<'a, A, C> {
    admin: &'a A,
    actors: &'a [Actor<C>],
    kind: VaultKind,
    /// Whole asset units per actor.
    amount: u64,
    /// Whole asset units added on top of the principal, per vault.
    yield_amount: Option<u64>,
    collateral_percentage: PercentagePoints,
}

impl<'a, A: VaultChain, C: VaultChain> DepositRedeemFlow<'a, A, C> {
    /// `admin` mints test funds and toggles vault checks.
    pub fn new(admin: &'a A, actors: &'a [Actor<C>], kind: VaultKind, amount: u64) -> Self {
        Self {
            admin,
            actors,
            kind,
            amount,
            yield_amount: None,
            collateral_percentage: PercentagePoints(200),
        }
    }

    pub fn with_yield(mut self, yield_amount: u64) -> Self {
        self.yield_amount = Some(yield_amount);
        self
    }

    /// Collateral upside vaults pull per deposit.
    pub fn with_collateral_percentage(mut self, percentage: PercentagePoints) -> Self {
        self.collateral_percentage = percentage;
        self
    }

    /// Deposits for every actor, then redeems for every actor.
    pub async fn run(&self) -> OpsResult<FlowReport> {
        let mut report = FlowReport::default();
        for actor in self.actors {
            report.deposits.push(self.deposit(actor).await?);
        }

        let mut repaid: Vec<Address> = Vec::new();
        for (actor, deposit) in self.actors.iter().zip(&report.deposits) {
            if !repaid.contains(&deposit.vault) {
                self.prepare_redemption(deposit.vault, &report.deposits).await?;
                repaid.push(deposit.vault);
            }
            report.redemptions.push(self.redeem(actor, deposit.vault).await?);
        }
        Ok(report)
    }

    async fn deposit(&self, actor: &Actor<C>) -> OpsResult<DepositOutcome> {
        let linked = actor.sdk.link_wallet(Some(actor.name.as_str())).await?;
        debug!(actor = %actor.name, address = ?linked.address, "wallet linked");

        let vault = actor
            .sdk
            .get_all_vaults()
            .await?
            .into_iter()
            .find(|v| v.kind == self.kind)
            .ok_or(OpsError::VaultNotFound { kind: self.kind })?
            .address;
        let asset = actor.sdk.get_asset(vault).await?;
        let decimals = self.admin.token_info(asset).await?.decimals;
        let assets = scaled(self.amount, decimals)?;

        self.admin.mint(asset, actor.address(), assets).await?;
        actor.sdk.chain().approve(asset, vault, assets).await?;

        if self.kind == VaultKind::FixedYieldUpside {
            let token = self.admin.upside_token(vault).await?;
            let token_decimals = self.admin.token_info(token).await?.decimals;
            let collateral = U256::from(self.collateral_percentage.0)
                .checked_mul(scaled(self.amount, token_decimals)?)
                .ok_or(OpsError::AmountOverflow {
                    amount: self.amount,
                    decimals: token_decimals,
                })?
                / U256::from(100);
            self.admin.mint(token, actor.address(), collateral).await?;
            actor.sdk.chain().approve(token, vault, collateral).await?;
            debug!(
                actor = %actor.name,
                collateral = %format_amount(collateral, token_decimals),
                "collateral approved"
            );
        }

        let parties = self.parties(actor, vault).await?;
        let label = format!("{} before deposit", actor.name);
        let before = BalanceSnapshot::capture(self.admin, label, vault, &parties).await?;
        info!("\n{before}");

        let tx = actor.sdk.deposit(vault, assets, actor.address()).await?;
        info!(
            actor = %actor.name,
            vault = ?vault,
            assets = %format_amount(assets, decimals),
            tx = ?tx,
            "deposited"
        );

        let label = format!("{} after deposit", actor.name);
        let after = BalanceSnapshot::capture(self.admin, label, vault, &parties).await?;
        info!("\n{after}");

        Ok(DepositOutcome {
            actor: actor.name.clone(),
            vault,
            assets,
            before,
            after,
        })
    }

    /// Repays principal plus yield into the vault and lifts the checks that
    /// would block an early redemption.
    async fn prepare_redemption(
        &self,
        vault: Address,
        deposits: &[DepositOutcome],
    ) -> OpsResult<()> {
        let asset = self.admin.vault_asset(vault).await?;
        let decimals = self.admin.token_info(asset).await?.decimals;
        let principal = deposits
            .iter()
            .filter(|d| d.vault == vault)
            .fold(U256::zero(), |acc, d| acc + d.assets);
        let yield_assets = scaled(self.yield_amount.unwrap_or(0), decimals)?;

        self.admin.mint(asset, vault, principal + yield_assets).await?;
        info!(
            vault = ?vault,
            principal = %format_amount(principal, decimals),
            yield_assets = %format_amount(yield_assets, decimals),
            "repaid into vault"
        );

        self.admin.toggle_window_check(vault, false).await?;
        self.admin.toggle_maturity_check(vault, false).await?;
        Ok(())
    }

    async fn redeem(&self, actor: &Actor<C>, vault: Address) -> OpsResult<RedeemOutcome> {
        let asset = self.admin.vault_asset(vault).await?;
        let shares = actor.sdk.shares_of(vault, actor.address()).await?;
        let pre_balance = self.admin.balance_of(asset, actor.address()).await?;
        let preview = self.admin.preview_redeem(vault, shares).await?;

        let tx = actor.sdk.redeem(vault, shares, actor.address()).await?;
        let post_balance = self.admin.balance_of(asset, actor.address()).await?;
        info!(
            actor = %actor.name,
            vault = ?vault,
            shares = %shares,
            preview = %preview,
            tx = ?tx,
            "redeemed"
        );

        let parties = self.parties(actor, vault).await?;
        let label = format!("{} after redeem", actor.name);
        let snapshot = BalanceSnapshot::capture(self.admin, label, vault, &parties).await?;
        info!("\n{snapshot}");

        Ok(RedeemOutcome {
            actor: actor.name.clone(),
            vault,
            shares,
            preview,
            pre_balance,
            post_balance,
        })
    }

    async fn parties(
        &self,
        actor: &Actor<C>,
        vault: Address,
    ) -> OpsResult<Vec<(&'static str, Address)>> {
        let custodian = self.admin.vault_custodian(vault).await?;
        Ok(vec![("vault", vault), ("actor", actor.address()), ("custodian", custodian)])
    }
}

/// `amount` whole units in raw units of a token with `decimals`.
fn scaled(amount: u64, decimals: u8) -> OpsResult<U256> {
    scale_whole(U256::from(amount), decimals).ok_or(OpsError::AmountOverflow { amount, decimals })
}
