//! # Operator Reporting
//!
//! Read-only helpers that turn raw on-chain integers into text an operator
//! can read. Amounts are formatted exactly: the fractional part is kept to
//! the last significant digit, never truncated by integer division.

use ethers::types::{Address, U256};
use std::fmt::{self, Write as _};

use crate::chain::{ChainResult, VaultChain};

// ---------------------------------------------------------------------------
// Amount Formatting
// ---------------------------------------------------------------------------

/// Formats a raw token amount with `decimals` fractional digits.
///
/// Trailing fractional zeros are trimmed, and the decimal point is dropped
/// for whole amounts: `1_500_000` with 6 decimals is `"1.5"`, `2_000_000`
/// is `"2"`.
///
/// `10^decimals` overflows 256 bits from 78 decimals up; every such amount
/// is then a pure fraction.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }

    let (whole, fraction) = match decimal_unit(decimals) {
        Some(unit) => amount.div_mod(unit),
        None => (U256::zero(), amount),
    };
    if fraction.is_zero() {
        return whole.to_string();
    }

    let digits = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// `10^decimals`, or `None` when it does not fit in a `U256`.
pub fn decimal_unit(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Converts whole token units to raw units, or `None` on overflow.
pub fn scale_whole(whole: U256, decimals: u8) -> Option<U256> {
    decimal_unit(decimals).and_then(|unit| whole.checked_mul(unit))
}

/// Returns a formatter bound to `decimals`.
pub fn amount_formatter(decimals: u8) -> impl Fn(U256) -> String {
    move |amount| format_amount(amount, decimals)
}

// ---------------------------------------------------------------------------
// Descriptions
// ---------------------------------------------------------------------------

/// Multi-line description of an ERC-20 token.
pub async fn describe_token<C: VaultChain + ?Sized>(
    chain: &C,
    token: Address,
) -> ChainResult<String> {
    let info = chain.token_info(token).await?;
    let fmt = amount_formatter(info.decimals);

    let mut out = String::new();
    let _ = writeln!(out, "Token        : {:?}", info.address);
    let _ = writeln!(out, "  name       : {}", info.name);
    let _ = writeln!(out, "  symbol     : {}", info.symbol);
    let _ = writeln!(out, "  decimals   : {}", info.decimals);
    let _ = write!(out, "  totalSupply: {}", fmt(info.total_supply));
    Ok(out)
}

/// Multi-line description of a vault and its asset.
pub async fn describe_vault<C: VaultChain + ?Sized>(
    chain: &C,
    vault: Address,
) -> ChainResult<String> {
    let info = chain.vault_info(vault).await?;
    let asset = chain.token_info(info.asset).await?;
    let shares = amount_formatter(info.shares.decimals);
    let assets = amount_formatter(asset.decimals);

    let mut out = String::new();
    let _ = writeln!(out, "Vault        : {:?}", vault);
    let _ = writeln!(out, "  name       : {}", info.shares.name);
    let _ = writeln!(out, "  symbol     : {}", info.shares.symbol);
    let _ = writeln!(out, "  totalSupply: {}", shares(info.shares.total_supply));
    let _ = writeln!(out, "  asset      : {} ({:?})", asset.symbol, info.asset);
    let _ = writeln!(out, "  totalAssets: {}", assets(info.total_assets));
    let _ = writeln!(out, "  paused     : {}", info.paused);
    let maturity = if info.check_maturity {
        "enforced"
    } else {
        "not enforced"
    };
    let _ = write!(out, "  maturity   : {}", maturity);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Balance Snapshots
// ---------------------------------------------------------------------------

/// Share and asset balances of one party at a point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartyBalance {
    pub label: String,
    pub address: Address,
    pub shares: U256,
    pub assets: U256,
}

/// Balances of every tracked party for one vault.
#[derive(Clone, Debug)]
pub struct BalanceSnapshot {
    pub title: String,
    pub share_decimals: u8,
    pub asset_decimals: u8,
    pub parties: Vec<PartyBalance>,
}

impl BalanceSnapshot {
    /// Queries share and asset balances for each `(label, address)` pair.
    pub async fn capture<C: VaultChain + ?Sized>(
        chain: &C,
        title: impl Into<String>,
        vault: Address,
        parties: &[(&str, Address)],
    ) -> ChainResult<Self> {
        let asset = chain.vault_asset(vault).await?;
        let share_decimals = chain.token_info(vault).await?.decimals;
        let asset_decimals = chain.token_info(asset).await?.decimals;

        let mut balances = Vec::with_capacity(parties.len());
        for (label, address) in parties {
            balances.push(PartyBalance {
                label: label.to_string(),
                address: *address,
                shares: chain.balance_of(vault, *address).await?,
                assets: chain.balance_of(asset, *address).await?,
            });
        }

        Ok(Self {
            title: title.into(),
            share_decimals,
            asset_decimals,
            parties: balances,
        })
    }

    /// Finds a party by label.
    pub fn party(&self, label: &str) -> Option<&PartyBalance> {
        self.parties.iter().find(|p| p.label == label)
    }
}

impl fmt::Display for BalanceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.title)?;
        for party in &self.parties {
            writeln!(
                f,
                "  {:<10} {:?}  shares={:<20} assets={}",
                party.label,
                party.address,
                format_amount(party.shares, self.share_decimals),
                format_amount(party.assets, self.asset_decimals),
            )?;
        }
        Ok(())
    }
}
