//! Wire types for the Credbull API.

use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Body of the sign-in route.
#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// An authenticated API session.
#[derive(Clone, Debug, Deserialize)]
pub struct Session {
    /// Bearer token for subsequent calls.
    pub access_token: String,
    /// Account identifier in the API's user store.
    pub user_id: String,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Body of the link-wallet route.
#[derive(Debug, Serialize)]
pub struct LinkWalletRequest<'a> {
    pub message: &'a str,
    pub signature: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<&'a str>,
}

/// A wallet linked to an account, as returned by the API.
#[derive(Clone, Debug, Deserialize)]
pub struct LinkedWallet {
    pub address: Address,
    pub user_id: String,
    #[serde(default)]
    pub discriminator: Option<String>,
}

/// Body of the whitelist route.
#[derive(Debug, Serialize)]
pub struct WhitelistRequest<'a> {
    pub address: Address,
    pub user_id: &'a str,
}

/// Result of a whitelist call.
#[derive(Clone, Debug, Deserialize)]
pub struct WhitelistResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Vaults
// ---------------------------------------------------------------------------

/// Vault variant tag as stored by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultKind {
    /// Fixed-yield vault.
    FixedYield,
    /// Fixed-yield vault with upside exposure, requiring collateral.
    FixedYieldUpside,
}

impl fmt::Display for VaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultKind::FixedYield => write!(f, "fixed_yield"),
            VaultKind::FixedYieldUpside => write!(f, "fixed_yield_upside"),
        }
    }
}

/// A vault row as returned by the API.
#[derive(Clone, Debug, Deserialize)]
pub struct VaultRecord {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: VaultKind,
    pub status: String,
    pub address: Address,
    #[serde(default)]
    pub asset_address: Option<Address>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub deposits_opened_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deposits_closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub redemptions_opened_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub redemptions_closed_at: Option<DateTime<Utc>>,
}

/// The `{ data: [...] }` envelope used by list and create routes.
#[derive(Clone, Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}
