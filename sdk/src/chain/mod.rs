//! # Chain Module
//!
//! Everything the tooling does on-chain goes through [`VaultChain`]: one
//! value per signer, exposing exactly the vault, token and factory calls the
//! operator flows need. Writes return only after the transaction receipt is
//! in, so the next step never reads stale state.
//!
//! ```text
//! bindings.rs    : abigen! bindings for the vault, token and factory ABIs
//! ethers_chain.rs: VaultChain over an ethers SignerMiddleware
//! memory.rs      : in-memory VaultChain for tests (feature "testing")
//! ```

pub mod bindings;
pub mod ethers_chain;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use thiserror::Error;

pub use ethers_chain::EthersChain;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by on-chain calls.
///
/// Revert data is not decoded here; the underlying client's message is kept
/// verbatim in `reason`.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The private key could not be parsed.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// The RPC endpoint URL could not be parsed.
    #[error("invalid RPC endpoint {url}: {reason}")]
    InvalidEndpoint {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// A call or transaction submission failed before a receipt existed.
    #[error("{call} failed: {reason}")]
    Call {
        /// Contract method that was invoked.
        call: String,
        /// Client or node message.
        reason: String,
    },

    /// The transaction was mined but reverted.
    #[error("{call} reverted in transaction {tx_hash:?}")]
    Reverted {
        /// Contract method that was invoked.
        call: String,
        /// Hash of the reverted transaction.
        tx_hash: H256,
    },

    /// The transaction disappeared from the mempool without a receipt.
    #[error("{call} dropped before confirmation (transaction {tx_hash:?})")]
    Dropped {
        /// Contract method that was invoked.
        call: String,
        /// Hash of the dropped transaction.
        tx_hash: H256,
    },

    /// Message signing failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl ChainError {
    pub(crate) fn call(call: &str, reason: impl ToString) -> Self {
        ChainError::Call {
            call: call.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias for chain results.
pub type ChainResult<T> = Result<T, ChainError>;

// ---------------------------------------------------------------------------
// Read Models
// ---------------------------------------------------------------------------

/// ERC-20 metadata and supply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// Vault state relevant to operators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultInfo {
    /// The vault's own share token.
    pub shares: TokenInfo,
    /// Underlying asset token address.
    pub asset: Address,
    /// Assets accounted to the vault.
    pub total_assets: U256,
    /// Whether deposits and redemptions are paused.
    pub paused: bool,
    /// Whether redemption requires the vault to be matured.
    pub check_maturity: bool,
}

// ---------------------------------------------------------------------------
// VaultChain
// ---------------------------------------------------------------------------

/// On-chain capability bound to one signer.
///
/// Transactions from the same signer must be submitted serially; every
/// write method waits for its receipt and returns the transaction hash.
#[async_trait]
pub trait VaultChain: Send + Sync {
    /// Address of the signer behind this handle.
    fn address(&self) -> Address;

    /// Chain id transactions are signed for.
    fn chain_id(&self) -> u64;

    /// Signs an EIP-191 personal message and returns the `0x`-prefixed
    /// signature.
    async fn sign_message(&self, message: &str) -> ChainResult<String>;

    /// Permits `custodian` on a vault factory.
    async fn allow_custodian(&self, factory: Address, custodian: Address) -> ChainResult<H256>;

    /// Enables or disables deposit/redemption window enforcement.
    async fn toggle_window_check(&self, vault: Address, enabled: bool) -> ChainResult<H256>;

    /// Enables or disables the matured-before-redeem check.
    async fn toggle_maturity_check(&self, vault: Address, enabled: bool) -> ChainResult<H256>;

    /// Mints test tokens. Only works against mock tokens.
    async fn mint(&self, token: Address, to: Address, amount: U256) -> ChainResult<H256>;

    /// Approves `spender` to pull `amount` of `token` from the signer.
    async fn approve(&self, token: Address, spender: Address, amount: U256) -> ChainResult<H256>;

    /// Deposits `assets` into `vault`, minting shares to `receiver`.
    async fn deposit(&self, vault: Address, assets: U256, receiver: Address) -> ChainResult<H256>;

    /// Redeems the signer's `shares`, sending assets to `receiver`.
    async fn redeem(&self, vault: Address, shares: U256, receiver: Address) -> ChainResult<H256>;

    /// ERC-20 balance (vault shares are ERC-20 too).
    async fn balance_of(&self, token: Address, owner: Address) -> ChainResult<U256>;

    /// Assets that redeeming `shares` would return right now.
    async fn preview_redeem(&self, vault: Address, shares: U256) -> ChainResult<U256>;

    /// The vault's underlying asset.
    async fn vault_asset(&self, vault: Address) -> ChainResult<Address>;

    /// The collateral token of an upside vault.
    async fn upside_token(&self, vault: Address) -> ChainResult<Address>;

    /// The custodian recorded in the vault.
    async fn vault_custodian(&self, vault: Address) -> ChainResult<Address>;

    /// ERC-20 metadata and supply.
    async fn token_info(&self, token: Address) -> ChainResult<TokenInfo>;

    /// Vault metadata and flags.
    async fn vault_info(&self, vault: Address) -> ChainResult<VaultInfo>;
}
