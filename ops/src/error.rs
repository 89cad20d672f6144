//! Error type shared by the operator flows.

use credbull_sdk::api::{ApiError, VaultKind};
use credbull_sdk::chain::ChainError;
use credbull_sdk::SdkError;
use ethers::types::Address;
use thiserror::Error;

use crate::config::ConfigError;
use crate::schema::ValidationError;
use crate::staking::LedgerError;

/// Anything an operator flow can fail with. Lower-level errors pass through
/// unchanged.
#[derive(Debug, Error)]
pub enum OpsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The contract registry has no address for a required contract.
    #[error("no `{name}` contract registered for chain {chain_id}")]
    MissingContract { name: String, chain_id: u64 },

    /// No vault of the requested kind is available to the account.
    #[error("no {kind} vault available")]
    VaultNotFound { kind: VaultKind },

    /// The create-vault route answered with an empty `data` list.
    #[error("vault creation returned no records")]
    EmptyCreateResponse,

    /// A whole-unit amount does not fit in 256 bits once scaled by the
    /// token's decimals.
    #[error("amount {amount} does not fit a token with {decimals} decimals")]
    AmountOverflow { amount: u64, decimals: u8 },

    /// The referenced vault has no custodian entity on record.
    #[error("no custodian recorded for vault {vault:?}")]
    UnknownCustodian { vault: Address },
}

/// Convenience alias for operator results.
pub type OpsResult<T> = Result<T, OpsError>;
