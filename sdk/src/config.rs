//! # Constants
//!
//! Endpoint paths, contract registry names and time constants shared by the
//! SDK and the operator tooling. Anything that names a remote resource
//! lives here so that a renamed route is a one-line change.

// ---------------------------------------------------------------------------
// API Routes
// ---------------------------------------------------------------------------

/// Email/password sign-in. Returns an access token and the user id.
pub const ROUTE_SIGN_IN: &str = "auth/api/sign-in";

/// Links a wallet to the signed-in account using a SIWE message.
pub const ROUTE_LINK_WALLET: &str = "accounts/link-wallet";

/// Adds an address to the KYC whitelist. Admin only.
pub const ROUTE_WHITELIST: &str = "accounts/whitelist";

/// Lists the vaults currently open to the signed-in user.
pub const ROUTE_CURRENT_VAULTS: &str = "vaults/current";

/// Creates a fixed-yield vault. Admin only.
pub const ROUTE_CREATE_VAULT: &str = "vaults/create-vault";

/// Creates a fixed-yield vault with upside. Admin only.
pub const ROUTE_CREATE_VAULT_UPSIDE: &str = "vaults/create-vault-upside";

// ---------------------------------------------------------------------------
// Contract Registry Names
// ---------------------------------------------------------------------------

/// Factory deploying fixed-yield vaults.
pub const CONTRACT_FIXED_YIELD_FACTORY: &str = "CredbullFixedYieldVaultFactory";

/// Factory deploying fixed-yield vaults with upside.
pub const CONTRACT_UPSIDE_FACTORY: &str = "CredbullUpsideVaultFactory";

/// KYC/whitelist provider gating deposits.
pub const CONTRACT_WHITELIST_PROVIDER: &str = "CredbullWhiteListProvider";

/// Test stablecoin used as the vault asset outside production.
pub const CONTRACT_MOCK_STABLECOIN: &str = "MockStablecoin";

/// Test token used as upside collateral outside production.
pub const CONTRACT_MOCK_TOKEN: &str = "MockToken";

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Length of both the deposit window and the redemption window.
pub const WINDOW_LENGTH_SECS: i64 = 604_800;

// ---------------------------------------------------------------------------
// Wallet Linking
// ---------------------------------------------------------------------------

/// Statement embedded in every SIWE message sent to the link-wallet route.
pub const SIWE_STATEMENT: &str =
    "By connecting your wallet, you agree to the Terms of Service and Privacy Policy.";

/// SIWE message format version. EIP-4361 defines only "1".
pub const SIWE_VERSION: &str = "1";

/// Default chain id (local anvil) when the configuration does not name one.
pub const DEFAULT_CHAIN_ID: u64 = 31_337;
