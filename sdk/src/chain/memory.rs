//! In-memory [`VaultChain`] for tests.
//!
//! Models just enough of the contracts for operator flows to be exercised
//! end to end: ERC-20 balances and allowances, ERC-4626 style share math,
//! custodian hand-off on deposit, window/maturity toggles, upside collateral
//! and factory custodian allow-lists. Every handle created from the same
//! [`MemoryWorld`] sees the same state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256};
use parking_lot::Mutex;

use super::{ChainError, ChainResult, TokenInfo, VaultChain, VaultInfo};

#[derive(Debug, Default)]
struct Token {
    name: String,
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl Token {
    fn supply(&self) -> U256 {
        self.balances
            .values()
            .fold(U256::zero(), |acc, b| acc.saturating_add(*b))
    }

    fn balance(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    fn credit(&mut self, owner: Address, amount: U256) {
        let entry = self.balances.entry(owner).or_default();
        *entry = entry.saturating_add(amount);
    }

    fn debit(&mut self, owner: Address, amount: U256) -> bool {
        let balance = self.balance(owner);
        if balance < amount {
            return false;
        }
        self.balances.insert(owner, balance - amount);
        true
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// The revert reason a `transferFrom` by `spender` would hit, if any.
    fn check_transfer_from(
        &self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), &'static str> {
        if self.allowance(owner, spender) < amount {
            return Err("ERC20InsufficientAllowance");
        }
        if self.balance(owner) < amount {
            return Err("ERC20InsufficientBalance");
        }
        Ok(())
    }

    /// Applies a `transferFrom` that [`Token::check_transfer_from`] accepted.
    fn transfer_from(&mut self, owner: Address, spender: Address, to: Address, amount: U256) {
        let allowance = self.allowance(owner, spender);
        self.allowances.insert((owner, spender), allowance - amount);
        if self.debit(owner, amount) {
            self.credit(to, amount);
        }
    }
}

#[derive(Debug)]
struct Vault {
    asset: Address,
    custodian: Address,
    window_check: bool,
    maturity_check: bool,
    upside: Option<Upside>,
}

#[derive(Debug, Clone, Copy)]
struct Upside {
    token: Address,
    /// Percentage points of the deposit pulled as collateral.
    collateral_percentage: u32,
}

#[derive(Debug, Default)]
struct State {
    next_address: u64,
    next_tx: u64,
    tokens: HashMap<Address, Token>,
    vaults: HashMap<Address, Vault>,
    factories: HashMap<Address, HashSet<Address>>,
    calls: Vec<String>,
}

impl State {
    fn fresh_address(&mut self) -> Address {
        self.next_address += 1;
        Address::from_low_u64_be(0xC0DE_0000 + self.next_address)
    }

    fn record(&mut self, call: String) -> H256 {
        self.next_tx += 1;
        self.calls.push(call);
        H256::from_low_u64_be(self.next_tx)
    }

    fn token(&self, call: &str, token: Address) -> ChainResult<&Token> {
        self.tokens
            .get(&token)
            .ok_or_else(|| ChainError::call(call, format!("no token at {token:?}")))
    }

    fn token_mut(&mut self, call: &str, token: Address) -> ChainResult<&mut Token> {
        self.tokens
            .get_mut(&token)
            .ok_or_else(|| ChainError::call(call, format!("no token at {token:?}")))
    }

    fn vault(&self, call: &str, vault: Address) -> ChainResult<&Vault> {
        self.vaults
            .get(&vault)
            .ok_or_else(|| ChainError::call(call, format!("no vault at {vault:?}")))
    }

    fn vault_mut(&mut self, call: &str, vault: Address) -> ChainResult<&mut Vault> {
        self.vaults
            .get_mut(&vault)
            .ok_or_else(|| ChainError::call(call, format!("no vault at {vault:?}")))
    }

    /// Assets the vault holds for redemption.
    fn vault_assets(&self, vault: Address) -> U256 {
        self.vaults
            .get(&vault)
            .and_then(|v| self.tokens.get(&v.asset))
            .map(|t| t.balance(vault))
            .unwrap_or_default()
    }

    fn share_supply(&self, vault: Address) -> U256 {
        self.tokens
            .get(&vault)
            .map(Token::supply)
            .unwrap_or_default()
    }

    fn preview_redeem(&self, vault: Address, shares: U256) -> U256 {
        let supply = self.share_supply(vault);
        if supply.is_zero() {
            return U256::zero();
        }
        shares * self.vault_assets(vault) / supply
    }
}

/// Shared state behind every [`MemoryChain`] handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorld {
    state: Arc<Mutex<State>>,
}

impl MemoryWorld {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a signer handle for `wallet`. The wallet carries the chain id.
    pub fn handle(&self, wallet: LocalWallet) -> MemoryChain {
        MemoryChain {
            state: Arc::clone(&self.state),
            wallet,
        }
    }

    /// Deploys a mintable ERC-20.
    pub fn deploy_token(&self, name: &str, symbol: &str, decimals: u8) -> Address {
        let mut state = self.state.lock();
        let address = state.fresh_address();
        state.tokens.insert(
            address,
            Token {
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
                ..Token::default()
            },
        );
        address
    }

    /// Deploys a fixed-yield vault over `asset`, with both checks enabled.
    pub fn deploy_vault(
        &self,
        name: &str,
        symbol: &str,
        asset: Address,
        custodian: Address,
    ) -> Address {
        self.deploy(name, symbol, asset, custodian, None)
    }

    /// Deploys an upside vault that pulls `collateral_percentage` percentage
    /// points of every deposit in `token`.
    pub fn deploy_upside_vault(
        &self,
        name: &str,
        symbol: &str,
        asset: Address,
        custodian: Address,
        token: Address,
        collateral_percentage: u32,
    ) -> Address {
        self.deploy(
            name,
            symbol,
            asset,
            custodian,
            Some(Upside {
                token,
                collateral_percentage,
            }),
        )
    }

    fn deploy(
        &self,
        name: &str,
        symbol: &str,
        asset: Address,
        custodian: Address,
        upside: Option<Upside>,
    ) -> Address {
        let decimals = self
            .state
            .lock()
            .tokens
            .get(&asset)
            .map(|t| t.decimals)
            .unwrap_or(18);
        let address = self.deploy_token(name, symbol, decimals);
        self.state.lock().vaults.insert(
            address,
            Vault {
                asset,
                custodian,
                window_check: true,
                maturity_check: true,
                upside,
            },
        );
        address
    }

    /// Deploys a vault factory with an empty custodian allow-list.
    pub fn deploy_factory(&self) -> Address {
        let mut state = self.state.lock();
        let address = state.fresh_address();
        state.factories.insert(address, HashSet::new());
        address
    }

    /// Whether `custodian` was allowed on `factory`.
    pub fn is_custodian_allowed(&self, factory: Address, custodian: Address) -> bool {
        self.state
            .lock()
            .factories
            .get(&factory)
            .map(|allowed| allowed.contains(&custodian))
            .unwrap_or(false)
    }

    /// Current `(window_check, maturity_check)` flags of a vault.
    pub fn vault_checks(&self, vault: Address) -> Option<(bool, bool)> {
        self.state
            .lock()
            .vaults
            .get(&vault)
            .map(|v| (v.window_check, v.maturity_check))
    }

    /// Balance lookup without going through a signer.
    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        self.state
            .lock()
            .tokens
            .get(&token)
            .map(|t| t.balance(owner))
            .unwrap_or_default()
    }

    /// Every write, in submission order, as `method(args)`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }
}

/// A signer handle into a [`MemoryWorld`].
#[derive(Debug, Clone)]
pub struct MemoryChain {
    state: Arc<Mutex<State>>,
    wallet: LocalWallet,
}

#[async_trait]
impl VaultChain for MemoryChain {
    fn address(&self) -> Address {
        self.wallet.address()
    }

    fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    async fn sign_message(&self, message: &str) -> ChainResult<String> {
        let signature = self
            .wallet
            .sign_message(message)
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        Ok(format!("0x{}", signature))
    }

    async fn allow_custodian(&self, factory: Address, custodian: Address) -> ChainResult<H256> {
        let mut state = self.state.lock();
        state
            .factories
            .get_mut(&factory)
            .ok_or_else(|| {
                ChainError::call("allowCustodian", format!("no factory at {factory:?}"))
            })?
            .insert(custodian);
        Ok(state.record(format!("allowCustodian({custodian:?})")))
    }

    async fn toggle_window_check(&self, vault: Address, enabled: bool) -> ChainResult<H256> {
        let mut state = self.state.lock();
        state.vault_mut("toggleWindowCheck", vault)?.window_check = enabled;
        Ok(state.record(format!("toggleWindowCheck({vault:?}, {enabled})")))
    }

    async fn toggle_maturity_check(&self, vault: Address, enabled: bool) -> ChainResult<H256> {
        let mut state = self.state.lock();
        state.vault_mut("toggleMaturityCheck", vault)?.maturity_check = enabled;
        Ok(state.record(format!("toggleMaturityCheck({vault:?}, {enabled})")))
    }

    async fn mint(&self, token: Address, to: Address, amount: U256) -> ChainResult<H256> {
        let mut state = self.state.lock();
        state.token_mut("mint", token)?.credit(to, amount);
        Ok(state.record(format!("mint({to:?}, {amount})")))
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> ChainResult<H256> {
        let owner = self.address();
        let mut state = self.state.lock();
        state
            .token_mut("approve", token)?
            .allowances
            .insert((owner, spender), amount);
        Ok(state.record(format!("approve({spender:?}, {amount})")))
    }

    async fn deposit(&self, vault: Address, assets: U256, receiver: Address) -> ChainResult<H256> {
        let owner = self.address();
        let mut state = self.state.lock();
        let (asset, custodian, upside) = {
            let v = state.vault("deposit", vault)?;
            (v.asset, v.custodian, v.upside)
        };

        let supply = state.share_supply(vault);
        let held = state.vault_assets(vault);
        let shares = if supply.is_zero() || held.is_zero() {
            assets
        } else {
            assets * supply / held
        };

        let collateral = upside.map(|u| {
            (
                u.token,
                assets * U256::from(u.collateral_percentage) / U256::from(100),
            )
        });

        // Both pulls must succeed before either is applied.
        if let Some((token, amount)) = collateral {
            state
                .token("deposit", token)?
                .check_transfer_from(owner, vault, amount)
                .map_err(|reason| ChainError::call("deposit", format!("collateral: {reason}")))?;
        }
        state
            .token("deposit", asset)?
            .check_transfer_from(owner, vault, assets)
            .map_err(|reason| ChainError::call("deposit", reason))?;

        if let Some((token, amount)) = collateral {
            state
                .token_mut("deposit", token)?
                .transfer_from(owner, vault, vault, amount);
        }
        state
            .token_mut("deposit", asset)?
            .transfer_from(owner, vault, custodian, assets);
        state.token_mut("deposit", vault)?.credit(receiver, shares);
        Ok(state.record(format!("deposit({assets}, {receiver:?})")))
    }

    async fn redeem(&self, vault: Address, shares: U256, receiver: Address) -> ChainResult<H256> {
        let owner = self.address();
        let mut state = self.state.lock();
        let (asset, window_check, maturity_check) = {
            let v = state.vault("redeem", vault)?;
            (v.asset, v.window_check, v.maturity_check)
        };
        if window_check {
            return Err(ChainError::call("redeem", "CredbullVault__OperationOutsideRequiredWindow"));
        }
        if maturity_check {
            return Err(ChainError::call("redeem", "CredbullVault__NotMatured"));
        }

        let assets = state.preview_redeem(vault, shares);
        if state.token("redeem", vault)?.balance(owner) < shares {
            return Err(ChainError::call("redeem", "ERC4626ExceededMaxRedeem"));
        }
        if state.token("redeem", asset)?.balance(vault) < assets {
            return Err(ChainError::call("redeem", "ERC20InsufficientBalance"));
        }

        state.token_mut("redeem", vault)?.debit(owner, shares);
        let token = state.token_mut("redeem", asset)?;
        token.debit(vault, assets);
        token.credit(receiver, assets);
        Ok(state.record(format!("redeem({shares}, {receiver:?})")))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> ChainResult<U256> {
        let mut state = self.state.lock();
        Ok(state.token_mut("balanceOf", token)?.balance(owner))
    }

    async fn preview_redeem(&self, vault: Address, shares: U256) -> ChainResult<U256> {
        let state = self.state.lock();
        state.vault("previewRedeem", vault)?;
        Ok(state.preview_redeem(vault, shares))
    }

    async fn vault_asset(&self, vault: Address) -> ChainResult<Address> {
        Ok(self.state.lock().vault("asset", vault)?.asset)
    }

    async fn upside_token(&self, vault: Address) -> ChainResult<Address> {
        self.state
            .lock()
            .vault("token", vault)?
            .upside
            .map(|u| u.token)
            .ok_or_else(|| ChainError::call("token", "not an upside vault"))
    }

    async fn vault_custodian(&self, vault: Address) -> ChainResult<Address> {
        Ok(self.state.lock().vault("CUSTODIAN", vault)?.custodian)
    }

    async fn token_info(&self, token: Address) -> ChainResult<TokenInfo> {
        let mut state = self.state.lock();
        let t = state.token_mut("name", token)?;
        Ok(TokenInfo {
            address: token,
            name: t.name.clone(),
            symbol: t.symbol.clone(),
            decimals: t.decimals,
            total_supply: t.supply(),
        })
    }

    async fn vault_info(&self, vault: Address) -> ChainResult<VaultInfo> {
        let shares = self.token_info(vault).await?;
        let state = self.state.lock();
        let v = state.vault("asset", vault)?;
        Ok(VaultInfo {
            shares,
            asset: v.asset,
            total_assets: state.vault_assets(vault),
            paused: false,
            check_maturity: v.maturity_check,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(seed: u8) -> LocalWallet {
        let key = [seed; 32];
        LocalWallet::from_bytes(&key).unwrap().with_chain_id(31_337u64)
    }

    #[tokio::test]
    async fn deposit_moves_assets_to_custodian_and_mints_shares() {
        let world = MemoryWorld::new();
        let custodian = Address::from_low_u64_be(0xCC);
        let asset = world.deploy_token("Mock Stablecoin", "USDC", 6);
        let vault = world.deploy_vault("Vault", "V", asset, custodian);
        let admin = world.handle(wallet(1));
        let alice = world.handle(wallet(2));

        admin.mint(asset, alice.address(), 1_000.into()).await.unwrap();
        alice.approve(asset, vault, 1_000.into()).await.unwrap();
        alice.deposit(vault, 1_000.into(), alice.address()).await.unwrap();

        assert_eq!(world.balance(asset, custodian), U256::from(1_000));
        assert_eq!(world.balance(vault, alice.address()), U256::from(1_000));
        assert_eq!(world.balance(asset, alice.address()), U256::zero());
    }

    #[tokio::test]
    async fn deposit_without_allowance_fails() {
        let world = MemoryWorld::new();
        let asset = world.deploy_token("Mock Stablecoin", "USDC", 6);
        let vault = world.deploy_vault("Vault", "V", asset, Address::from_low_u64_be(1));
        let alice = world.handle(wallet(2));
        alice.mint(asset, alice.address(), 10.into()).await.unwrap();

        let err = alice.deposit(vault, 10.into(), alice.address()).await.unwrap_err();
        assert!(err.to_string().contains("Allowance"));
    }

    #[tokio::test]
    async fn redeem_blocked_until_checks_disabled() {
        let world = MemoryWorld::new();
        let asset = world.deploy_token("Mock Stablecoin", "USDC", 6);
        let vault = world.deploy_vault("Vault", "V", asset, Address::from_low_u64_be(1));
        let alice = world.handle(wallet(2));
        alice.mint(asset, alice.address(), 100.into()).await.unwrap();
        alice.approve(asset, vault, 100.into()).await.unwrap();
        alice.deposit(vault, 100.into(), alice.address()).await.unwrap();
        alice.mint(asset, vault, 110.into()).await.unwrap();

        assert!(alice.redeem(vault, 100.into(), alice.address()).await.is_err());

        alice.toggle_window_check(vault, false).await.unwrap();
        alice.toggle_maturity_check(vault, false).await.unwrap();
        assert_eq!(alice.preview_redeem(vault, 100.into()).await.unwrap(), U256::from(110));
        alice.redeem(vault, 100.into(), alice.address()).await.unwrap();
        assert_eq!(world.balance(asset, alice.address()), U256::from(110));
    }

    #[tokio::test]
    async fn upside_deposit_pulls_collateral() {
        let world = MemoryWorld::new();
        let asset = world.deploy_token("Mock Stablecoin", "USDC", 6);
        let cbl = world.deploy_token("Mock Token", "CBL", 18);
        let custodian = Address::from_low_u64_be(1);
        let vault = world.deploy_upside_vault("Upside", "UP", asset, custodian, cbl, 200);
        let alice = world.handle(wallet(2));
        alice.mint(asset, alice.address(), 100.into()).await.unwrap();
        alice.mint(cbl, alice.address(), 200.into()).await.unwrap();
        alice.approve(asset, vault, 100.into()).await.unwrap();
        alice.approve(cbl, vault, 200.into()).await.unwrap();

        alice.deposit(vault, 100.into(), alice.address()).await.unwrap();
        assert_eq!(world.balance(cbl, vault), U256::from(200));
        assert_eq!(world.balance(cbl, alice.address()), U256::zero());
    }

    #[tokio::test]
    async fn failed_upside_deposit_leaves_collateral_in_place() {
        let world = MemoryWorld::new();
        let asset = world.deploy_token("Mock Stablecoin", "USDC", 6);
        let cbl = world.deploy_token("Mock Token", "CBL", 18);
        let custodian = Address::from_low_u64_be(1);
        let vault = world.deploy_upside_vault("Upside", "UP", asset, custodian, cbl, 200);
        let alice = world.handle(wallet(2));
        alice.mint(cbl, alice.address(), 200.into()).await.unwrap();
        alice.approve(cbl, vault, 200.into()).await.unwrap();
        // Asset approved but never minted.
        alice.approve(asset, vault, 100.into()).await.unwrap();

        let err = alice.deposit(vault, 100.into(), alice.address()).await.unwrap_err();
        assert!(err.to_string().contains("ERC20InsufficientBalance"));
        assert_eq!(world.balance(cbl, alice.address()), U256::from(200));
        assert_eq!(world.balance(cbl, vault), U256::zero());
        assert_eq!(world.balance(vault, alice.address()), U256::zero());

        // The untouched allowances still cover a retry once funded.
        alice.mint(asset, alice.address(), 100.into()).await.unwrap();
        alice.deposit(vault, 100.into(), alice.address()).await.unwrap();
        assert_eq!(world.balance(cbl, vault), U256::from(200));
    }

    #[tokio::test]
    async fn factory_records_allowed_custodians() {
        let world = MemoryWorld::new();
        let factory = world.deploy_factory();
        let admin = world.handle(wallet(1));
        let custodian = Address::from_low_u64_be(0xCC);

        assert!(!world.is_custodian_allowed(factory, custodian));
        admin.allow_custodian(factory, custodian).await.unwrap();
        assert!(world.is_custodian_allowed(factory, custodian));
        assert_eq!(world.calls().len(), 1);
    }
}
