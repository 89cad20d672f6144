//! [`VaultChain`] over an `ethers` signer middleware.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Detokenize;
use ethers::contract::ContractCall;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256, U64};

use super::bindings::{CredbullVault, Erc20Token, UpsideVault, VaultFactory};
use super::{ChainError, ChainResult, TokenInfo, VaultChain, VaultInfo};

/// The concrete middleware stack: HTTP provider plus a local signing key.
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// A signer connected to an RPC endpoint.
///
/// Construction does not touch the network. An unreachable endpoint shows
/// up as a [`ChainError::Call`] on the first request.
#[derive(Debug, Clone)]
pub struct EthersChain {
    client: Arc<SignerClient>,
    wallet: LocalWallet,
}

impl EthersChain {
    /// Builds a signer for `private_key` (hex, `0x` optional) that sends to
    /// `rpc_url` and signs for `chain_id`.
    ///
    /// # Errors
    ///
    /// [`ChainError::InvalidKey`] for a malformed key,
    /// [`ChainError::InvalidEndpoint`] for a malformed URL.
    pub fn connect(private_key: &str, rpc_url: &str, chain_id: u64) -> ChainResult<Self> {
        let wallet = private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?
            .with_chain_id(chain_id);

        let provider =
            Provider::<Http>::try_from(rpc_url).map_err(|e| ChainError::InvalidEndpoint {
                url: rpc_url.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(address = ?wallet.address(), chain_id, "signer connected");

        Ok(Self {
            client: Arc::new(SignerMiddleware::new(provider, wallet.clone())),
            wallet,
        })
    }

    /// The underlying middleware, for calls outside the [`VaultChain`] surface.
    pub fn client(&self) -> Arc<SignerClient> {
        Arc::clone(&self.client)
    }

    fn token(&self, address: Address) -> Erc20Token<SignerClient> {
        Erc20Token::new(address, self.client())
    }

    fn vault(&self, address: Address) -> CredbullVault<SignerClient> {
        CredbullVault::new(address, self.client())
    }
}

/// Sends a contract call and waits for its receipt.
///
/// A receipt with status 0 becomes [`ChainError::Reverted`]; a transaction
/// that never produced a receipt becomes [`ChainError::Dropped`].
async fn confirm<M, D>(label: &str, call: ContractCall<M, D>) -> ChainResult<H256>
where
    M: Middleware + 'static,
    D: Detokenize,
{
    let pending = call.send().await.map_err(|e| ChainError::call(label, e))?;
    let tx_hash = pending.tx_hash();
    tracing::debug!(call = label, ?tx_hash, "transaction submitted");

    let receipt = pending.await.map_err(|e| ChainError::call(label, e))?;
    match receipt {
        Some(receipt) if receipt.status == Some(U64::from(1)) => {
            tracing::debug!(
                call = label,
                ?tx_hash,
                block = ?receipt.block_number,
                "transaction confirmed"
            );
            Ok(receipt.transaction_hash)
        }
        Some(_) => Err(ChainError::Reverted {
            call: label.to_string(),
            tx_hash,
        }),
        None => Err(ChainError::Dropped {
            call: label.to_string(),
            tx_hash,
        }),
    }
}

#[async_trait]
impl VaultChain for EthersChain {
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
        let factory = VaultFactory::new(factory, self.client());
        confirm("allowCustodian", factory.allow_custodian(custodian)).await
    }

    async fn toggle_window_check(&self, vault: Address, enabled: bool) -> ChainResult<H256> {
        confirm(
            "toggleWindowCheck",
            self.vault(vault).toggle_window_check(enabled),
        )
        .await
    }

    async fn toggle_maturity_check(&self, vault: Address, enabled: bool) -> ChainResult<H256> {
        confirm(
            "toggleMaturityCheck",
            self.vault(vault).toggle_maturity_check(enabled),
        )
        .await
    }

    async fn mint(&self, token: Address, to: Address, amount: U256) -> ChainResult<H256> {
        confirm("mint", self.token(token).mint(to, amount)).await
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> ChainResult<H256> {
        confirm("approve", self.token(token).approve(spender, amount)).await
    }

    async fn deposit(&self, vault: Address, assets: U256, receiver: Address) -> ChainResult<H256> {
        confirm("deposit", self.vault(vault).deposit(assets, receiver)).await
    }

    async fn redeem(&self, vault: Address, shares: U256, receiver: Address) -> ChainResult<H256> {
        let owner = self.address();
        confirm("redeem", self.vault(vault).redeem(shares, receiver, owner)).await
    }

    async fn balance_of(&self, token: Address, owner: Address) -> ChainResult<U256> {
        self.token(token)
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| ChainError::call("balanceOf", e))
    }

    async fn preview_redeem(&self, vault: Address, shares: U256) -> ChainResult<U256> {
        self.vault(vault)
            .preview_redeem(shares)
            .call()
            .await
            .map_err(|e| ChainError::call("previewRedeem", e))
    }

    async fn vault_asset(&self, vault: Address) -> ChainResult<Address> {
        self.vault(vault)
            .asset()
            .call()
            .await
            .map_err(|e| ChainError::call("asset", e))
    }

    async fn upside_token(&self, vault: Address) -> ChainResult<Address> {
        UpsideVault::new(vault, self.client())
            .token()
            .call()
            .await
            .map_err(|e| ChainError::call("token", e))
    }

    async fn vault_custodian(&self, vault: Address) -> ChainResult<Address> {
        self.vault(vault)
            .custodian()
            .call()
            .await
            .map_err(|e| ChainError::call("CUSTODIAN", e))
    }

    async fn token_info(&self, token: Address) -> ChainResult<TokenInfo> {
        let contract = self.token(token);
        Ok(TokenInfo {
            address: token,
            name: contract
                .name()
                .call()
                .await
                .map_err(|e| ChainError::call("name", e))?,
            symbol: contract
                .symbol()
                .call()
                .await
                .map_err(|e| ChainError::call("symbol", e))?,
            decimals: contract
                .decimals()
                .call()
                .await
                .map_err(|e| ChainError::call("decimals", e))?,
            total_supply: contract
                .total_supply()
                .call()
                .await
                .map_err(|e| ChainError::call("totalSupply", e))?,
        })
    }

    async fn vault_info(&self, vault: Address) -> ChainResult<VaultInfo> {
        let shares = self.token_info(vault).await?;
        let contract = self.vault(vault);
        Ok(VaultInfo {
            shares,
            asset: contract
                .asset()
                .call()
                .await
                .map_err(|e| ChainError::call("asset", e))?,
            total_assets: contract
                .total_assets()
                .call()
                .await
                .map_err(|e| ChainError::call("totalAssets", e))?,
            paused: contract
                .paused()
                .call()
                .await
                .map_err(|e| ChainError::call("paused", e))?,
            check_maturity: contract
                .check_maturity()
                .call()
                .await
                .map_err(|e| ChainError::call("checkMaturity", e))?,
        })
    }
}
