//! The per-user SDK wrapper.
//!
//! A [`CredbullSdk`] pairs an API session with a signer. It links the
//! signer's wallet to the account, lists the vaults the account can see, and
//! passes deposits and redemptions straight through to the vault contract.

use ethers::types::{Address, H256, U256};
use reqwest::Url;
use thiserror::Error;

use crate::api::types::{DataEnvelope, LinkWalletRequest, LinkedWallet, Session, VaultRecord};
use crate::api::{auth, ApiClient, ApiError};
use crate::chain::{ChainError, VaultChain};
use crate::config::{ROUTE_CURRENT_VAULTS, ROUTE_LINK_WALLET};
use crate::siwe::SiweMessage;

/// Errors surfaced by [`CredbullSdk`].
#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("invalid application url {url}: {reason}")]
    InvalidAppUrl { url: String, reason: String },
}

/// A signed-in user with a wallet.
pub struct CredbullSdk<C> {
    api: ApiClient,
    session: Session,
    chain: C,
    app_url: Url,
}

impl<C: VaultChain> CredbullSdk<C> {
    /// Wraps an existing session.
    ///
    /// `app_url` is the web application the SIWE message is issued for.
    pub fn new(
        api: &ApiClient,
        session: Session,
        chain: C,
        app_url: &str,
    ) -> Result<Self, SdkError> {
        let app_url = Url::parse(app_url).map_err(|e| SdkError::InvalidAppUrl {
            url: app_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            api: auth::authorized(api, &session),
            session,
            chain,
            app_url,
        })
    }

    /// Signs in and wraps the resulting session.
    pub async fn login(
        api: &ApiClient,
        email: &str,
        password: &str,
        chain: C,
        app_url: &str,
    ) -> Result<Self, SdkError> {
        let session = auth::login(api, email, password).await?;
        Self::new(api, session, chain, app_url)
    }

    /// The session this SDK authenticates with.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The signer behind this SDK.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// The signer's address.
    pub fn address(&self) -> Address {
        self.chain.address()
    }

    /// Proves ownership of the signer's wallet to the API with a SIWE
    /// message. Required once before the first deposit.
    pub async fn link_wallet(
        &self,
        discriminator: Option<&str>,
    ) -> Result<LinkedWallet, SdkError> {
        let message =
            SiweMessage::new(&self.app_url, self.address(), self.chain.chain_id()).to_string();
        let signature = self.chain.sign_message(&message).await?;

        let linked: LinkedWallet = self
            .api
            .post(
                ROUTE_LINK_WALLET,
                &LinkWalletRequest {
                    message: &message,
                    signature: &signature,
                    discriminator,
                },
            )
            .await?;

        tracing::info!(address = ?linked.address, user_id = %linked.user_id, "wallet linked");
        Ok(linked)
    }

    /// Vaults currently available to this account.
    pub async fn get_all_vaults(&self) -> Result<Vec<VaultRecord>, SdkError> {
        let envelope: DataEnvelope<VaultRecord> = self.api.get(ROUTE_CURRENT_VAULTS, &[]).await?;
        Ok(envelope.data)
    }

    /// Deposits `amount` of the vault's asset for `receiver`.
    pub async fn deposit(
        &self,
        vault: Address,
        amount: U256,
        receiver: Address,
    ) -> Result<H256, SdkError> {
        Ok(self.chain.deposit(vault, amount, receiver).await?)
    }

    /// Redeems `shares` owned by the signer, paying `receiver`.
    pub async fn redeem(
        &self,
        vault: Address,
        shares: U256,
        receiver: Address,
    ) -> Result<H256, SdkError> {
        Ok(self.chain.redeem(vault, shares, receiver).await?)
    }

    /// The vault's underlying asset.
    pub async fn get_asset(&self, vault: Address) -> Result<Address, SdkError> {
        Ok(self.chain.vault_asset(vault).await?)
    }

    /// Vault shares held by `owner`.
    pub async fn shares_of(&self, vault: Address, owner: Address) -> Result<U256, SdkError> {
        Ok(self.chain.balance_of(vault, owner).await?)
    }
}
