//! # Vault Creation
//!
//! Creates a vault through the vault API after granting the custodian on
//! the matching factory. Steps run strictly in order and the first failure
//! ends the run: there is no retry and no rollback, and running twice
//! creates two vaults.
//!
//! ```text
//! validate ─► registry lookup ─► resolve custodian ─► allowCustodian
//!          ─► admin sign-in ─► POST create-vault[-upside]
//!          ─► (matured) toggleWindowCheck(false)
//! ```

use chrono::{DateTime, Utc};
use credbull_sdk::api::types::DataEnvelope;
use credbull_sdk::api::{auth, ApiClient, VaultRecord};
use credbull_sdk::chain::VaultChain;
use credbull_sdk::config::{
    CONTRACT_FIXED_YIELD_FACTORY, CONTRACT_MOCK_STABLECOIN, CONTRACT_MOCK_TOKEN,
    CONTRACT_UPSIDE_FACTORY, CONTRACT_WHITELIST_PROVIDER, ROUTE_CREATE_VAULT,
    ROUTE_CREATE_VAULT_UPSIDE,
};
use ethers::types::Address;
use tracing::{debug, info, warn};

use crate::config::{required, Config};
use crate::error::{OpsError, OpsResult};
use crate::params::{self, VaultOverrides, VaultPolicy};
use crate::schema::{self, parse_address, parse_email, Schema};
use crate::supabase::SupabaseAdmin;

/// What `create-vault` needs from the configuration.
pub fn schema() -> Schema {
    schema::api()
        .merge(schema::evm_rpc())
        .merge(schema::evm_addresses())
        .merge(schema::supabase_admin())
        .merge(schema::admin_user())
        .merge(schema::create_vault_policy())
}

/// Caller choices for one creation.
#[derive(Clone, Debug, Default)]
pub struct CreateVaultOptions {
    /// Backdate the windows and disable the window check after creation.
    pub matured: bool,
    /// Address of the fixed-yield vault an upside vault is built on.
    pub upside: Option<String>,
    /// Email of the tenant the vault belongs to.
    pub tenant: Option<String>,
}

/// Creates vaults as the configured admin.
pub struct VaultCreator<'a, C> {
    config: &'a Config,
    api: ApiClient,
    supabase: SupabaseAdmin,
    admin: C,
}

impl<'a, C: VaultChain> VaultCreator<'a, C> {
    /// `admin` must sign as the factory owner.
    pub fn new(config: &'a Config, api: ApiClient, supabase: SupabaseAdmin, admin: C) -> Self {
        Self {
            config,
            api,
            supabase,
            admin,
        }
    }

    /// Runs the creation at the current time.
    pub async fn create(&self, options: &CreateVaultOptions) -> OpsResult<VaultRecord> {
        self.create_at(options, Utc::now()).await
    }

    /// Runs the creation with windows computed from `now`.
    pub async fn create_at(
        &self,
        options: &CreateVaultOptions,
        now: DateTime<Utc>,
    ) -> OpsResult<VaultRecord> {
        self.config.validate(&schema())?;
        let upside = options.upside.as_deref().map(parse_address).transpose()?;
        let tenant = options.tenant.as_deref().map(parse_email).transpose()?;

        let chain_id = self.admin.chain_id();
        let factory_name = if upside.is_some() {
            CONTRACT_UPSIDE_FACTORY
        } else {
            CONTRACT_FIXED_YIELD_FACTORY
        };
        let registry = self
            .supabase
            .contract_addresses(
                chain_id,
                &[
                    factory_name,
                    CONTRACT_WHITELIST_PROVIDER,
                    CONTRACT_MOCK_STABLECOIN,
                    CONTRACT_MOCK_TOKEN,
                ],
            )
            .await?;
        let factory = registry.get(factory_name)?;
        let kyc_provider = registry.get(CONTRACT_WHITELIST_PROVIDER)?;
        let asset = registry.get(CONTRACT_MOCK_STABLECOIN)?;
        let token = match upside {
            Some(_) => Some(registry.get(CONTRACT_MOCK_TOKEN)?),
            None => None,
        };

        let asset_decimals = self.admin.token_info(asset).await?.decimals;
        let policy = VaultPolicy::from_config(self.config, asset_decimals)?;
        let custodian = self.resolve_custodian(&policy, upside).await?;

        let tx = self.admin.allow_custodian(factory, custodian).await?;
        info!(factory = ?factory, custodian = ?custodian, tx = ?tx, "custodian allowed");

        let blueprint = params::build(
            &policy,
            &VaultOverrides {
                custodian: Some(custodian),
                kyc_provider: Some(kyc_provider),
                asset: Some(asset),
                token,
                matured: options.matured,
                upside_vault: upside,
                tenant: tenant.map(str::to_string),
            },
            now,
        );

        let admin = &self.config.users.admin;
        let session = auth::login(
            &self.api,
            required(admin.email_address.as_deref(), "users.admin.email_address")?,
            required(admin.password.as_deref(), "users.admin.password")?,
        )
        .await?;

        let route = if blueprint.is_upside() {
            ROUTE_CREATE_VAULT_UPSIDE
        } else {
            ROUTE_CREATE_VAULT
        };
        debug!(route, kind = %blueprint.kind, "submitting vault");
        let created: DataEnvelope<VaultRecord> = auth::authorized(&self.api, &session)
            .post(route, &blueprint.request())
            .await?;

        if created.data.len() > 1 {
            warn!(
                count = created.data.len(),
                "vault creation returned more than one record, using the first"
            );
        }
        let vault = created
            .data
            .into_iter()
            .next()
            .ok_or(OpsError::EmptyCreateResponse)?;
        info!(id = vault.id, address = ?vault.address, kind = %vault.kind, "vault created");

        if options.matured {
            let tx = self.admin.toggle_window_check(vault.address, false).await?;
            info!(vault = ?vault.address, tx = ?tx, "window check disabled for matured vault");
        }

        Ok(vault)
    }

    /// The configured custodian, or the one recorded for the referenced
    /// vault when building an upside vault.
    async fn resolve_custodian(
        &self,
        policy: &VaultPolicy,
        upside: Option<Address>,
    ) -> OpsResult<Address> {
        match upside {
            Some(vault) => {
                let custodian = self.supabase.vault_custodian(vault).await?;
                debug!(
                    vault = ?vault,
                    custodian = ?custodian,
                    "custodian taken from referenced vault"
                );
                Ok(custodian)
            }
            None => Ok(policy.custodian),
        }
    }
}
