//! Supabase admin access: the contract address registry, vault entity
//! lookups and user provisioning.
//!
//! All calls use the service-role key, sent both as `apikey` and as the
//! bearer token, which is what the Supabase REST and GoTrue admin routes
//! expect.

use std::collections::HashMap;

use credbull_sdk::api::{ApiClient, ApiResult};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{OpsError, OpsResult};

const ROUTE_CONTRACTS: &str = "rest/v1/contracts_addresses";
const ROUTE_VAULTS: &str = "rest/v1/vaults";
const ROUTE_ADMIN_USERS: &str = "auth/v1/admin/users";

/// A row of the contract registry.
#[derive(Clone, Debug, Deserialize)]
pub struct ContractAddress {
    pub contract_name: String,
    pub address: Address,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct VaultRow {
    #[serde(default)]
    vault_entities: Vec<EntityRow>,
}

#[derive(Debug, Deserialize)]
struct EntityRow {
    #[serde(rename = "type")]
    kind: String,
    address: Address,
}

#[derive(Debug, Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    email_confirm: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_metadata: Option<UserMetadata<'a>>,
}

#[derive(Debug, Serialize)]
struct UserMetadata<'a> {
    channel: &'a str,
}

/// A user created through the admin API.
#[derive(Clone, Debug, Deserialize)]
pub struct CreatedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Name-to-address map of the contracts deployed on one chain.
#[derive(Clone, Debug, Default)]
pub struct ContractRegistry {
    chain_id: u64,
    addresses: HashMap<String, Address>,
}

impl ContractRegistry {
    /// Address of `name`, or [`OpsError::MissingContract`].
    pub fn get(&self, name: &str) -> OpsResult<Address> {
        self.addresses
            .get(name)
            .copied()
            .ok_or_else(|| OpsError::MissingContract {
                name: name.to_string(),
                chain_id: self.chain_id,
            })
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Service-role client for a Supabase project.
#[derive(Clone, Debug)]
pub struct SupabaseAdmin {
    client: ApiClient,
}

impl SupabaseAdmin {
    pub fn new(url: &str, service_role_key: &str) -> ApiResult<Self> {
        let client = ApiClient::new(url)?
            .with_header("apikey", service_role_key)
            .with_bearer(service_role_key);
        Ok(Self { client })
    }

    /// Looks up the deployed addresses of `names` on `chain_id`.
    ///
    /// Names absent from the registry are simply missing from the result;
    /// [`ContractRegistry::get`] reports them.
    pub async fn contract_addresses(
        &self,
        chain_id: u64,
        names: &[&str],
    ) -> OpsResult<ContractRegistry> {
        let chain_filter = format!("eq.{chain_id}");
        let name_filter = format!("in.({})", names.join(","));
        let rows: Vec<ContractAddress> = self
            .client
            .get(
                ROUTE_CONTRACTS,
                &[
                    ("select", "contract_name,address,chain_id"),
                    ("chain_id", chain_filter.as_str()),
                    ("contract_name", name_filter.as_str()),
                ],
            )
            .await?;

        tracing::debug!(
            chain_id,
            found = rows.len(),
            requested = names.len(),
            "contract addresses"
        );
        Ok(ContractRegistry {
            chain_id,
            addresses: rows
                .into_iter()
                .map(|row| (row.contract_name, row.address))
                .collect(),
        })
    }

    /// The custodian entity recorded for `vault`.
    pub async fn vault_custodian(&self, vault: Address) -> OpsResult<Address> {
        let address_filter = address_filter(vault);
        let rows: Vec<VaultRow> = self
            .client
            .get(
                ROUTE_VAULTS,
                &[
                    ("select", "address,vault_entities(type,address)"),
                    ("address", address_filter.as_str()),
                ],
            )
            .await?;

        rows.into_iter()
            .flat_map(|row| row.vault_entities)
            .find(|entity| entity.kind == "custodian")
            .map(|entity| entity.address)
            .ok_or(OpsError::UnknownCustodian { vault })
    }

    /// Creates a user whose email is already confirmed.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        channel: Option<&str>,
    ) -> OpsResult<CreatedUser> {
        let user: CreatedUser = self
            .client
            .post(
                ROUTE_ADMIN_USERS,
                &CreateUserRequest {
                    email,
                    password,
                    email_confirm: true,
                    user_metadata: channel.map(|channel| UserMetadata { channel }),
                },
            )
            .await?;
        Ok(user)
    }
}

/// PostgREST filter matching `vault` whatever case the row was stored in.
/// Hex addresses hold no `%` or `_`, so `ilike` acts as a case-insensitive
/// equality.
fn address_filter(vault: Address) -> String {
    format!("ilike.{vault:?}")
}
