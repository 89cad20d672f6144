//! User provisioning and address whitelisting.

use credbull_sdk::api::types::{WhitelistRequest, WhitelistResponse};
use credbull_sdk::api::{auth, ApiClient, Session};
use credbull_sdk::config::ROUTE_WHITELIST;
use ethers::types::Address;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::info;

use crate::error::OpsResult;
use crate::schema::{self, parse_email, Schema};
use crate::supabase::{CreatedUser, SupabaseAdmin};

/// Length of generated passwords.
pub const GENERATED_PASSWORD_LEN: usize = 24;

/// What `create-user` needs from the configuration.
pub fn create_user_schema() -> Schema {
    schema::supabase_admin()
}

/// What `whitelist` needs from the configuration.
pub fn whitelist_schema() -> Schema {
    schema::api().merge(schema::admin_user())
}

/// A freshly provisioned user and the password it was created with.
#[derive(Clone, Debug)]
pub struct ProvisionedUser {
    pub user: CreatedUser,
    pub password: String,
}

/// A random alphanumeric password.
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Creates a confirmed user. A password is generated when none is given.
pub async fn create_user(
    supabase: &SupabaseAdmin,
    email: &str,
    password: Option<&str>,
    channel: Option<&str>,
) -> OpsResult<ProvisionedUser> {
    let email = parse_email(email)?;
    let password = password.map_or_else(generate_password, str::to_string);

    let user = supabase.create_user(email, &password, channel).await?;
    info!(id = %user.id, %email, channel = channel.unwrap_or("-"), "user created");
    Ok(ProvisionedUser { user, password })
}

/// Whitelists `address` for `user_id` as the admin.
pub async fn whitelist(
    api: &ApiClient,
    admin: &Session,
    address: Address,
    user_id: &str,
) -> OpsResult<WhitelistResponse> {
    let response: WhitelistResponse = auth::authorized(api, admin)
        .post(ROUTE_WHITELIST, &WhitelistRequest { address, user_id })
        .await?;
    info!(
        address = ?address,
        %user_id,
        tx = response.tx_hash.as_deref().unwrap_or("-"),
        "address whitelisted"
    );
    Ok(response)
}
