//! Shared fixtures for the ops integration suites: a fake Credbull API and
//! Supabase project served by axum on an ephemeral port, backed by an
//! in-memory chain the test can inspect.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Signature};
use ethers::utils::to_checksum;
use parking_lot::Mutex;
use serde_json::{json, Value};

use credbull_ops::config::Config;
use credbull_sdk::chain::memory::{MemoryChain, MemoryWorld};

pub const CHAIN_ID: u64 = 31_337;
pub const ADMIN_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ALICE_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const BOB_KEY: &str = "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";
pub const PASSWORD: &str = "correct-horse";
pub const SERVICE_KEY: &str = "service-role-key";
pub const DEFAULT_CUSTODIAN: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

pub fn wallet(key: &str) -> LocalWallet {
    key.parse::<LocalWallet>().unwrap().with_chain_id(CHAIN_ID)
}

pub fn default_custodian() -> Address {
    DEFAULT_CUSTODIAN.parse().unwrap()
}

// ---------------------------------------------------------------------------
// Fake Server State
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeState {
    pub world: MemoryWorld,
    /// Contract registry rows as `(contract_name, address)`.
    pub contracts: Vec<(String, Address)>,
    /// Rows served by `vaults/current`.
    pub vaults: Vec<Value>,
    /// `(stored address text, custodian)` per vault, as Supabase would
    /// join it. The text is matched the way PostgREST filters compare it.
    pub custodians: Vec<(String, Address)>,
    /// `(route, authorization header, body)` of every create call.
    pub created: Vec<(String, String, Value)>,
    /// Extra copies of the created record to return.
    pub extra_records: usize,
    /// Answer create calls with `{ data: [] }`.
    pub empty_create: bool,
    pub users: Vec<Value>,
    pub whitelisted: Vec<Value>,
    pub linked: Vec<Address>,
    pub next_id: i64,
}

pub type Shared = Arc<Mutex<FakeState>>;

type Reply = (StatusCode, Json<Value>);

fn reject(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "message": message })))
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn user_token(headers: &HeaderMap) -> bool {
    bearer(headers).map(|t| t.starts_with("token-")).unwrap_or(false)
}

fn service_role(headers: &HeaderMap) -> bool {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    apikey == Some(SERVICE_KEY) && bearer(headers).as_deref() == Some(SERVICE_KEY)
}

// ---------------------------------------------------------------------------
// Credbull API
// ---------------------------------------------------------------------------

async fn sign_in(Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default();
    if body["password"] != PASSWORD {
        return reject(StatusCode::BAD_REQUEST, "Invalid login credentials");
    }
    let user_id = email.split('@').next().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({ "access_token": format!("token-{email}"), "user_id": user_id })),
    )
}

async fn link_wallet(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if !user_token(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let message = body["message"].as_str().unwrap_or_default().to_string();
    let Ok(signature) = body["signature"].as_str().unwrap_or_default().parse::<Signature>() else {
        return reject(StatusCode::BAD_REQUEST, "bad signature");
    };
    let Ok(address) = signature.recover(message) else {
        return reject(StatusCode::BAD_REQUEST, "unrecoverable signature");
    };
    state.lock().linked.push(address);
    (
        StatusCode::OK,
        Json(json!({
            "address": address,
            "user_id": bearer(&headers).unwrap_or_default(),
            "discriminator": body.get("discriminator").cloned().unwrap_or(Value::Null),
        })),
    )
}

async fn current_vaults(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if !user_token(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    (StatusCode::OK, Json(json!({ "data": state.lock().vaults.clone() })))
}

fn address_at(value: &Value) -> Option<Address> {
    value.as_str()?.parse().ok()
}

fn create(state: &Shared, route: &str, headers: &HeaderMap, body: Value, upside: bool) -> Reply {
    if !user_token(headers) {
        return reject(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut state = state.lock();
    state.created.push((
        route.to_string(),
        bearer(headers).unwrap_or_default(),
        body.clone(),
    ));
    if state.empty_create {
        return (StatusCode::OK, Json(json!({ "data": [] })));
    }

    let params = if upside { &body["fixedYieldVault"] } else { &body };
    let vault_params = &params["maturityVault"]["vault"];
    let (Some(asset), Some(custodian)) = (
        address_at(&vault_params["asset"]),
        address_at(&vault_params["custodian"]),
    ) else {
        return reject(StatusCode::BAD_REQUEST, "asset and custodian are required");
    };
    let name = vault_params["shareName"].as_str().unwrap_or_default();
    let symbol = vault_params["shareSymbol"].as_str().unwrap_or_default();

    let vault = if upside {
        let Some(token) = address_at(&body["cblToken"]) else {
            return reject(StatusCode::BAD_REQUEST, "cblToken is required");
        };
        let percentage = body["collateralPercentage"].as_u64().unwrap_or(0) as u32;
        state
            .world
            .deploy_upside_vault(name, symbol, asset, custodian, token, percentage)
    } else {
        state.world.deploy_vault(name, symbol, asset, custodian)
    };
    state.custodians.push((format!("{vault:?}"), custodian));

    state.next_id += 1;
    let record = json!({
        "id": state.next_id,
        "type": body["type"],
        "status": "created",
        "address": vault,
        "asset_address": asset,
        "tenant": body.get("tenant").cloned().unwrap_or(Value::Null),
        "deposits_opened_at": body["deposits_opened_at"],
        "deposits_closed_at": body["deposits_closed_at"],
        "redemptions_opened_at": body["redemptions_opened_at"],
        "redemptions_closed_at": body["redemptions_closed_at"],
    });
    state.vaults.push(record.clone());

    let mut data = vec![record.clone()];
    data.extend(std::iter::repeat(record).take(state.extra_records));
    (StatusCode::OK, Json(json!({ "data": data })))
}

async fn create_vault(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    create(&state, "vaults/create-vault", &headers, body, false)
}

async fn create_vault_upside(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    create(&state, "vaults/create-vault-upside", &headers, body, true)
}

async fn whitelist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if bearer(&headers).as_deref() != Some("token-admin@credbull.io") {
        return reject(StatusCode::FORBIDDEN, "admin only");
    }
    state.lock().whitelisted.push(body);
    (StatusCode::OK, Json(json!({ "status": 201, "tx_hash": "0xabc" })))
}

// ---------------------------------------------------------------------------
// Supabase
// ---------------------------------------------------------------------------

async fn contracts_addresses(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    if !service_role(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    let rows: Vec<Value> = state
        .lock()
        .contracts
        .iter()
        .map(|(name, address)| {
            json!({ "contract_name": name, "address": address, "chain_id": CHAIN_ID })
        })
        .collect();
    (StatusCode::OK, Json(Value::Array(rows)))
}

async fn vaults_table(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    if !service_role(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    let filter = query.get("address").and_then(|f| f.split_once('.'));
    let state = state.lock();
    let rows: Vec<Value> = state
        .custodians
        .iter()
        .filter(|(stored, _)| match filter {
            Some(("eq", wanted)) => stored == wanted,
            Some(("ilike", wanted)) => stored.eq_ignore_ascii_case(wanted),
            _ => false,
        })
        .map(|(stored, custodian)| {
            json!({
                "address": stored,
                "vault_entities": [
                    { "type": "treasury", "address": Address::from_low_u64_be(4) },
                    { "type": "custodian", "address": custodian },
                ]
            })
        })
        .collect();
    (StatusCode::OK, Json(Value::Array(rows)))
}

async fn admin_users(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if !service_role(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "Invalid API key");
    }
    let mut state = state.lock();
    if state.users.iter().any(|u| u["email"] == body["email"]) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "msg": "A user with this email address has already been registered" })),
        );
    }
    let id = format!("user-{}", state.users.len() + 1);
    state.users.push(body.clone());
    (StatusCode::OK, Json(json!({ "id": id, "email": body["email"] })))
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A running fake backend plus the deployed mock contracts.
pub struct Harness {
    pub url: String,
    pub state: Shared,
    pub world: MemoryWorld,
    pub asset: Address,
    pub token: Address,
    pub fixed_factory: Address,
    pub upside_factory: Address,
    pub kyc_provider: Address,
}

impl Harness {
    pub async fn start() -> Self {
        let world = MemoryWorld::new();
        let asset = world.deploy_token("Mock Stablecoin", "USDC", 6);
        let token = world.deploy_token("Mock Token", "CBL", 6);
        let fixed_factory = world.deploy_factory();
        let upside_factory = world.deploy_factory();
        let kyc_provider = Address::from_low_u64_be(0x4B5C);

        let state: Shared = Arc::new(Mutex::new(FakeState {
            world: world.clone(),
            contracts: vec![
                ("CredbullFixedYieldVaultFactory".into(), fixed_factory),
                ("CredbullUpsideVaultFactory".into(), upside_factory),
                ("CredbullWhiteListProvider".into(), kyc_provider),
                ("MockStablecoin".into(), asset),
                ("MockToken".into(), token),
            ],
            ..FakeState::default()
        }));

        let router = Router::new()
            .route("/auth/api/sign-in", post(sign_in))
            .route("/accounts/link-wallet", post(link_wallet))
            .route("/accounts/whitelist", post(whitelist))
            .route("/vaults/current", get(current_vaults))
            .route("/vaults/create-vault", post(create_vault))
            .route("/vaults/create-vault-upside", post(create_vault_upside))
            .route("/rest/v1/contracts_addresses", get(contracts_addresses))
            .route("/rest/v1/vaults", get(vaults_table))
            .route("/auth/v1/admin/users", post(admin_users))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
            world,
            asset,
            token,
            fixed_factory,
            upside_factory,
            kyc_provider,
        }
    }

    pub fn admin(&self) -> MemoryChain {
        self.world.handle(wallet(ADMIN_KEY))
    }

    pub fn handle(&self, key: &str) -> MemoryChain {
        self.world.handle(wallet(key))
    }

    /// A complete configuration pointing at this harness, with secrets
    /// supplied through the environment overlay.
    pub fn config(&self) -> Config {
        let toml = format!(
            r#"
[api]
url = "{url}"

[app]
url = "http://localhost:3000"

[evm]
url = "http://127.0.0.1:8545"
chain_id = {CHAIN_ID}

[evm.address]
owner = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
operator = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc"
custodian = "{DEFAULT_CUSTODIAN}"
treasury = "0x90f79bf6eb2c4f870365e785982e1f101e93b906"
activity_reward = "0x15d34aaf54267db7d7c367839aaf71a00a2c6a65"

[services.supabase]
url = "{url}"

[users.admin]
email_address = "admin@credbull.io"

[users.alice]
email_address = "alice@credbull.io"

[users.bob]
email_address = "bob@credbull.io"

[operation.create_vault]
promised_yield = 10
collateral_percentage = 200
max_cap = 1000000
deposit_threshold = 1000
"#,
            url = self.url,
        );
        Config::from_toml_str(&toml, secrets).unwrap()
    }

    /// Adds a vault the API lists, with its custodian recorded.
    pub fn seed_vault(&self, kind: &str, vault: Address, custodian: Address) {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.vaults.push(json!({
            "id": id,
            "type": kind,
            "status": "ready",
            "address": vault,
        }));
        state.custodians.push((to_checksum(&vault, None), custodian));
    }
}

fn secrets(key: &str) -> Option<String> {
    let value = match key {
        "ADMIN_PASSWORD" | "ALICE_PASSWORD" | "BOB_PASSWORD" => PASSWORD,
        "ADMIN_PRIVATE_KEY" => ADMIN_KEY,
        "ALICE_PRIVATE_KEY" => ALICE_KEY,
        "BOB_PRIVATE_KEY" => BOB_KEY,
        "OPERATOR_PRIVATE_KEY" => ADMIN_KEY,
        "SUPABASE_SERVICE_ROLE_KEY" => SERVICE_KEY,
        _ => return None,
    };
    Some(value.to_string())
}
