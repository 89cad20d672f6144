//! # Vault Parameter Builder
//!
//! Turns the operator's vault policy plus per-call overrides into the body
//! the vault API expects for `vaults/create-vault` and
//! `vaults/create-vault-upside`. Building is pure: the clock is passed in,
//! nothing is fetched, and unresolved addresses are emitted as empty strings
//! for the caller to fill in before submission.
//!
//! Units are explicit per field. Entity shares are a [`Fraction`] of one;
//! yields and collateral requirements are [`PercentagePoints`].

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, TimeZone, Utc};
use credbull_sdk::api::VaultKind;
use credbull_sdk::config::WINDOW_LENGTH_SECS;
use ethers::types::{Address, U256};
use serde::{Serialize, Serializer};

use credbull_sdk::report::scale_whole;

use crate::config::{required, Config, ConfigError};
use crate::error::{OpsError, OpsResult};
use crate::schema::parse_address;

/// Treasury share of vault yield.
pub const TREASURY_SHARE: Fraction = Fraction(0.8);
/// Activity reward share of vault yield.
pub const ACTIVITY_REWARD_SHARE: Fraction = Fraction(1.0);
/// Share routed to the fixed-yield vault an upside vault is built on.
pub const UPSIDE_VAULT_SHARE: Fraction = Fraction(0.2);

/// Status every newly created vault record starts in.
pub const CREATED_STATUS: &str = "created";

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// A fraction of one: `0.8` is 80%.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Fraction(pub f64);

/// Percentage points: `200` is 200%.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PercentagePoints(pub u32);

/// Serializes an address, or `""` when it is not resolved yet.
fn address_slot<S: Serializer>(value: &Option<Address>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(address) => serializer.serialize_str(&format!("{address:?}")),
        None => serializer.serialize_str(""),
    }
}

/// Raw token amounts travel as decimal strings.
fn amount<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Role an address plays for a vault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Treasury,
    ActivityReward,
    Custodian,
    KycProvider,
    Vault,
}

/// An address attached to a vault at creation time.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VaultEntity {
    #[serde(rename = "type")]
    pub kind: EntityType,
    #[serde(serialize_with = "address_slot")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Fraction>,
}

impl VaultEntity {
    fn new(kind: EntityType, address: Option<Address>, percentage: Option<Fraction>) -> Self {
        Self {
            kind,
            address,
            percentage,
        }
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// The deposit and redemption windows of a vault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub deposit_opens_at: DateTime<Utc>,
    pub deposit_closes_at: DateTime<Utc>,
    pub redemption_opens_at: DateTime<Utc>,
    pub redemption_closes_at: DateTime<Utc>,
}

/// Monday 00:00 UTC of the week containing `now`.
pub fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    Utc.from_utc_datetime(&monday.and_time(NaiveTime::default()))
}

/// 1 January 00:00 UTC of the year containing `now`.
pub fn start_of_year(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive();
    let first = date - Duration::days(i64::from(date.ordinal0()));
    Utc.from_utc_datetime(&first.and_time(NaiveTime::default()))
}

impl Schedule {
    /// Windows for a vault created at `now`.
    ///
    /// Deposits open at the start of the current week. A matured vault opens
    /// one day before the current year began, so both of its windows sit in
    /// the past relative to a redemption run.
    pub fn at(now: DateTime<Utc>, matured: bool) -> Self {
        let window = Duration::seconds(WINDOW_LENGTH_SECS);
        let deposit_opens_at = if matured {
            start_of_year(now) - Duration::days(1)
        } else {
            start_of_week(now)
        };
        let redemption_opens_at = deposit_opens_at
            .checked_add_months(Months::new(12))
            .unwrap_or(deposit_opens_at + Duration::days(365));

        Self {
            deposit_opens_at,
            deposit_closes_at: deposit_opens_at + window,
            redemption_opens_at,
            redemption_closes_at: redemption_opens_at + window,
        }
    }
}

// ---------------------------------------------------------------------------
// Contract Parameters
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultBase {
    #[serde(serialize_with = "address_slot")]
    pub asset: Option<Address>,
    pub share_name: String,
    pub share_symbol: String,
    #[serde(serialize_with = "address_slot")]
    pub custodian: Option<Address>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaturityVaultParams {
    pub vault: VaultBase,
    pub promised_yield: PercentagePoints,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRoles {
    #[serde(serialize_with = "address_slot")]
    pub owner: Option<Address>,
    #[serde(serialize_with = "address_slot")]
    pub operator: Option<Address>,
    #[serde(serialize_with = "address_slot")]
    pub custodian: Option<Address>,
}

/// Unix seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    pub opens_at: i64,
    pub closes_at: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowPluginParams {
    pub deposit_window: Window,
    pub redemption_window: Window,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KycPluginParams {
    #[serde(serialize_with = "address_slot")]
    pub kyc_provider: Option<Address>,
    #[serde(serialize_with = "amount")]
    pub deposit_threshold_amount: U256,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxCapPluginParams {
    #[serde(serialize_with = "amount")]
    pub max_cap: U256,
}

/// Constructor arguments of a fixed-yield vault.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedYieldVaultParams {
    pub maturity_vault: MaturityVaultParams,
    pub roles: ContractRoles,
    pub window_plugin: WindowPluginParams,
    pub kyc_plugin: KycPluginParams,
    pub max_cap_plugin: MaxCapPluginParams,
}

/// Constructor arguments of an upside vault.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsideVaultParams {
    pub fixed_yield_vault: FixedYieldVaultParams,
    #[serde(serialize_with = "address_slot")]
    pub cbl_token: Option<Address>,
    pub collateral_percentage: PercentagePoints,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VaultParams {
    FixedYield(FixedYieldVaultParams),
    Upside(UpsideVaultParams),
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Operator-wide values every created vault shares.
#[derive(Clone, Debug, PartialEq)]
pub struct VaultPolicy {
    pub owner: Address,
    pub operator: Address,
    pub custodian: Address,
    pub treasury: Address,
    pub activity_reward: Address,
    pub promised_yield: PercentagePoints,
    pub collateral_percentage: PercentagePoints,
    /// Raw asset units.
    pub max_cap: U256,
    /// Raw asset units.
    pub deposit_threshold: U256,
    pub share_name: String,
    pub share_symbol: String,
    pub upside_share_name: String,
    pub upside_share_symbol: String,
}

impl VaultPolicy {
    pub const DEFAULT_PROMISED_YIELD: u32 = 10;
    pub const DEFAULT_MAX_CAP: u64 = 1_000_000;
    pub const DEFAULT_DEPOSIT_THRESHOLD: u64 = 1_000;

    /// Reads the policy from a validated configuration. Whole-unit amounts
    /// are scaled by `asset_decimals`.
    pub fn from_config(config: &Config, asset_decimals: u8) -> OpsResult<Self> {
        let address = |value: Option<&String>, path: &'static str| -> Result<Address, ConfigError> {
            let text = required(value.map(String::as_str), path)?;
            parse_address(text).map_err(|_| ConfigError::Missing(path))
        };
        let evm = &config.evm.address;
        let policy = &config.operation.create_vault;
        let scaled = |whole: u64| {
            scale_whole(U256::from(whole), asset_decimals).ok_or(OpsError::AmountOverflow {
                amount: whole,
                decimals: asset_decimals,
            })
        };

        Ok(Self {
            owner: address(evm.owner.as_ref(), "evm.address.owner")?,
            operator: address(evm.operator.as_ref(), "evm.address.operator")?,
            custodian: address(evm.custodian.as_ref(), "evm.address.custodian")?,
            treasury: address(evm.treasury.as_ref(), "evm.address.treasury")?,
            activity_reward: address(evm.activity_reward.as_ref(), "evm.address.activity_reward")?,
            promised_yield: PercentagePoints(
                policy
                    .promised_yield
                    .unwrap_or(Self::DEFAULT_PROMISED_YIELD),
            ),
            collateral_percentage: PercentagePoints(*required(
                policy.collateral_percentage.as_ref(),
                "operation.create_vault.collateral_percentage",
            )?),
            max_cap: scaled(policy.max_cap.unwrap_or(Self::DEFAULT_MAX_CAP))?,
            deposit_threshold: scaled(
                policy
                    .deposit_threshold
                    .unwrap_or(Self::DEFAULT_DEPOSIT_THRESHOLD),
            )?,
            share_name: policy
                .share_name
                .clone()
                .unwrap_or_else(|| "Credbull Fixed Yield Vault".to_string()),
            share_symbol: policy.share_symbol.clone().unwrap_or_else(|| "cFYV".to_string()),
            upside_share_name: policy
                .upside_share_name
                .clone()
                .unwrap_or_else(|| "Credbull Upside Vault".to_string()),
            upside_share_symbol: policy
                .upside_share_symbol
                .clone()
                .unwrap_or_else(|| "cUPV".to_string()),
        })
    }
}

/// Per-call adjustments to the policy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VaultOverrides {
    /// Replaces the policy custodian.
    pub custodian: Option<Address>,
    pub kyc_provider: Option<Address>,
    pub asset: Option<Address>,
    /// Collateral token of an upside vault.
    pub token: Option<Address>,
    /// Backdate the windows so the vault is redeemable immediately.
    pub matured: bool,
    /// Builds an upside vault on top of this fixed-yield vault.
    pub upside_vault: Option<Address>,
    pub tenant: Option<String>,
}

// ---------------------------------------------------------------------------
// Blueprint
// ---------------------------------------------------------------------------

/// Everything the vault API needs to create one vault.
#[derive(Clone, Debug, PartialEq)]
pub struct VaultBlueprint {
    pub kind: VaultKind,
    pub schedule: Schedule,
    pub entities: Vec<VaultEntity>,
    pub params: VaultParams,
    pub tenant: Option<String>,
}

/// The JSON body posted to the create-vault routes.
#[derive(Debug, Serialize)]
pub struct CreateVaultRequest<'a> {
    #[serde(rename = "type")]
    pub kind: VaultKind,
    pub status: &'static str,
    pub deposits_opened_at: DateTime<Utc>,
    pub deposits_closed_at: DateTime<Utc>,
    pub redemptions_opened_at: DateTime<Utc>,
    pub redemptions_closed_at: DateTime<Utc>,
    pub entities: &'a [VaultEntity],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<&'a str>,
    #[serde(flatten)]
    pub params: &'a VaultParams,
}

impl VaultBlueprint {
    pub fn is_upside(&self) -> bool {
        matches!(self.params, VaultParams::Upside(_))
    }

    pub fn request(&self) -> CreateVaultRequest<'_> {
        CreateVaultRequest {
            kind: self.kind,
            status: CREATED_STATUS,
            deposits_opened_at: self.schedule.deposit_opens_at,
            deposits_closed_at: self.schedule.deposit_closes_at,
            redemptions_opened_at: self.schedule.redemption_opens_at,
            redemptions_closed_at: self.schedule.redemption_closes_at,
            entities: &self.entities,
            tenant: self.tenant.as_deref(),
            params: &self.params,
        }
    }
}

/// Assembles the creation request for one vault.
pub fn build(
    policy: &VaultPolicy,
    overrides: &VaultOverrides,
    now: DateTime<Utc>,
) -> VaultBlueprint {
    let schedule = Schedule::at(now, overrides.matured);
    let custodian = overrides.custodian.unwrap_or(policy.custodian);

    let mut entities = vec![
        VaultEntity::new(EntityType::Treasury, Some(policy.treasury), Some(TREASURY_SHARE)),
        VaultEntity::new(
            EntityType::ActivityReward,
            Some(policy.activity_reward),
            Some(ACTIVITY_REWARD_SHARE),
        ),
        VaultEntity::new(EntityType::Custodian, Some(custodian), None),
        VaultEntity::new(EntityType::KycProvider, overrides.kyc_provider, None),
    ];

    let (share_name, share_symbol) = match overrides.upside_vault {
        Some(_) => (&policy.upside_share_name, &policy.upside_share_symbol),
        None => (&policy.share_name, &policy.share_symbol),
    };

    let fixed_yield = FixedYieldVaultParams {
        maturity_vault: MaturityVaultParams {
            vault: VaultBase {
                asset: overrides.asset,
                share_name: share_name.clone(),
                share_symbol: share_symbol.clone(),
                custodian: Some(custodian),
            },
            promised_yield: policy.promised_yield,
        },
        roles: ContractRoles {
            owner: Some(policy.owner),
            operator: Some(policy.operator),
            custodian: Some(custodian),
        },
        window_plugin: WindowPluginParams {
            deposit_window: Window {
                opens_at: schedule.deposit_opens_at.timestamp(),
                closes_at: schedule.deposit_closes_at.timestamp(),
            },
            redemption_window: Window {
                opens_at: schedule.redemption_opens_at.timestamp(),
                closes_at: schedule.redemption_closes_at.timestamp(),
            },
        },
        kyc_plugin: KycPluginParams {
            kyc_provider: overrides.kyc_provider,
            deposit_threshold_amount: policy.deposit_threshold,
        },
        max_cap_plugin: MaxCapPluginParams {
            max_cap: policy.max_cap,
        },
    };

    let (kind, params) = match overrides.upside_vault {
        Some(base_vault) => {
            entities.push(VaultEntity::new(
                EntityType::Vault,
                Some(base_vault),
                Some(UPSIDE_VAULT_SHARE),
            ));
            (
                VaultKind::FixedYieldUpside,
                VaultParams::Upside(UpsideVaultParams {
                    fixed_yield_vault: fixed_yield,
                    cbl_token: overrides.token,
                    collateral_percentage: policy.collateral_percentage,
                }),
            )
        }
        None => (VaultKind::FixedYield, VaultParams::FixedYield(fixed_yield)),
    };

    VaultBlueprint {
        kind,
        schedule,
        entities,
        params,
        tenant: overrides.tenant.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use serde_json::{json, Value};

    fn policy() -> VaultPolicy {
        VaultPolicy {
            owner: Address::from_low_u64_be(1),
            operator: Address::from_low_u64_be(2),
            custodian: Address::from_low_u64_be(3),
            treasury: Address::from_low_u64_be(4),
            activity_reward: Address::from_low_u64_be(5),
            promised_yield: PercentagePoints(10),
            collateral_percentage: PercentagePoints(200),
            max_cap: U256::from(1_000_000_000_000u64),
            deposit_threshold: U256::from(1_000_000_000u64),
            share_name: "Fixed".into(),
            share_symbol: "FY".into(),
            upside_share_name: "Upside".into(),
            upside_share_symbol: "UP".into(),
        }
    }

    fn thursday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 16, 15, 42, 7).unwrap()
    }

    #[test]
    fn windows_last_one_week() {
        for matured in [false, true] {
            let s = Schedule::at(thursday(), matured);
            assert_eq!((s.deposit_closes_at - s.deposit_opens_at).num_seconds(), 604_800);
            assert_eq!((s.redemption_closes_at - s.redemption_opens_at).num_seconds(), 604_800);
        }
    }

    #[test]
    fn unmatured_deposits_open_at_week_start() {
        let s = Schedule::at(thursday(), false);
        assert_eq!(s.deposit_opens_at, Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap());
        assert_eq!(s.deposit_opens_at.weekday(), Weekday::Mon);
        assert_eq!(s.deposit_opens_at, start_of_week(thursday()));
    }

    #[test]
    fn week_start_of_a_monday_is_that_monday() {
        let monday = Utc.with_ymd_and_hms(2024, 5, 13, 0, 0, 0).unwrap();
        assert_eq!(start_of_week(monday), monday);
        let sunday = Utc.with_ymd_and_hms(2024, 5, 19, 23, 59, 59).unwrap();
        assert_eq!(start_of_week(sunday), monday);
    }

    #[test]
    fn matured_deposits_open_before_year_start() {
        let s = Schedule::at(thursday(), true);
        let year_start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(s.deposit_opens_at < year_start);
        assert_eq!(s.deposit_opens_at, Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn redemption_opens_one_calendar_year_later() {
        let s = Schedule::at(thursday(), false);
        assert_eq!(s.redemption_opens_at, Utc.with_ymd_and_hms(2025, 5, 13, 0, 0, 0).unwrap());
    }

    #[test]
    fn fixed_yield_build_has_four_entities() {
        let bp = build(&policy(), &VaultOverrides::default(), thursday());
        assert_eq!(bp.kind, VaultKind::FixedYield);
        assert!(!bp.is_upside());
        let kinds: Vec<_> = bp.entities.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [
                EntityType::Treasury,
                EntityType::ActivityReward,
                EntityType::Custodian,
                EntityType::KycProvider
            ]
        );
        assert_eq!(bp.entities[0].percentage, Some(Fraction(0.8)));
        assert_eq!(bp.entities[1].percentage, Some(Fraction(1.0)));
    }

    #[test]
    fn upside_build_adds_vault_entity() {
        let base = Address::from_low_u64_be(0xBA5E);
        let overrides = VaultOverrides {
            upside_vault: Some(base),
            token: Some(Address::from_low_u64_be(0x70)),
            ..Default::default()
        };
        let bp = build(&policy(), &overrides, thursday());

        assert_eq!(bp.kind, VaultKind::FixedYieldUpside);
        assert_eq!(bp.entities.len(), 5);
        let vault = bp.entities.iter().find(|e| e.kind == EntityType::Vault).unwrap();
        assert_eq!(vault.address, Some(base));
        assert_eq!(vault.percentage, Some(Fraction(0.2)));

        match &bp.params {
            VaultParams::Upside(p) => {
                assert_eq!(p.collateral_percentage, PercentagePoints(200));
                assert_eq!(p.fixed_yield_vault.maturity_vault.vault.share_symbol, "UP");
            }
            other => panic!("expected upside params, got {other:?}"),
        }
    }

    #[test]
    fn custodian_override_flows_everywhere() {
        let custodian = Address::from_low_u64_be(0xC0);
        let overrides = VaultOverrides {
            custodian: Some(custodian),
            ..Default::default()
        };
        let bp = build(&policy(), &overrides, thursday());
        let VaultParams::FixedYield(p) = &bp.params else {
            panic!("expected fixed yield params");
        };
        assert_eq!(p.roles.custodian, Some(custodian));
        assert_eq!(p.maturity_vault.vault.custodian, Some(custodian));
        assert_eq!(bp.entities[2].address, Some(custodian));
    }

    #[test]
    fn request_body_shape() {
        let overrides = VaultOverrides {
            upside_vault: Some(Address::from_low_u64_be(9)),
            tenant: Some("tenant@credbull.io".into()),
            ..Default::default()
        };
        let bp = build(&policy(), &overrides, thursday());
        let body: Value = serde_json::to_value(bp.request()).unwrap();

        assert_eq!(body["type"], "fixed_yield_upside");
        assert_eq!(body["status"], "created");
        assert_eq!(body["tenant"], "tenant@credbull.io");
        assert_eq!(body["deposits_opened_at"], "2024-05-13T00:00:00Z");
        assert_eq!(body["collateralPercentage"], 200);
        // Unresolved addresses are placeholders.
        assert_eq!(body["cblToken"], "");
        assert_eq!(body["fixedYieldVault"]["maturityVault"]["vault"]["asset"], "");
        assert_eq!(body["fixedYieldVault"]["kycPlugin"]["kycProvider"], "");
        assert_eq!(body["fixedYieldVault"]["maxCapPlugin"]["maxCap"], "1000000000000");
        assert_eq!(
            body["fixedYieldVault"]["windowPlugin"]["depositWindow"]["opensAt"],
            json!(1_715_558_400)
        );
        assert_eq!(body["entities"][4]["type"], "vault");
        assert_eq!(body["entities"][4]["percentage"], 0.2);
        assert!(body["entities"][2].get("percentage").is_none());
    }

    #[test]
    fn fixed_yield_body_omits_tenant() {
        let bp = build(&policy(), &VaultOverrides::default(), thursday());
        let body: Value = serde_json::to_value(bp.request()).unwrap();
        assert!(body.get("tenant").is_none());
        assert!(body.get("maturityVault").is_some());
        assert_eq!(body["maturityVault"]["promisedYield"], 10);
    }

    #[test]
    fn policy_from_config_scales_amounts() {
        let toml = r#"
[evm.address]
owner = "0x0000000000000000000000000000000000000001"
operator = "0x0000000000000000000000000000000000000002"
custodian = "0x0000000000000000000000000000000000000003"
treasury = "0x0000000000000000000000000000000000000004"
activity_reward = "0x0000000000000000000000000000000000000005"

[operation.create_vault]
collateral_percentage = 200
max_cap = 5
"#;
        let config = Config::from_toml_str(toml, |_| None).unwrap();
        let policy = VaultPolicy::from_config(&config, 6).unwrap();
        assert_eq!(policy.max_cap, U256::from(5_000_000u64));
        assert_eq!(policy.deposit_threshold, U256::from(1_000_000_000u64));
        assert_eq!(policy.custodian, Address::from_low_u64_be(3));
        assert_eq!(policy.collateral_percentage, PercentagePoints(200));
    }

    #[test]
    fn policy_requires_role_addresses() {
        let err = VaultPolicy::from_config(&Config::default(), 6).unwrap_err();
        assert!(matches!(err, OpsError::Config(ConfigError::Missing("evm.address.owner"))));
    }

    #[test]
    fn policy_rejects_unscalable_decimals() {
        let toml = r#"
[evm.address]
owner = "0x0000000000000000000000000000000000000001"
operator = "0x0000000000000000000000000000000000000002"
custodian = "0x0000000000000000000000000000000000000003"
treasury = "0x0000000000000000000000000000000000000004"
activity_reward = "0x0000000000000000000000000000000000000005"

[operation.create_vault]
collateral_percentage = 200
"#;
        let config = Config::from_toml_str(toml, |_| None).unwrap();
        let err = VaultPolicy::from_config(&config, 80).unwrap_err();
        assert!(matches!(
            err,
            OpsError::AmountOverflow {
                amount: 1_000_000,
                decimals: 80
            }
        ));
    }
}
