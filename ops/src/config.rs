//! # Operator Configuration
//!
//! One TOML file per environment (`resource/{ENVIRONMENT}.toml`) holds the
//! non-secret settings. Secrets never live in the file: they are overlaid
//! from environment variables after parsing.
//!
//! Every leaf is optional. Which fields a command needs is decided by the
//! [`Schema`](crate::schema::Schema) the command validates against, so a
//! `describe-token` run does not demand Supabase credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::schema::{Schema, ValidationError};

/// Environment used when `ENVIRONMENT` is unset.
pub const DEFAULT_ENVIRONMENT: &str = "local";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing configuration value `{0}`")]
    Missing(&'static str),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSection,
    pub app: AppSection,
    pub evm: EvmSection,
    pub services: ServicesSection,
    pub users: UsersSection,
    pub operation: OperationSection,
    pub secret: SecretSection,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmSection {
    pub url: Option<String>,
    pub chain_id: Option<u64>,
    pub address: EvmAddresses,
}

/// Well-known EVM addresses. Hex strings, parsed when used.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmAddresses {
    pub owner: Option<String>,
    pub operator: Option<String>,
    pub custodian: Option<String>,
    pub treasury: Option<String>,
    pub activity_reward: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesSection {
    pub supabase: SupabaseSection,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseSection {
    pub url: Option<String>,
    /// Overlaid from `SUPABASE_SERVICE_ROLE_KEY`.
    pub service_role_key: Option<String>,
}

impl fmt::Debug for SupabaseSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseSection")
            .field("url", &self.url)
            .field("service_role_key", &Redacted(&self.service_role_key))
            .finish()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersSection {
    pub admin: UserSection,
    pub alice: UserSection,
    pub bob: UserSection,
}

/// An operator-controlled account. Password and key come from the
/// environment (`{NAME}_PASSWORD`, `{NAME}_PRIVATE_KEY`).
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSection {
    pub email_address: Option<String>,
    pub password: Option<String>,
    pub private_key: Option<String>,
}

impl fmt::Debug for UserSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSection")
            .field("email_address", &self.email_address)
            .field("password", &Redacted(&self.password))
            .field("private_key", &Redacted(&self.private_key))
            .finish()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationSection {
    pub create_vault: CreateVaultSection,
}

/// Policy values applied to every vault the tooling creates.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateVaultSection {
    /// Percentage points, `10` = 10%.
    pub promised_yield: Option<u32>,
    /// Percentage points, `200` = 200%.
    pub collateral_percentage: Option<u32>,
    /// Whole asset units.
    pub max_cap: Option<u64>,
    /// Whole asset units.
    pub deposit_threshold: Option<u64>,
    pub share_name: Option<String>,
    pub share_symbol: Option<String>,
    pub upside_share_name: Option<String>,
    pub upside_share_symbol: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretSection {
    /// Overlaid from `OPERATOR_PRIVATE_KEY`.
    pub operator_private_key: Option<String>,
}

impl fmt::Debug for SecretSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSection")
            .field("operator_private_key", &Redacted(&self.operator_private_key))
            .finish()
    }
}

/// Shows whether a secret is set, never its value.
struct Redacted<'a>(&'a Option<String>);

impl fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Some(<redacted>)"),
            None => f.write_str("None"),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Parses a TOML document and overlays secrets from `env`.
    pub fn from_toml_str<E>(source: &str, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config: Config = toml::from_str(source)?;
        config.overlay_env(env);
        Ok(config)
    }

    /// Reads `path` and overlays secrets from `env`.
    pub fn load<E>(path: &Path, env: E) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source, env)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// `resource/{environment}.toml` under `root`.
    pub fn default_path(root: &Path, environment: Option<&str>) -> PathBuf {
        root.join("resource")
            .join(format!("{}.toml", environment.unwrap_or(DEFAULT_ENVIRONMENT)))
    }

    fn overlay_env<E>(&mut self, env: E)
    where
        E: Fn(&str) -> Option<String>,
    {
        let overlay = |slot: &mut Option<String>, var: &str| {
            if let Some(value) = env(var).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        };

        overlay(&mut self.users.admin.password, "ADMIN_PASSWORD");
        overlay(&mut self.users.admin.private_key, "ADMIN_PRIVATE_KEY");
        overlay(&mut self.users.alice.password, "ALICE_PASSWORD");
        overlay(&mut self.users.alice.private_key, "ALICE_PRIVATE_KEY");
        overlay(&mut self.users.bob.password, "BOB_PASSWORD");
        overlay(&mut self.users.bob.private_key, "BOB_PRIVATE_KEY");
        overlay(&mut self.secret.operator_private_key, "OPERATOR_PRIVATE_KEY");
        overlay(
            &mut self.services.supabase.service_role_key,
            "SUPABASE_SERVICE_ROLE_KEY",
        );
    }

    /// Validates this configuration against `schema`.
    pub fn validate(&self, schema: &Schema) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self).map_err(|e| ValidationError {
            schema: schema.name().to_string(),
            path: String::new(),
            constraint: format!("not serializable: {e}"),
        })?;
        schema.validate(&value)
    }

    /// Named user section (`admin`, `alice`, `bob`).
    pub fn user(&self, name: &str) -> Option<&UserSection> {
        match name {
            "admin" => Some(&self.users.admin),
            "alice" => Some(&self.users.alice),
            "bob" => Some(&self.users.bob),
            _ => None,
        }
    }
}

/// Unwraps a value a schema has already checked, without panicking if a
/// caller skipped validation.
pub fn required<'a, T: ?Sized>(
    value: Option<&'a T>,
    path: &'static str,
) -> Result<&'a T, ConfigError> {
    value.ok_or(ConfigError::Missing(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
[api]
url = "http://localhost:3001"

[app]
url = "http://localhost:3000"

[evm]
url = "http://localhost:8545"
chain_id = 31337

[evm.address]
owner = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
custodian = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"

[users.admin]
email_address = "admin@credbull.io"

[operation.create_vault]
collateral_percentage = 200
"#;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_sections_and_leaves_rest_empty() {
        let config = Config::from_toml_str(SAMPLE, env_from(&[])).unwrap();
        assert_eq!(config.api.url.as_deref(), Some("http://localhost:3001"));
        assert_eq!(config.evm.chain_id, Some(31_337));
        assert_eq!(config.operation.create_vault.collateral_percentage, Some(200));
        assert!(config.services.supabase.url.is_none());
        assert!(config.users.alice.email_address.is_none());
    }

    #[test]
    fn secrets_come_from_environment() {
        let env = env_from(&[
            ("ADMIN_PASSWORD", "s3cret"),
            ("ALICE_PRIVATE_KEY", "0xabc"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("BOB_PASSWORD", "   "),
        ]);
        let config = Config::from_toml_str(SAMPLE, env).unwrap();
        assert_eq!(config.users.admin.password.as_deref(), Some("s3cret"));
        assert_eq!(config.users.alice.private_key.as_deref(), Some("0xabc"));
        assert_eq!(
            config.services.supabase.service_role_key.as_deref(),
            Some("service-key")
        );
        // Blank variables do not clobber.
        assert!(config.users.bob.password.is_none());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let env = env_from(&[
            ("ADMIN_PASSWORD", "s3cret"),
            ("ADMIN_PRIVATE_KEY", "0xfeedface"),
            ("OPERATOR_PRIVATE_KEY", "0xdeadbeef"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ]);
        let config = Config::from_toml_str(SAMPLE, env).unwrap();
        let rendered = format!("{config:?}");

        for secret in ["s3cret", "0xfeedface", "0xdeadbeef", "service-key"] {
            assert!(!rendered.contains(secret), "{secret} leaked");
        }
        assert!(rendered.contains("password: Some(<redacted>)"));
        assert!(rendered.contains("operator_private_key: Some(<redacted>)"));
        // Unset secrets still read as unset.
        assert!(format!("{:?}", config.users.bob).contains("private_key: None"));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = Config::from_toml_str("[api\nurl = ", env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/nonexistent/credbull.toml"), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn default_path_uses_environment() {
        let root = Path::new("/srv/ops");
        assert_eq!(
            Config::default_path(root, None),
            PathBuf::from("/srv/ops/resource/local.toml")
        );
        assert_eq!(
            Config::default_path(root, Some("ci")),
            PathBuf::from("/srv/ops/resource/ci.toml")
        );
    }

    #[test]
    fn required_reports_path() {
        let config = Config::default();
        let err = required(config.api.url.as_deref(), "api.url").unwrap_err();
        assert_eq!(err.to_string(), "missing configuration value `api.url`");
    }
}
