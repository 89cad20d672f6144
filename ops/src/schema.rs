//! # Configuration Schemas
//!
//! A [`Schema`] is a named list of `(dotted path, constraint)` rules checked
//! against the JSON form of a configuration. Each operator command merges
//! the descriptors it depends on and validates once, before any I/O. The
//! first violated rule is reported; input is never modified.

use ethers::types::Address;
use reqwest::Url;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A violated schema rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{schema}: `{path}` {constraint}")]
pub struct ValidationError {
    /// Name of the schema that was checked.
    pub schema: String,
    /// Dotted path of the offending field.
    pub path: String,
    /// What the field failed to be.
    pub constraint: String,
}

/// What a field must look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    NonEmptyString,
    Url,
    Email,
    Address,
    PrivateKey,
    PositiveNumber,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Constraint::NonEmptyString => "a non-empty string",
            Constraint::Url => "a valid URL",
            Constraint::Email => "a valid email address",
            Constraint::Address => "a valid EVM address",
            Constraint::PrivateKey => "a 32-byte hex private key",
            Constraint::PositiveNumber => "a positive number",
        };
        f.write_str(text)
    }
}

impl Constraint {
    fn check(&self, value: &Value) -> Result<(), String> {
        let valid = match self {
            Constraint::PositiveNumber => value.as_f64().map(|n| n > 0.0).unwrap_or(false),
            Constraint::NonEmptyString => {
                value.as_str().map(|t| !t.trim().is_empty()).unwrap_or(false)
            }
            Constraint::Url => value.as_str().map(is_url).unwrap_or(false),
            Constraint::Email => value.as_str().map(is_email).unwrap_or(false),
            Constraint::Address => value.as_str().map(is_address).unwrap_or(false),
            Constraint::PrivateKey => value.as_str().map(is_private_key).unwrap_or(false),
        };
        if valid {
            Ok(())
        } else {
            Err(format!("is not {self}"))
        }
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// A named, composable set of field requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    rules: Vec<(String, Constraint)>,
}

impl Schema {
    /// An empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Adds a rule.
    pub fn require(mut self, path: impl Into<String>, constraint: Constraint) -> Self {
        self.rules.push((path.into(), constraint));
        self
    }

    /// Combines two schemas. Rules keep their order; duplicates are dropped.
    pub fn merge(mut self, other: Schema) -> Self {
        self.name = format!("{}+{}", self.name, other.name);
        for rule in other.rules {
            if !self.rules.contains(&rule) {
                self.rules.push(rule);
            }
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Checks `value` against every rule, failing on the first violation.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        for (path, constraint) in &self.rules {
            let field = lookup(value, path).ok_or_else(|| ValidationError {
                schema: self.name.clone(),
                path: path.clone(),
                constraint: format!("is missing (expected {constraint})"),
            })?;

            constraint.check(field).map_err(|reason| ValidationError {
                schema: self.name.clone(),
                path: path.clone(),
                constraint: reason,
            })?;
        }
        Ok(())
    }
}

/// Resolves a dotted path. `null` counts as missing.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |node, key| node.get(key))
        .filter(|v| !v.is_null())
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// The Credbull API base URL.
pub fn api() -> Schema {
    Schema::new("api").require("api.url", Constraint::Url)
}

/// The web application URL, used as the SIWE domain.
pub fn app() -> Schema {
    Schema::new("app").require("app.url", Constraint::Url)
}

/// The EVM JSON-RPC endpoint.
pub fn evm_rpc() -> Schema {
    Schema::new("evm_rpc").require("evm.url", Constraint::Url)
}

/// Role addresses every vault is created with.
pub fn evm_addresses() -> Schema {
    ["owner", "operator", "custodian", "treasury", "activity_reward"]
        .iter()
        .fold(Schema::new("evm_addresses"), |schema, role| {
            schema.require(format!("evm.address.{role}"), Constraint::Address)
        })
}

/// Supabase admin access.
pub fn supabase_admin() -> Schema {
    Schema::new("supabase_admin")
        .require("services.supabase.url", Constraint::Url)
        .require("services.supabase.service_role_key", Constraint::NonEmptyString)
}

/// Email, password and key of the named operator-controlled user.
pub fn user(name: &str) -> Schema {
    Schema::new(format!("user_{name}"))
        .require(format!("users.{name}.email_address"), Constraint::Email)
        .require(format!("users.{name}.password"), Constraint::NonEmptyString)
        .require(format!("users.{name}.private_key"), Constraint::PrivateKey)
}

/// The admin account used for privileged API and chain calls.
pub fn admin_user() -> Schema {
    user("admin")
}

/// Vault creation policy values.
pub fn create_vault_policy() -> Schema {
    Schema::new("create_vault_policy")
        .require("operation.create_vault.promised_yield", Constraint::PositiveNumber)
        .require(
            "operation.create_vault.collateral_percentage",
            Constraint::PositiveNumber,
        )
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

fn invalid(field: &str, constraint: Constraint, input: &str) -> ValidationError {
    ValidationError {
        schema: "input".to_string(),
        path: field.to_string(),
        constraint: format!("{input:?} is not {constraint}"),
    }
}

fn is_email(text: &str) -> bool {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty())
        && labels.last().map(|tld| tld.len() >= 2).unwrap_or(false)
}

fn is_hex_of_len(text: &str, len: usize) -> bool {
    text.len() == len && text.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_address(text: &str) -> bool {
    text.strip_prefix("0x")
        .map(|hex| is_hex_of_len(hex, 40))
        .unwrap_or(false)
}

fn is_private_key(text: &str) -> bool {
    is_hex_of_len(text.strip_prefix("0x").unwrap_or(text), 64)
}

fn is_url(text: &str) -> bool {
    Url::parse(text)
        .map(|url| {
            matches!(url.scheme(), "http" | "https" | "ws" | "wss") && url.host_str().is_some()
        })
        .unwrap_or(false)
}

/// Accepts `local@domain.tld` without whitespace.
pub fn parse_email(input: &str) -> Result<&str, ValidationError> {
    if is_email(input) {
        Ok(input)
    } else {
        Err(invalid("email", Constraint::Email, input))
    }
}

/// Accepts a `0x`-prefixed 20-byte hex address, any case.
pub fn parse_address(input: &str) -> Result<Address, ValidationError> {
    if !is_address(input) {
        return Err(invalid("address", Constraint::Address, input));
    }
    input
        .parse::<Address>()
        .map_err(|_| invalid("address", Constraint::Address, input))
}

/// Accepts a 32-byte hex private key, `0x` optional.
pub fn parse_private_key(input: &str) -> Result<&str, ValidationError> {
    if is_private_key(input) {
        Ok(input)
    } else {
        // Never echo key material.
        Err(invalid("private_key", Constraint::PrivateKey, "<redacted>"))
    }
}

/// Accepts an absolute http(s)/ws(s) URL with a host.
pub fn parse_url(input: &str) -> Result<Url, ValidationError> {
    if !is_url(input) {
        return Err(invalid("url", Constraint::Url, input));
    }
    Url::parse(input).map_err(|_| invalid("url", Constraint::Url, input))
}
