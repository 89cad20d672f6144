//! Sign-In with Ethereum (EIP-4361) messages.
//!
//! The link-wallet route proves wallet ownership by verifying a SIWE message
//! signed by the wallet. Only the fields the API checks are modelled.

use chrono::{DateTime, SecondsFormat, Utc};
use ethers::types::Address;
use ethers::utils::to_checksum;
use std::fmt;

use crate::config::{SIWE_STATEMENT, SIWE_VERSION};

/// A SIWE message ready to be signed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiweMessage {
    /// Host of the application requesting the signature (no scheme).
    pub domain: String,
    /// Signing address.
    pub address: Address,
    /// Human-readable statement shown to the signer.
    pub statement: String,
    /// Full URI of the application.
    pub uri: String,
    /// Chain the signature is meant for.
    pub chain_id: u64,
    /// Single-use nonce.
    pub nonce: String,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
}

impl SiweMessage {
    /// Builds a message for `address` against the application at `app_url`,
    /// with a fresh nonce and the current time.
    ///
    /// The domain is the host (and port, when present) of `app_url`.
    pub fn new(app_url: &reqwest::Url, address: Address, chain_id: u64) -> Self {
        let domain = match (app_url.host_str(), app_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => app_url.as_str().to_string(),
        };

        Self {
            domain,
            address,
            statement: SIWE_STATEMENT.to_string(),
            uri: app_url.as_str().trim_end_matches('/').to_string(),
            chain_id,
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            issued_at: Utc::now(),
        }
    }
}

impl fmt::Display for SiweMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} wants you to sign in with your Ethereum account:",
            self.domain
        )?;
        writeln!(f, "{}", to_checksum(&self.address, None))?;
        writeln!(f)?;
        writeln!(f, "{}", self.statement)?;
        writeln!(f)?;
        writeln!(f, "URI: {}", self.uri)?;
        writeln!(f, "Version: {}", SIWE_VERSION)?;
        writeln!(f, "Chain ID: {}", self.chain_id)?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        write!(
            f,
            "Issued At: {}",
            self.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> SiweMessage {
        SiweMessage {
            domain: "localhost:3000".to_string(),
            address: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap(),
            statement: SIWE_STATEMENT.to_string(),
            uri: "http://localhost:3000".to_string(),
            chain_id: 31_337,
            nonce: "a1b2c3d4e5f6a7b8".to_string(),
            issued_at: Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn renders_eip4361_layout() {
        let text = fixed().to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "localhost:3000 wants you to sign in with your Ethereum account:"
        );
        assert_eq!(lines[1], "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], SIWE_STATEMENT);
        assert_eq!(lines[5], "URI: http://localhost:3000");
        assert_eq!(lines[6], "Version: 1");
        assert_eq!(lines[7], "Chain ID: 31337");
        assert_eq!(lines[8], "Nonce: a1b2c3d4e5f6a7b8");
        assert_eq!(lines[9], "Issued At: 2026-10-17T12:00:00.000Z");
    }

    #[test]
    fn new_derives_domain_and_nonce() {
        let url = reqwest::Url::parse("http://localhost:3000/").unwrap();
        let message = SiweMessage::new(&url, Address::zero(), 1);
        assert_eq!(message.domain, "localhost:3000");
        assert_eq!(message.uri, "http://localhost:3000");
        assert_eq!(message.nonce.len(), 32);
        assert!(message.nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn nonces_are_unique() {
        let url = reqwest::Url::parse("https://app.credbull.io").unwrap();
        let a = SiweMessage::new(&url, Address::zero(), 1);
        let b = SiweMessage::new(&url, Address::zero(), 1);
        assert_ne!(a.nonce, b.nonce);
        assert_eq!(a.domain, "app.credbull.io");
    }
}
