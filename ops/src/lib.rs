// Copyright (c) 2026 Credbull. MIT License.
// See LICENSE for details.

//! # Credbull Ops
//!
//! Operator flows around the Credbull vault platform. Nothing here holds
//! money or does vault math: the contracts do. These flows provision
//! accounts, assemble vault creation requests, and drive vaults through
//! their lifecycle for demos and test environments.
//!
//! ## Architecture
//!
//! - **config** / **schema**: TOML configuration with an environment
//!   overlay for secrets, and per-command schemas checked before any I/O.
//! - **params**: Pure builder for vault creation requests.
//! - **create_vault**: Custodian grant, API submission, matured toggle.
//! - **deposit_redeem**: Multi-actor deposit and redeem demonstration.
//! - **users**: User provisioning and address whitelisting.
//! - **staking**: Idempotent deposit-batch loader over a sled log.
//! - **supabase**: Service-role access to the account and vault store.

pub mod config;
pub mod create_vault;
pub mod deposit_redeem;
pub mod error;
pub mod params;
pub mod schema;
pub mod staking;
pub mod supabase;
pub mod users;

pub use error::{OpsError, OpsResult};
