// Copyright (c) 2026 Credbull. MIT License.
// See LICENSE for details.

//! # Credbull SDK
//!
//! Client-side access to the Credbull vault platform: the REST API that
//! records vaults and accounts, and the vault contracts that hold the money.
//!
//! The contracts own all of the financial logic (share accounting, yield,
//! deposit and redemption windows). This crate only knows how to talk to
//! them and how to talk to the API that sits next to them.
//!
//! ## Architecture
//!
//! - **api**: HTTP client, error mapping, sign-in sessions, wire types.
//! - **chain**: The [`chain::VaultChain`] seam over vault/token/factory
//!   contracts, with an `ethers` implementation.
//! - **siwe**: Sign-In with Ethereum messages used to link wallets.
//! - **report**: Exact amount formatting, token/vault descriptions and
//!   balance snapshots for operator output.
//! - **sdk**: [`CredbullSdk`], the per-user wrapper combining a session
//!   with a signer.
//! - **config**: Endpoint paths and protocol constants.

pub mod api;
pub mod chain;
pub mod config;
pub mod report;
pub mod sdk;
pub mod siwe;

pub use sdk::{CredbullSdk, SdkError};
