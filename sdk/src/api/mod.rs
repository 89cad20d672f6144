//! # API Module
//!
//! HTTP access to the Credbull API. The client is deliberately dumb: it
//! knows how to join routes, attach credentials, and turn a non-2xx
//! response into an error that carries the server's message.

pub mod auth;
pub mod client;
pub mod error;
pub mod types;

pub use auth::login;
pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use types::{DataEnvelope, LinkedWallet, Session, VaultKind, VaultRecord};
