//! Error types for calls to the Credbull API and the Supabase admin API.

use thiserror::Error;

/// Errors that can occur while talking to a remote HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL could not be parsed.
    #[error("invalid API url {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status. `message` is taken from
    /// the response body when it carries one.
    #[error("request to {route} rejected with status {status}: {message}")]
    Rejected {
        /// Route that was called.
        route: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },

    /// A 2xx response body did not match the expected shape.
    #[error("could not decode response from {route}: {reason}")]
    Decode {
        /// Route that was called.
        route: String,
        /// Decoder message.
        reason: String,
    },
}

impl ApiError {
    /// Returns the HTTP status if the server rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the API module.
pub type ApiResult<T> = Result<T, ApiError>;
