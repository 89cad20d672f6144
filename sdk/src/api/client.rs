//! Thin JSON-over-HTTP client.
//!
//! Every call is a single attempt. A non-2xx response becomes
//! [`ApiError::Rejected`] carrying the `message` field from the body, so
//! callers see the server's own explanation instead of a bare status code.

use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{ApiError, ApiResult};

/// A JSON API client bound to one base URL.
///
/// Cheap to clone. Credentials are attached per client value, so an admin
/// client and a user client can share the same connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    bearer: Option<String>,
    headers: Vec<(String, String)>,
}

impl ApiClient {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the URL does not parse.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            base,
            bearer: None,
            headers: Vec::new(),
        })
    }

    /// Returns a copy of this client that sends `Authorization: Bearer <token>`.
    pub fn with_bearer(&self, token: impl Into<String>) -> Self {
        let mut client = self.clone();
        client.bearer = Some(token.into());
        client
    }

    /// Returns a copy of this client that sends an extra header on every call.
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut client = self.clone();
        client.headers.push((name.into(), value.into()));
        client
    }

    /// The base URL this client resolves routes against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Builds the absolute URL for a relative route.
    pub fn endpoint(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// POSTs `body` as JSON and decodes the JSON response.
    pub async fn post<B, R>(&self, route: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        tracing::debug!(route, "POST");
        let response = self.request(Method::POST, route).json(body).send().await?;
        decode(route, response).await
    }

    /// GETs `route` with the given query parameters and decodes the JSON
    /// response.
    pub async fn get<R>(&self, route: &str, query: &[(&str, &str)]) -> ApiResult<R>
    where
        R: DeserializeOwned,
    {
        tracing::debug!(route, "GET");
        let response = self.request(Method::GET, route).query(query).send().await?;
        decode(route, response).await
    }

    fn request(&self, method: Method, route: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.endpoint(route));
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}

/// Maps a response to either the decoded body or an [`ApiError`].
async fn decode<R: DeserializeOwned>(route: &str, response: Response) -> ApiResult<R> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = error_message(&bytes)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        tracing::warn!(route, status = status.as_u16(), %message, "request rejected");
        return Err(ApiError::Rejected {
            route: route.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
        route: route.to_string(),
        reason: e.to_string(),
    })
}

/// Pulls a human-readable message out of an error body.
///
/// The Credbull API uses `message`; Supabase uses `msg`, `error_description`
/// or `error` depending on the service. Plain-text bodies are returned as is.
fn error_message(body: &[u8]) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => ["message", "msg", "error_description", "error"]
            .iter()
            .find_map(|key| value.get(*key))
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        Err(_) => Some(String::from_utf8_lossy(body).trim().to_string()),
    }
}
