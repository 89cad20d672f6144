//! Email/password sign-in against the Credbull API.

use super::client::ApiClient;
use super::error::ApiResult;
use super::types::{Session, SignInRequest};
use crate::config::ROUTE_SIGN_IN;

/// Signs in with email and password and returns the session.
///
/// One attempt only. Rejected credentials come back as
/// [`ApiError::Rejected`](super::ApiError::Rejected) with the server's
/// message; retrying is the caller's business.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> ApiResult<Session> {
    let session: Session = client
        .post(ROUTE_SIGN_IN, &SignInRequest { email, password })
        .await?;
    tracing::info!(%email, user_id = %session.user_id, "signed in");
    Ok(session)
}

/// Returns a client that authenticates as the given session.
pub fn authorized(client: &ApiClient, session: &Session) -> ApiClient {
    client.with_bearer(session.access_token.clone())
}
