//! Role client.
//!
//! Fetches the authenticated principal's current role set. Roles are never
//! cached: entitlements can change between requests.

use crate::models::ServiceEnvelope;
use crate::observability::metrics;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Instant;
use thiserror::Error;
use tracing::{instrument, warn};

/// Path of the role endpoint relative to the issuer base URL.
pub const GET_ROLES_PATH: &str = "/user/getroles";

/// Role fetch failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure, timeout or non-success HTTP status.
    #[error("Identity server unreachable: {0}")]
    Transport(String),

    /// Response body was not the expected JSON envelope.
    #[error("Identity server response could not be decoded: {0}")]
    Decode(String),

    /// Identity server answered with a non-zero code.
    #[error("Role fetch rejected with code {code}")]
    Rejected { code: i64 },
}

/// HTTP client for `GET {issuer}/user/getroles`.
#[derive(Clone)]
pub struct RoleClient {
    client: Client,
}

impl RoleClient {
    /// Create a client on top of a shared, timeout-configured HTTP client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch the role set for the principal holding `token`.
    ///
    /// The token is sent verbatim in the `Authorization` header.
    ///
    /// # Errors
    ///
    /// - `FetchError::Transport` if the call fails, times out or returns non-2xx
    /// - `FetchError::Decode` if the body is not a JSON envelope
    /// - `FetchError::Rejected` if `code != 0`
    #[instrument(skip_all)]
    pub async fn fetch_roles(
        &self,
        issuer_base_url: &str,
        token: &str,
    ) -> Result<HashSet<String>, FetchError> {
        let url = format!("{}{}", issuer_base_url.trim_end_matches('/'), GET_ROLES_PATH);
        let start = Instant::now();

        let result = self.send(&url, token).await;

        let status = match &result {
            Ok(_) => "success",
            Err(FetchError::Rejected { .. }) => "rejected",
            Err(_) => "error",
        };
        metrics::record_upstream_request("fetch_roles", status, start.elapsed());

        result
    }

    async fn send(&self, url: &str, token: &str) -> Result<HashSet<String>, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", token)
            .send()
            .await
            .map_err(|e| {
                warn!(target: "sso.issuer", error = %e, timeout = e.is_timeout(), "Role fetch request failed");
                FetchError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: "sso.issuer", status = %status, "Role fetch returned error status");
            return Err(FetchError::Transport(format!("HTTP {}", status)));
        }

        let envelope: ServiceEnvelope<Vec<String>> = response.json().await.map_err(|e| {
            warn!(target: "sso.issuer", error = %e, "Failed to decode role response");
            FetchError::Decode(e.to_string())
        })?;

        if !envelope.is_success() {
            warn!(target: "sso.issuer", code = envelope.code, "Role fetch rejected");
            return Err(FetchError::Rejected {
                code: envelope.code,
            });
        }

        Ok(envelope.result.unwrap_or_default().into_iter().collect())
    }
}
