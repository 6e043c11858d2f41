//! Ticket exchange client.
//!
//! Converts the one-time ticket handed back by the identity server's login
//! page into a session token.
//!
//! # Security
//!
//! - Tickets are single-use server-side, so a failed exchange is never retried
//! - Timeouts bound the call; a timeout is reported as a transport failure
//! - Neither the ticket nor the returned token is logged

use crate::models::ServiceEnvelope;
use crate::observability::metrics;
use reqwest::Client;
use std::time::Instant;
use thiserror::Error;
use tracing::{instrument, warn};

/// Path of the ticket exchange endpoint relative to the issuer base URL.
pub const GET_TOKEN_PATH: &str = "/sso/gettoken";

/// Ticket exchange failure.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Network failure, timeout or non-success HTTP status.
    #[error("Identity server unreachable: {0}")]
    Transport(String),

    /// Response body was not the expected JSON envelope.
    #[error("Identity server response could not be decoded: {0}")]
    Decode(String),

    /// Identity server refused the ticket.
    #[error("Ticket exchange rejected with code {code}")]
    Failed { code: i64 },
}

/// HTTP client for `GET {issuer}/sso/gettoken`.
#[derive(Clone)]
pub struct TicketExchangeClient {
    client: Client,
}

impl TicketExchangeClient {
    /// Create a client on top of a shared, timeout-configured HTTP client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Exchange a ticket for a session token.
    ///
    /// # Arguments
    ///
    /// * `issuer_base_url` - Identity server base URL
    /// * `from` - Canonical application base URL without scheme or trailing slash
    /// * `ticket` - One-time ticket from the login redirect
    /// * `client_ip` - Remote address of the browser
    ///
    /// # Errors
    ///
    /// - `ExchangeError::Transport` if the call fails, times out or returns non-2xx
    /// - `ExchangeError::Decode` if the body is not a JSON envelope
    /// - `ExchangeError::Failed` if `code != 0` or no token is returned
    #[instrument(skip_all, fields(from = %from))]
    pub async fn exchange(
        &self,
        issuer_base_url: &str,
        from: &str,
        ticket: &str,
        client_ip: &str,
    ) -> Result<String, ExchangeError> {
        let url = format!("{}{}", issuer_base_url.trim_end_matches('/'), GET_TOKEN_PATH);
        let start = Instant::now();

        let result = self.send(&url, from, ticket, client_ip).await;

        let status = match &result {
            Ok(_) => "success",
            Err(ExchangeError::Failed { .. }) => "rejected",
            Err(_) => "error",
        };
        metrics::record_upstream_request("ticket_exchange", status, start.elapsed());

        result
    }

    async fn send(
        &self,
        url: &str,
        from: &str,
        ticket: &str,
        client_ip: &str,
    ) -> Result<String, ExchangeError> {
        let response = self
            .client
            .get(url)
            .query(&[("from", from), ("ticket", ticket), ("ip", client_ip)])
            .send()
            .await
            .map_err(|e| {
                warn!(target: "sso.issuer", error = %e, timeout = e.is_timeout(), "Ticket exchange request failed");
                ExchangeError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: "sso.issuer", status = %status, "Ticket exchange returned error status");
            return Err(ExchangeError::Transport(format!("HTTP {}", status)));
        }

        let envelope: ServiceEnvelope<String> = response.json().await.map_err(|e| {
            warn!(target: "sso.issuer", error = %e, "Failed to decode ticket exchange response");
            ExchangeError::Decode(e.to_string())
        })?;

        match envelope.result {
            Some(token) if envelope.code == 0 && !token.is_empty() => Ok(token),
            _ => {
                warn!(target: "sso.issuer", code = envelope.code, "Ticket exchange rejected");
                Err(ExchangeError::Failed {
                    code: envelope.code,
                })
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> TicketExchangeClient {
        TicketExchangeClient::new(
            Client::builder()
                .timeout(Duration::from_millis(500))
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_exchange_success_sends_expected_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sso/gettoken"))
            .and(query_param("from", "app.example.com"))
            .and(query_param("ticket", "T1"))
            .and(query_param("ip", "10.0.0.7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"code": 0, "result": "tok-abc"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let token = client()
            .exchange(&server.uri(), "app.example.com", "T1", "10.0.0.7")
            .await
            .unwrap();
        assert_eq!(token, "tok-abc");
    }

    #[tokio::test]
    async fn test_exchange_trims_trailing_slash_of_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sso/gettoken"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"code": 0, "result": "tok"})),
            )
            .mount(&server)
            .await;

        let base = format!("{}/", server.uri());
        assert!(client().exchange(&base, "a", "T", "ip").await.is_ok());
    }

    #[tokio::test]
    async fn test_exchange_nonzero_code_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sso/gettoken"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"code": 7, "result": ""})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = client().exchange(&server.uri(), "a", "T", "ip").await;
        assert!(matches!(result, Err(ExchangeError::Failed { code: 7 })));
    }

    #[tokio::test]
    async fn test_exchange_empty_token_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"code": 0, "result": ""})),
            )
            .mount(&server)
            .await;

        let result = client().exchange(&server.uri(), "a", "T", "ip").await;
        assert!(matches!(result, Err(ExchangeError::Failed { code: 0 })));
    }

    #[tokio::test]
    async fn test_exchange_malformed_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client().exchange(&server.uri(), "a", "T", "ip").await;
        assert!(matches!(result, Err(ExchangeError::Decode(_))));
    }

    #[tokio::test]
    async fn test_exchange_server_error_is_transport_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let result = client().exchange(&server.uri(), "a", "T", "ip").await;
        assert!(matches!(result, Err(ExchangeError::Transport(_))));
    }

    #[tokio::test]
    async fn test_exchange_timeout_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"code": 0, "result": "tok"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let result = client().exchange(&server.uri(), "a", "T", "ip").await;
        assert!(matches!(result, Err(ExchangeError::Transport(_))));
    }

    #[tokio::test]
    async fn test_exchange_unreachable_is_transport() {
        let result = client()
            .exchange("http://127.0.0.1:1", "a", "T", "ip")
            .await;
        assert!(matches!(result, Err(ExchangeError::Transport(_))));
    }
}
