//! Stub identity server
//!
//! A `wiremock` server answering the two JSON endpoints the gate calls:
//! `GET /sso/gettoken` and `GET /user/getroles`.

use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Stub identity server for integration tests
///
/// # Example
/// ```rust,ignore
/// let issuer = StubIssuer::start().await;
/// issuer.issue_token("T1", "tok-abc").await;
/// let vars = issuer.settings_vars("sso_token");
/// ```
pub struct StubIssuer {
    server: MockServer,
}

impl StubIssuer {
    /// Start a stub server on a random local port
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the stub
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Underlying mock server for custom mounts
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Exchange `ticket` for `token`
    pub async fn issue_token(&self, ticket: &str, token: &str) {
        Mock::given(method("GET"))
            .and(path("/sso/gettoken"))
            .and(query_param("ticket", ticket))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "result": token,
            })))
            .mount(&self.server)
            .await;
    }

    /// Refuse `ticket` with a nonzero envelope code
    pub async fn reject_ticket(&self, ticket: &str) {
        Mock::given(method("GET"))
            .and(path("/sso/gettoken"))
            .and(query_param("ticket", ticket))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 1,
                "result": null,
                "message": "ticket_invalid",
            })))
            .mount(&self.server)
            .await;
    }

    /// Grant `roles` to whoever presents `token`
    pub async fn grant_roles(&self, token: &str, roles: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/user/getroles"))
            .and(header("Authorization", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "result": roles,
            })))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received on `request_path`
    pub async fn request_count(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|req| req.url.path() == request_path)
            .count()
    }

    /// Total requests received
    pub async fn total_requests(&self) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .len()
    }

    /// Complete gate settings pointing at this stub
    pub fn settings_vars(&self, cookie_key: &str) -> HashMap<String, String> {
        settings_vars(&self.uri(), cookie_key)
    }
}

/// Complete gate settings with [`crate::TEST_SECRET`] and a 30 minute cookie
pub fn settings_vars(base_url: &str, cookie_key: &str) -> HashMap<String, String> {
    HashMap::from([
        ("ssoBaseUrl".to_string(), base_url.to_string()),
        (
            "ssoSecretKey".to_string(),
            crate::token_builders::TEST_SECRET.to_string(),
        ),
        ("ssoCookieKey".to_string(), cookie_key.to_string()),
        ("ssoCookieTime".to_string(), "30".to_string()),
    ])
}
