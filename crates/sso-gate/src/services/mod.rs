//! Identity server clients.
//!
//! # Components
//!
//! - `ticket_exchange` - One-time ticket to session token exchange
//! - `role_client` - Role set lookup for an authenticated principal
//!
//! The gate talks to both through [`IssuerApi`] so tests can substitute
//! [`mock::MockIssuer`].

pub mod role_client;
pub mod ticket_exchange;

pub use role_client::{FetchError, RoleClient};
pub use ticket_exchange::{ExchangeError, TicketExchangeClient};

use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

/// Connect timeout for identity server calls in seconds.
const ISSUER_CONNECT_TIMEOUT_SECS: u64 = 2;

/// Upstream operations the gate needs from the identity server.
#[async_trait::async_trait]
pub trait IssuerApi: Send + Sync {
    /// Exchange a one-time ticket for a session token.
    async fn exchange_ticket(
        &self,
        issuer_base_url: &str,
        from: &str,
        ticket: &str,
        client_ip: &str,
    ) -> Result<String, ExchangeError>;

    /// Fetch the current role set for a session token.
    async fn fetch_roles(
        &self,
        issuer_base_url: &str,
        token: &str,
    ) -> Result<HashSet<String>, FetchError>;
}

/// HTTP implementation of [`IssuerApi`].
///
/// Both clients share one connection pool and the same bounded timeout.
#[derive(Clone)]
pub struct HttpIssuer {
    tickets: TicketExchangeClient,
    roles: RoleClient,
}

impl HttpIssuer {
    /// Build the issuer clients with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(ISSUER_CONNECT_TIMEOUT_SECS).min(timeout))
            .build()
            .map_err(|e| {
                tracing::error!(target: "sso.issuer", error = %e, "Failed to build HTTP client");
                e
            })?;

        Ok(Self {
            tickets: TicketExchangeClient::new(client.clone()),
            roles: RoleClient::new(client),
        })
    }
}

#[async_trait::async_trait]
impl IssuerApi for HttpIssuer {
    async fn exchange_ticket(
        &self,
        issuer_base_url: &str,
        from: &str,
        ticket: &str,
        client_ip: &str,
    ) -> Result<String, ExchangeError> {
        self.tickets
            .exchange(issuer_base_url, from, ticket, client_ip)
            .await
    }

    async fn fetch_roles(
        &self,
        issuer_base_url: &str,
        token: &str,
    ) -> Result<HashSet<String>, FetchError> {
        self.roles.fetch_roles(issuer_base_url, token).await
    }
}

/// Mock identity server client for unit testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock issuer with canned answers and call counters.
    pub struct MockIssuer {
        /// Token returned by a ticket exchange; `None` makes it fail.
        token: Option<String>,
        /// Roles returned by a role fetch; `None` makes it fail.
        roles: Option<HashSet<String>>,
        exchange_calls: AtomicUsize,
        role_calls: AtomicUsize,
    }

    impl MockIssuer {
        /// A mock that issues `token` for any ticket and grants no roles.
        pub fn issuing(token: &str) -> Self {
            Self {
                token: Some(token.to_string()),
                roles: Some(HashSet::new()),
                exchange_calls: AtomicUsize::new(0),
                role_calls: AtomicUsize::new(0),
            }
        }

        /// A mock whose ticket exchange and role fetch both fail.
        pub fn failing() -> Self {
            Self {
                token: None,
                roles: None,
                exchange_calls: AtomicUsize::new(0),
                role_calls: AtomicUsize::new(0),
            }
        }

        /// Grant these roles on every fetch.
        pub fn with_roles<I, S>(mut self, roles: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.roles = Some(roles.into_iter().map(Into::into).collect());
            self
        }

        /// Make role fetches fail with a transport error.
        pub fn with_failing_roles(mut self) -> Self {
            self.roles = None;
            self
        }

        /// Number of ticket exchanges attempted.
        pub fn exchange_calls(&self) -> usize {
            self.exchange_calls.load(Ordering::SeqCst)
        }

        /// Number of role fetches attempted.
        pub fn role_calls(&self) -> usize {
            self.role_calls.load(Ordering::SeqCst)
        }

        /// Total upstream calls.
        pub fn total_calls(&self) -> usize {
            self.exchange_calls() + self.role_calls()
        }
    }

    #[async_trait::async_trait]
    impl IssuerApi for MockIssuer {
        async fn exchange_ticket(
            &self,
            _issuer_base_url: &str,
            _from: &str,
            _ticket: &str,
            _client_ip: &str,
        ) -> Result<String, ExchangeError> {
            self.exchange_calls.fetch_add(1, Ordering::SeqCst);
            self.token
                .clone()
                .ok_or(ExchangeError::Failed { code: 1 })
        }

        async fn fetch_roles(
            &self,
            _issuer_base_url: &str,
            _token: &str,
        ) -> Result<HashSet<String>, FetchError> {
            self.role_calls.fetch_add(1, Ordering::SeqCst);
            self.roles
                .clone()
                .ok_or_else(|| FetchError::Transport("Mock issuer error".to_string()))
        }
    }
}
