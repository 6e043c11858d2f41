//! Authorization gate.
//!
//! Turns one request into an access decision:
//!
//! ```text
//! anonymous? -> config guard -> ssourls? -> session token -> ticket -> login
//!                                   |            |             |
//!                                   v            +------+------+
//!                              logout hop               v
//!                                                  role check -> allow | deny
//! ```
//!
//! The gate is framework independent. It consumes a [`GateRequest`] and
//! returns a [`GateOutcome`] holding the decision plus the cookie jar with
//! any `Set-Cookie` changes; the adapter in [`crate::middleware`] maps both
//! onto axum responses.

use crate::auth::{self, Principal};
use crate::config::{RequiredSettings, SsoSettings};
use crate::errors::SsoError;
use crate::logout::{self, RETURN_URL_PARAM, SSO_URLS_PARAM};
use crate::observability::metrics;
use crate::policy::AccessPolicy;
use crate::services::IssuerApi;
use crate::session;
use axum_extra::extract::cookie::CookieJar;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;

/// Query parameter carrying a one-time login ticket.
pub const TICKET_PARAM: &str = "ticket";

/// Login page path on the identity server.
pub const LOGIN_PATH: &str = "/sso/login";

/// Everything the gate needs to know about one request.
#[derive(Debug, Clone, Default)]
pub struct GateRequest {
    /// Absolute URL of the request as the browser sees it.
    pub absolute_url: String,
    /// Base URL of the protected application (scheme, host, path base).
    pub application_url: String,
    /// Decoded query parameters.
    pub query: HashMap<String, String>,
    /// Remote address of the caller.
    pub client_ip: String,
    /// Request cookies.
    pub cookies: CookieJar,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
}

/// The gate's verdict.
#[derive(Debug, Clone)]
pub enum Decision {
    /// Pass through to the endpoint. `None` for anonymous endpoints.
    Allow(Option<Principal>),
    /// Send the browser to the identity server login page.
    LoginRedirect(String),
    /// Continue a distributed logout at the next site or the issuer.
    LogoutRedirect(String),
    /// Respond with an error envelope.
    Reject(SsoError),
}

impl Decision {
    /// Metric label for this decision.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Allow(None) => "allow_anonymous",
            Decision::Allow(Some(_)) => "allow",
            Decision::LoginRedirect(_) => "login_redirect",
            Decision::LogoutRedirect(_) => "logout_redirect",
            Decision::Reject(SsoError::ConfigMissing(_)) => "config_missing",
            Decision::Reject(SsoError::Unauthorized) => "unauthorized",
            Decision::Reject(SsoError::AuthorizationFault) => "forbidden",
            Decision::Reject(SsoError::ChainDecode) => "chain_decode",
        }
    }

    /// Redirect target, if this decision is a redirect.
    pub fn location(&self) -> Option<&str> {
        match self {
            Decision::LoginRedirect(location) | Decision::LogoutRedirect(location) => {
                Some(location)
            }
            Decision::Allow(_) | Decision::Reject(_) => None,
        }
    }
}

/// Decision plus the cookie changes that must accompany the response.
#[derive(Debug)]
pub struct GateOutcome {
    pub decision: Decision,
    pub cookies: CookieJar,
}

impl GateOutcome {
    fn new(decision: Decision, cookies: CookieJar) -> Self {
        metrics::record_gate_decision(decision.outcome());
        Self { decision, cookies }
    }
}

/// Authorization gate shared by every protected route.
#[derive(Clone)]
pub struct SsoGate {
    settings: Arc<SsoSettings>,
    issuer: Arc<dyn IssuerApi>,
}

impl SsoGate {
    pub fn new(settings: Arc<SsoSettings>, issuer: Arc<dyn IssuerApi>) -> Self {
        Self { settings, issuer }
    }

    pub fn settings(&self) -> &SsoSettings {
        &self.settings
    }

    /// Decide whether `request` may reach an endpoint guarded by `policy`.
    ///
    /// With `redirect_unauthorized` unset, a request that would be sent to the
    /// login page is rejected with [`SsoError::Unauthorized`] instead.
    #[instrument(skip_all, name = "sso.gate.authorize", fields(outcome = tracing::field::Empty))]
    pub async fn authorize(
        &self,
        policy: &AccessPolicy,
        redirect_unauthorized: bool,
        request: GateRequest,
    ) -> GateOutcome {
        let outcome = self.decide(policy, redirect_unauthorized, request).await;
        tracing::Span::current().record("outcome", outcome.decision.outcome());
        outcome
    }

    async fn decide(
        &self,
        policy: &AccessPolicy,
        redirect_unauthorized: bool,
        request: GateRequest,
    ) -> GateOutcome {
        let GateRequest {
            absolute_url,
            application_url,
            query,
            client_ip,
            cookies,
            authorization,
        } = request;

        if !policy.requires_auth {
            return GateOutcome::new(Decision::Allow(None), cookies);
        }

        let required = match self.settings.require() {
            Ok(required) => required,
            Err(setting) => {
                return GateOutcome::new(
                    Decision::Reject(SsoError::ConfigMissing(setting)),
                    cookies,
                );
            }
        };

        // Logout takes priority over every authentication path
        if let Some(encoded_chain) = query.get(SSO_URLS_PARAM).filter(|v| !v.is_empty()) {
            let return_url = query.get(RETURN_URL_PARAM).map_or("", String::as_str);
            return match logout::run_hop(
                cookies.clone(),
                required.cookie_key,
                encoded_chain,
                &absolute_url,
                return_url,
            ) {
                Ok((jar, next)) => GateOutcome::new(
                    Decision::LogoutRedirect(next.location(required.base_url)),
                    jar,
                ),
                Err(e) => {
                    tracing::warn!(target: "sso.gate", error = %e, "Rejecting malformed logout chain");
                    GateOutcome::new(Decision::Reject(SsoError::ChainDecode), cookies)
                }
            };
        }

        let mut jar = cookies;

        let cookie_token = session::read(&jar, required.cookie_key);
        let had_cookie = cookie_token.is_some();
        let presented = cookie_token.or_else(|| authorization.as_deref().and_then(bearer_token));

        if let Some(token) = presented {
            match auth::verify(&token, required.secret_key) {
                Ok(principal) => {
                    return self.check_roles(policy, required, &token, principal, jar).await;
                }
                Err(e) => {
                    tracing::warn!(
                        target: "sso.gate",
                        reason = %e,
                        from_cookie = had_cookie,
                        "Session token rejected, treating session as absent"
                    );
                    if had_cookie {
                        jar = session::clear(jar, required.cookie_key);
                    }
                }
            }
        }

        if let Some(ticket) = query.get(TICKET_PARAM).filter(|t| !t.is_empty()) {
            let from = canonical_from(&application_url);
            match self
                .issuer
                .exchange_ticket(required.base_url, &from, ticket, &client_ip)
                .await
            {
                Ok(token) => {
                    jar = session::write(jar, required.cookie_key, &token, required.cookie_time);
                    match auth::verify(&token, required.secret_key) {
                        Ok(principal) => {
                            tracing::info!(target: "sso.gate", "Ticket exchanged for a new session");
                            return self.check_roles(policy, required, &token, principal, jar).await;
                        }
                        Err(e) => {
                            tracing::warn!(
                                target: "sso.gate",
                                reason = %e,
                                "Issued session token failed verification"
                            );
                            jar = session::clear(jar, required.cookie_key);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "sso.gate", error = %e, "Ticket exchange failed");
                }
            }
        }

        login(required.base_url, &absolute_url, redirect_unauthorized, jar)
    }

    async fn check_roles(
        &self,
        policy: &AccessPolicy,
        required: RequiredSettings<'_>,
        token: &str,
        principal: Principal,
        jar: CookieJar,
    ) -> GateOutcome {
        if policy.required_roles.is_empty() {
            return GateOutcome::new(Decision::Allow(Some(principal)), jar);
        }

        let granted = match self.issuer.fetch_roles(required.base_url, token).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(target: "sso.gate", error = %e, "Role fetch failed, assuming no roles");
                HashSet::new()
            }
        };

        if policy.roles_satisfied(&granted) {
            GateOutcome::new(Decision::Allow(Some(principal)), jar)
        } else {
            tracing::info!(
                target: "sso.gate",
                required = ?policy.required_roles,
                granted = granted.len(),
                "Principal lacks every required role"
            );
            GateOutcome::new(Decision::Reject(SsoError::AuthorizationFault), jar)
        }
    }
}

fn login(
    issuer_base_url: &str,
    absolute_url: &str,
    redirect_unauthorized: bool,
    jar: CookieJar,
) -> GateOutcome {
    if !redirect_unauthorized {
        return GateOutcome::new(Decision::Reject(SsoError::Unauthorized), jar);
    }
    GateOutcome::new(
        Decision::LoginRedirect(login_url(issuer_base_url, absolute_url)),
        jar,
    )
}

/// Identity server login URL returning to `absolute_url`.
pub fn login_url(issuer_base_url: &str, absolute_url: &str) -> String {
    format!(
        "{}{}?{}={}",
        issuer_base_url.trim_end_matches('/'),
        LOGIN_PATH,
        RETURN_URL_PARAM,
        urlencoding::encode(absolute_url)
    )
}

/// Application base URL with the scheme and trailing slash removed.
///
/// This is the `from` value the identity server keys issued tickets on.
pub fn canonical_from(application_url: &str) -> String {
    let without_scheme = application_url
        .strip_prefix("https://")
        .or_else(|| application_url.strip_prefix("http://"))
        .unwrap_or(application_url);
    without_scheme.trim_end_matches('/').to_string()
}

/// Token carried in an `Authorization` header, with or without `Bearer `.
fn bearer_token(header: &str) -> Option<String> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
