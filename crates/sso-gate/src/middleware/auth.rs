//! SSO middleware for protected routes.
//!
//! Runs the [`SsoGate`] for each request and maps its decision onto an axum
//! response. Cookie changes made by the gate are attached to every response,
//! including the handler's own response on allow.

use crate::auth::Principal;
use crate::gate::{Decision, GateOutcome, SsoGate};
use crate::middleware::request_url;
use crate::policy::AccessPolicy;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

/// Per-route state for [`sso_authorize`].
#[derive(Clone)]
pub struct SsoGuard {
    /// Shared gate.
    pub gate: SsoGate,

    /// Access policy of the guarded routes.
    pub policy: Arc<AccessPolicy>,

    /// Redirect unauthenticated browsers to the login page. When unset, they
    /// get a 401 envelope instead.
    pub redirect_unauthorized: bool,
}

impl SsoGuard {
    /// Guard that redirects unauthenticated requests to the login page.
    pub fn new(gate: SsoGate, policy: AccessPolicy) -> Self {
        Self {
            gate,
            policy: Arc::new(policy),
            redirect_unauthorized: true,
        }
    }

    /// Answer unauthenticated requests with 401 instead of a redirect.
    pub fn without_redirect(mut self) -> Self {
        self.redirect_unauthorized = false;
        self
    }
}

/// SSO authorization middleware.
///
/// Use with `axum::middleware::from_fn_with_state(guard, sso_authorize)`.
///
/// # Response
///
/// - Allow: the handler runs with the [`Principal`] in request extensions
/// - Login or logout redirect: 302 Found with `Location`
/// - Rejection: JSON error envelope (see [`crate::errors::SsoError`])
#[instrument(skip_all, name = "sso.middleware.authorize")]
pub async fn sso_authorize(State(guard): State<SsoGuard>, mut req: Request, next: Next) -> Response {
    let gate_request = request_url::gate_request(&req);

    let GateOutcome { decision, cookies } = guard
        .gate
        .authorize(&guard.policy, guard.redirect_unauthorized, gate_request)
        .await;

    match decision {
        Decision::Allow(principal) => {
            if let Some(principal) = principal {
                req.extensions_mut().insert(principal);
            }
            (cookies, next.run(req).await).into_response()
        }
        Decision::LoginRedirect(location) | Decision::LogoutRedirect(location) => {
            tracing::debug!(target: "sso.middleware", "Redirecting request");
            (StatusCode::FOUND, cookies, [(header::LOCATION, location)]).into_response()
        }
        Decision::Reject(err) => (cookies, err).into_response(),
    }
}

/// Extension trait for extracting the principal from a request.
pub trait PrincipalExt {
    /// Principal attached by [`sso_authorize`].
    ///
    /// Returns `None` on anonymous routes or when the middleware was not applied.
    fn principal(&self) -> Option<&Principal>;
}

impl<B> PrincipalExt for axum::extract::Request<B> {
    fn principal(&self) -> Option<&Principal> {
        self.extensions().get::<Principal>()
    }
}
