//! HTTP routes for the demo service.
//!
//! Every route sits behind the SSO gate. The router-level declaration
//! requires authentication; individual endpoints relax or tighten it.

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use sso_gate::{sso_authorize, AccessPolicy, AuthAttribute, Principal, SsoGate, SsoGuard};
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

#[derive(Debug, Serialize)]
struct AdminResponse {
    identity: Option<String>,
    area: &'static str,
}

async fn health() -> &'static str {
    "OK"
}

async fn me(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

async fn admin(Extension(principal): Extension<Principal>) -> Json<AdminResponse> {
    Json(AdminResponse {
        identity: principal.identity().map(ToString::to_string),
        area: "admin",
    })
}

async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

fn guarded(gate: &SsoGate, endpoint: &[AuthAttribute], redirect: bool) -> SsoGuard {
    // Router-level declaration shared by every endpoint
    let controller = [AuthAttribute::authorize()];
    let guard = SsoGuard::new(
        gate.clone(),
        AccessPolicy::from_declarations(&controller, endpoint),
    );
    if redirect {
        guard
    } else {
        guard.without_redirect()
    }
}

/// Build the application routes.
///
/// - `/health` - anonymous
/// - `/me` - any authenticated principal, browser redirect to login
/// - `/api/me` - same, but 401 envelope instead of a redirect
/// - `/admin` - requires the `admin` or `owner` role
/// - `/metrics` - Prometheus scrape endpoint, anonymous, when a handle is given
pub fn build_routes(gate: SsoGate, metrics_handle: Option<PrometheusHandle>) -> Router {
    let health_routes = Router::new().route("/health", get(health)).route_layer(
        from_fn_with_state(
            guarded(&gate, &[AuthAttribute::AllowAnonymous], true),
            sso_authorize,
        ),
    );

    let browser_routes = Router::new()
        .route("/me", get(me))
        .route_layer(from_fn_with_state(guarded(&gate, &[], true), sso_authorize));

    let api_routes = Router::new()
        .route("/api/me", get(me))
        .route_layer(from_fn_with_state(guarded(&gate, &[], false), sso_authorize));

    let admin_routes = Router::new().route("/admin", get(admin)).route_layer(
        from_fn_with_state(
            guarded(&gate, &[AuthAttribute::roles("admin,owner")], true),
            sso_authorize,
        ),
    );

    let mut app = Router::new()
        .merge(health_routes)
        .merge(browser_routes)
        .merge(api_routes)
        .merge(admin_routes);

    if let Some(handle) = metrics_handle {
        app = app.merge(
            Router::new()
                .route("/metrics", get(metrics))
                .with_state(handle),
        );
    }

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    app.layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
