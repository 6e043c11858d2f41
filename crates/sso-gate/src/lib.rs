//! SSO Gate Library
//!
//! Single-sign-on authorization for axum services that delegate login to a
//! central identity server:
//!
//! - Session token verification (shared-secret HMAC JWT)
//! - Cookie-backed sessions
//! - One-time ticket exchange and role lookup against the identity server
//! - Distributed logout chains across every signed-in site
//!
//! # Architecture
//!
//! ```text
//! middleware/auth.rs -> gate.rs -> { auth, session, logout, services }
//! ```
//!
//! The gate itself is framework independent; `middleware` adapts it to axum.
//!
//! # Modules
//!
//! - `config` - Gate settings from environment or explicit map
//! - `errors` - Request-level errors and the JSON error envelope
//! - `auth` - Token verification and the `Principal`
//! - `session` - Session cookie read/write/clear
//! - `services` - Identity server clients
//! - `logout` - Distributed logout chain
//! - `policy` - Per-endpoint access policy
//! - `gate` - The authorization state machine
//! - `middleware` - axum middleware adapter

pub mod auth;
pub mod config;
pub mod errors;
pub mod gate;
pub mod logout;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod policy;
pub mod services;
pub mod session;

pub use auth::Principal;
pub use config::SsoSettings;
pub use errors::SsoError;
pub use gate::SsoGate;
pub use middleware::{sso_authorize, PrincipalExt, SsoGuard};
pub use policy::{AccessPolicy, AuthAttribute};
