//! axum adapter for the SSO gate.
//!
//! # Components
//!
//! - `auth` - `sso_authorize` middleware and per-route `SsoGuard` state
//! - `request_url` - Absolute URL, query and client address extraction

pub mod auth;
pub mod request_url;

pub use auth::{sso_authorize, PrincipalExt, SsoGuard};
