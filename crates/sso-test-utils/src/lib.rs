//! # SSO Test Utilities
//!
//! Shared test utilities for the SSO gate.
//!
//! This crate provides:
//! - Signed session token builders (`TestTokenBuilder`)
//! - A stub identity server (`StubIssuer`) built on wiremock
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sso_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let issuer = StubIssuer::start().await;
//!     let token = TestTokenBuilder::new().for_user("alice").sign(TEST_SECRET);
//!     issuer.issue_token("T1", &token).await;
//!
//!     let settings = SsoSettings::from_vars(&issuer.settings_vars("sso_token")).unwrap();
//!     // build the gate and drive requests through it
//! }
//! ```

pub mod stub_issuer;
pub mod token_builders;

// Re-export commonly used items
pub use stub_issuer::*;
pub use token_builders::*;
