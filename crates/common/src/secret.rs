//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use these types
//! for the shared signing secret and for any session token that is held
//! longer than a single function call.
//!
//! `SecretString` implements `Debug` with redaction, so any struct deriving
//! `Debug` that contains a secret gets safe logging behavior for free.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct IssuerSettings {
//!     base_url: String,
//!     secret_key: SecretString,
//! }
//!
//! let settings = IssuerSettings {
//!     base_url: "https://sso.example.com".to_string(),
//!     secret_key: SecretString::from("shared-secret"),
//! };
//!
//! // The secret is redacted
//! assert!(!format!("{settings:?}").contains("shared-secret"));
//!
//! // Reading the value is explicit
//! let key: &str = settings.secret_key.expose_secret();
//! assert_eq!(key, "shared-secret");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
