//! Verified principal.
//!
//! Contains the claims extracted from a verified session token. The `sub`
//! field and custom claim values are redacted in Debug output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identity attached to the request once its session token has verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Subject (user identifier) - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Every other claim the identity server put in the token.
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.claim_str("name"))
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("claims", &self.claims.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Principal {
    /// Look up an additional claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Look up an additional claim that holds a string.
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claim(name).and_then(Value::as_str)
    }

    /// Best human-readable identity: `name`, then `unique_name`, then `sub`.
    ///
    /// Only string-valued claims count; a multi-valued `name` is skipped.
    pub fn identity(&self) -> Option<&str> {
        self.claim_str("name")
            .or_else(|| self.claim_str("unique_name"))
            .or(self.sub.as_deref())
    }
}
