//! Builder patterns for test session tokens
//!
//! Tokens are signed with HS256 and a shared secret, the same way the
//! identity server signs them.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Shared secret used by test settings unless a test picks its own.
pub const TEST_SECRET: &str = "sso-test-shared-secret";

/// Builder for signed test session tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_user("alice")
///     .with_claim("userid", "42")
///     .expires_in(3600)
///     .sign(TEST_SECRET);
/// ```
pub struct TestTokenBuilder {
    sub: String,
    name: Option<String>,
    exp: i64,
    iat: i64,
    extra: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder valid for one hour
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            name: None,
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            extra: Map::new(),
        }
    }

    /// Set the subject
    pub fn for_user(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the display name
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Add an arbitrary claim
    pub fn with_claim(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Set expiration in seconds from now (negative for already expired)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Token that expired an hour ago, well outside any clock skew leeway
    pub fn expired(self) -> Self {
        self.expires_in(-3600).issued_at((Utc::now() - Duration::seconds(7200)).timestamp())
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = self.extra;
        claims.insert("sub".to_string(), json!(self.sub));
        if let Some(name) = self.name {
            claims.insert("name".to_string(), json!(name));
        }
        claims.insert("exp".to_string(), json!(self.exp));
        claims.insert("iat".to_string(), json!(self.iat));
        Value::Object(claims)
    }

    /// Sign the claims with HS256
    pub fn sign(self, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &self.build(),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("HS256 signing of JSON claims should not fail")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
