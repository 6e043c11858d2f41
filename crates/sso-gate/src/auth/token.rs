//! Session token verification.
//!
//! Verifies tokens signed by the identity server with the shared secret and
//! extracts the [`Principal`].
//!
//! # Security
//!
//! - Tokens are size- and shape-checked BEFORE parsing (DoS prevention)
//! - Only HMAC algorithms are accepted; `none` and asymmetric algorithms fail
//! - `exp` is required and validated with clock skew tolerance
//! - `iat`, when present, may not lie beyond the clock skew

use crate::auth::principal::Principal;
use common::jwt::{check_token_shape, validate_iat, DEFAULT_CLOCK_SKEW};
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use thiserror::Error;

/// Reasons a session token fails verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature, algorithm or a non-lifetime claim check failed.
    #[error("Session token signature or claims are invalid")]
    InvalidToken,

    /// Token is past its validity window.
    #[error("Session token has expired")]
    Expired,

    /// Token could not be parsed.
    #[error("Session token is malformed")]
    Malformed,
}

/// Verify a session token and extract its principal.
///
/// # Security Checks
///
/// 1. Size and structure check before any decoding
/// 2. HMAC signature check with the shared secret
/// 3. `exp` (required) and `nbf` with clock skew leeway
/// 4. `iat` not too far in the future
///
/// # Errors
///
/// - `TokenError::Malformed` - Not a parseable JWT
/// - `TokenError::Expired` - Past `exp`
/// - `TokenError::InvalidToken` - Any other verification failure
pub fn verify(token: &str, secret_key: &SecretString) -> Result<Principal, TokenError> {
    check_token_shape(token).map_err(|e| {
        tracing::debug!(target: "sso.token", error = ?e, "Token shape check failed");
        TokenError::Malformed
    })?;

    let decoding_key = DecodingKey::from_secret(secret_key.expose_secret().as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = DEFAULT_CLOCK_SKEW.as_secs();
    validation.validate_exp = true;
    validation.validate_nbf = true;
    // Audience and issuer are not part of the token contract
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    let token_data = decode::<Principal>(token, &decoding_key, &validation).map_err(|e| {
        let mapped = classify(e.kind());
        tracing::debug!(target: "sso.token", error = %e, reason = ?mapped, "Token verification failed");
        mapped
    })?;

    let principal = token_data.claims;

    if let Some(iat) = principal.iat {
        if let Err(e) = validate_iat(iat, DEFAULT_CLOCK_SKEW) {
            tracing::debug!(target: "sso.token", error = ?e, "Token iat validation failed");
            return Err(TokenError::InvalidToken);
        }
    }

    tracing::debug!(target: "sso.token", "Token verified successfully");
    Ok(principal)
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            TokenError::Malformed
        }
        _ => TokenError::InvalidToken,
    }
}
