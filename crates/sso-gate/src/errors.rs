//! SSO gate error types.
//!
//! Request-level failures render as the identity server's JSON envelope
//! `{"code": <int>, "message": "<error_code>", "result": ""}` so that browser
//! and API clients of every protected application see the same shape. Details
//! are logged server-side; the envelope never carries them.

use crate::config::Setting;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error codes carried in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BaseUrlNotConfig,
    SecretKeyNotConfig,
    CookieKeyNotConfig,
    CookieTimeNotConfig,
    AuthorizeFault,
}

impl ErrorCode {
    /// Numeric code.
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::BaseUrlNotConfig => 4001,
            ErrorCode::SecretKeyNotConfig => 4002,
            ErrorCode::CookieKeyNotConfig => 4003,
            ErrorCode::CookieTimeNotConfig => 4004,
            ErrorCode::AuthorizeFault => 4010,
        }
    }

    /// Symbolic name used as the envelope message.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::BaseUrlNotConfig => "baseUrl_not_config",
            ErrorCode::SecretKeyNotConfig => "secretKey_not_config",
            ErrorCode::CookieKeyNotConfig => "cookieKey_not_config",
            ErrorCode::CookieTimeNotConfig => "cookieTime_not_config",
            ErrorCode::AuthorizeFault => "authorize_fault",
        }
    }
}

impl From<Setting> for ErrorCode {
    fn from(setting: Setting) -> Self {
        match setting {
            Setting::BaseUrl => ErrorCode::BaseUrlNotConfig,
            Setting::SecretKey => ErrorCode::SecretKeyNotConfig,
            Setting::CookieKey => ErrorCode::CookieKeyNotConfig,
            Setting::CookieTime => ErrorCode::CookieTimeNotConfig,
        }
    }
}

/// Request-level gate failure.
///
/// Maps to HTTP status codes:
/// - ConfigMissing: 500 Internal Server Error
/// - Unauthorized: 401 Unauthorized
/// - AuthorizationFault: 403 Forbidden
/// - ChainDecode: 400 Bad Request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SsoError {
    #[error("Required setting not configured: {0}")]
    ConfigMissing(Setting),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Principal lacks a required role")]
    AuthorizationFault,

    #[error("Logout chain could not be decoded")]
    ChainDecode,
}

impl SsoError {
    /// Envelope error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            SsoError::ConfigMissing(setting) => ErrorCode::from(*setting),
            SsoError::Unauthorized | SsoError::AuthorizationFault | SsoError::ChainDecode => {
                ErrorCode::AuthorizeFault
            }
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            SsoError::ConfigMissing(_) => 500,
            SsoError::Unauthorized => 401,
            SsoError::AuthorizationFault => 403,
            SsoError::ChainDecode => 400,
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    code: i32,
    message: &'static str,
    result: &'static str,
}

impl IntoResponse for SsoError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let SsoError::ConfigMissing(setting) = &self {
            tracing::error!(target: "sso.config", setting = %setting, "Required SSO setting is not configured");
        }

        let error_code = self.error_code();
        let envelope = ErrorEnvelope {
            code: error_code.code(),
            message: error_code.name(),
            result: "",
        };

        (status, Json(envelope)).into_response()
    }
}
