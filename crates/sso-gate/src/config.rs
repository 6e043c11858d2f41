//! SSO gate configuration.
//!
//! Settings are loaded once at process start, either from the environment or
//! from an explicit map. Each setting is recognized under its option name
//! (`ssoBaseUrl`, `ssoSecretKey`, `ssoCookieKey`, `ssoCookieTime`) and under
//! an environment-style alias (`SSO_BASE_URL`, ...).
//!
//! The four required settings are NOT enforced at load time. A gate built
//! from incomplete settings still serves anonymous endpoints and reports the
//! first missing setting on every protected request.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Literal `ssoCookieTime` value selecting a browser-session cookie.
pub const SESSION_COOKIE_TIME: &str = "session";

/// Default timeout for identity server calls in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 5;

/// Upper bound for a minute-valued `ssoCookieTime` (ten years).
pub const MAX_COOKIE_MINUTES: u32 = 60 * 24 * 365 * 10;

/// Upper bound for `SSO_UPSTREAM_TIMEOUT_SECONDS`.
pub const MAX_UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

/// One of the four settings the gate cannot operate without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setting {
    BaseUrl,
    SecretKey,
    CookieKey,
    CookieTime,
}

impl Setting {
    /// All required settings in the order they are checked.
    pub const ALL: [Setting; 4] = [
        Setting::BaseUrl,
        Setting::SecretKey,
        Setting::CookieKey,
        Setting::CookieTime,
    ];

    /// Option name as it appears in application settings.
    pub fn option_name(self) -> &'static str {
        match self {
            Setting::BaseUrl => "ssoBaseUrl",
            Setting::SecretKey => "ssoSecretKey",
            Setting::CookieKey => "ssoCookieKey",
            Setting::CookieTime => "ssoCookieTime",
        }
    }

    /// Environment variable alias for the option.
    pub fn env_alias(self) -> &'static str {
        match self {
            Setting::BaseUrl => "SSO_BASE_URL",
            Setting::SecretKey => "SSO_SECRET_KEY",
            Setting::CookieKey => "SSO_COOKIE_KEY",
            Setting::CookieTime => "SSO_COOKIE_TIME",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_name())
    }
}

/// Lifetime policy for the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieTtl {
    /// No explicit expiry; the browser drops the cookie when the session ends.
    Session,
    /// Expires this many minutes after it is issued.
    Minutes(u32),
}

impl FromStr for CookieTtl {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == SESSION_COOKIE_TIME {
            return Ok(CookieTtl::Session);
        }

        let minutes = value.trim().parse::<u32>().map_err(|e| {
            ConfigError::InvalidCookieTime(format!(
                "ssoCookieTime must be \"{}\" or a whole number of minutes, got '{}': {}",
                SESSION_COOKIE_TIME, value, e
            ))
        })?;

        if minutes > MAX_COOKIE_MINUTES {
            return Err(ConfigError::InvalidCookieTime(format!(
                "ssoCookieTime must be at most {} minutes, got {}",
                MAX_COOKIE_MINUTES, minutes
            )));
        }

        Ok(CookieTtl::Minutes(minutes))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid cookie time configuration: {0}")]
    InvalidCookieTime(String),

    #[error("Invalid upstream timeout configuration: {0}")]
    InvalidUpstreamTimeout(String),
}

/// Immutable gate configuration.
///
/// The shared secret is held as a `SecretString` and redacted in Debug output.
pub struct SsoSettings {
    /// Identity server base URL.
    pub base_url: Option<String>,

    /// Shared HS256 signing secret.
    pub secret_key: Option<SecretString>,

    /// Name of the session cookie.
    pub cookie_key: Option<String>,

    /// Session cookie lifetime policy.
    pub cookie_time: Option<CookieTtl>,

    /// Timeout applied to ticket exchange and role fetch.
    pub upstream_timeout: Duration,
}

/// Borrowed view of settings after the required-setting guard has passed.
#[derive(Clone, Copy)]
pub struct RequiredSettings<'a> {
    pub base_url: &'a str,
    pub secret_key: &'a SecretString,
    pub cookie_key: &'a str,
    pub cookie_time: CookieTtl,
}

impl fmt::Debug for SsoSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoSettings")
            .field("base_url", &self.base_url)
            .field(
                "secret_key",
                &self.secret_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("cookie_key", &self.cookie_key)
            .field("cookie_time", &self.cookie_time)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl SsoSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load settings from a HashMap (for testing and embedding).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let lookup = |setting: Setting| -> Option<String> {
            vars.get(setting.option_name())
                .or_else(|| vars.get(setting.env_alias()))
                .filter(|value| !value.is_empty())
                .cloned()
        };

        let cookie_time = lookup(Setting::CookieTime)
            .map(|value| value.parse::<CookieTtl>())
            .transpose()?;

        let upstream_timeout = if let Some(value_str) = vars.get("SSO_UPSTREAM_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidUpstreamTimeout(format!(
                    "SSO_UPSTREAM_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_UPSTREAM_TIMEOUT_SECONDS {
                return Err(ConfigError::InvalidUpstreamTimeout(format!(
                    "SSO_UPSTREAM_TIMEOUT_SECONDS must be between 1 and {}, got {}",
                    MAX_UPSTREAM_TIMEOUT_SECONDS, value
                )));
            }

            Duration::from_secs(value)
        } else {
            Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECONDS)
        };

        Ok(SsoSettings {
            base_url: lookup(Setting::BaseUrl),
            secret_key: lookup(Setting::SecretKey).map(SecretString::from),
            cookie_key: lookup(Setting::CookieKey),
            cookie_time,
            upstream_timeout,
        })
    }

    /// Check the four required settings in order.
    ///
    /// Returns the first missing setting; later settings are not inspected.
    pub fn require(&self) -> Result<RequiredSettings<'_>, Setting> {
        let base_url = self.base_url.as_deref().ok_or(Setting::BaseUrl)?;
        let secret_key = self.secret_key.as_ref().ok_or(Setting::SecretKey)?;
        let cookie_key = self.cookie_key.as_deref().ok_or(Setting::CookieKey)?;
        let cookie_time = self.cookie_time.ok_or(Setting::CookieTime)?;

        Ok(RequiredSettings {
            base_url,
            secret_key,
            cookie_key,
            cookie_time,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "ssoBaseUrl".to_string(),
                "https://sso.example.com".to_string(),
            ),
            ("ssoSecretKey".to_string(), "shared-secret".to_string()),
            ("ssoCookieKey".to_string(), "sso_token".to_string()),
            ("ssoCookieTime".to_string(), "session".to_string()),
        ])
    }

    #[test]
    fn test_from_vars_complete() {
        let settings = SsoSettings::from_vars(&base_vars()).unwrap();

        let required = settings.require().unwrap();
        assert_eq!(required.base_url, "https://sso.example.com");
        assert_eq!(required.secret_key.expose_secret(), "shared-secret");
        assert_eq!(required.cookie_key, "sso_token");
        assert_eq!(required.cookie_time, CookieTtl::Session);
        assert_eq!(
            settings.upstream_timeout,
            Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECONDS)
        );
    }

    #[test]
    fn test_from_vars_env_aliases() {
        let vars = HashMap::from([
            ("SSO_BASE_URL".to_string(), "https://sso.example.com".to_string()),
            ("SSO_SECRET_KEY".to_string(), "k".to_string()),
            ("SSO_COOKIE_KEY".to_string(), "c".to_string()),
            ("SSO_COOKIE_TIME".to_string(), "30".to_string()),
        ]);

        let settings = SsoSettings::from_vars(&vars).unwrap();
        let required = settings.require().unwrap();
        assert_eq!(required.cookie_time, CookieTtl::Minutes(30));
    }

    #[test]
    fn test_option_name_wins_over_alias() {
        let mut vars = base_vars();
        vars.insert("SSO_COOKIE_KEY".to_string(), "alias".to_string());

        let settings = SsoSettings::from_vars(&vars).unwrap();
        assert_eq!(settings.cookie_key.as_deref(), Some("sso_token"));
    }

    #[test]
    fn test_each_missing_setting_is_reported() {
        for setting in Setting::ALL {
            let mut vars = base_vars();
            vars.remove(setting.option_name());

            let settings = SsoSettings::from_vars(&vars).unwrap();
            assert_eq!(settings.require().err(), Some(setting));
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("ssoSecretKey".to_string(), String::new());

        let settings = SsoSettings::from_vars(&vars).unwrap();
        assert_eq!(settings.require().err(), Some(Setting::SecretKey));
    }

    #[test]
    fn test_first_missing_setting_is_reported() {
        let settings = SsoSettings::from_vars(&HashMap::new()).unwrap();
        assert_eq!(settings.require().err(), Some(Setting::BaseUrl));
    }

    #[test]
    fn test_cookie_time_parsing() {
        assert_eq!("session".parse::<CookieTtl>().unwrap(), CookieTtl::Session);
        assert_eq!("0".parse::<CookieTtl>().unwrap(), CookieTtl::Minutes(0));
        assert_eq!("120".parse::<CookieTtl>().unwrap(), CookieTtl::Minutes(120));
        assert!("Session".parse::<CookieTtl>().is_err());
        assert!("-5".parse::<CookieTtl>().is_err());
        assert!("ten".parse::<CookieTtl>().is_err());
    }

    #[test]
    fn test_invalid_cookie_time_fails_load() {
        let mut vars = base_vars();
        vars.insert("ssoCookieTime".to_string(), "forever".to_string());

        let result = SsoSettings::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::InvalidCookieTime(_))));
    }

    #[test]
    fn test_cookie_time_upper_bound() {
        assert_eq!(
            MAX_COOKIE_MINUTES.to_string().parse::<CookieTtl>().unwrap(),
            CookieTtl::Minutes(MAX_COOKIE_MINUTES)
        );
        assert!(matches!(
            (MAX_COOKIE_MINUTES + 1).to_string().parse::<CookieTtl>(),
            Err(ConfigError::InvalidCookieTime(_))
        ));

        let mut vars = base_vars();
        vars.insert("ssoCookieTime".to_string(), u32::MAX.to_string());
        assert!(matches!(
            SsoSettings::from_vars(&vars),
            Err(ConfigError::InvalidCookieTime(_))
        ));
    }

    #[test]
    fn test_upstream_timeout_custom_and_bounds() {
        let mut vars = base_vars();
        vars.insert("SSO_UPSTREAM_TIMEOUT_SECONDS".to_string(), "3".to_string());
        let settings = SsoSettings::from_vars(&vars).unwrap();
        assert_eq!(settings.upstream_timeout, Duration::from_secs(3));

        for bad in ["0", "31", "abc"] {
            vars.insert("SSO_UPSTREAM_TIMEOUT_SECONDS".to_string(), bad.to_string());
            let result = SsoSettings::from_vars(&vars);
            assert!(
                matches!(result, Err(ConfigError::InvalidUpstreamTimeout(_))),
                "expected rejection for {bad}"
            );
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let settings = SsoSettings::from_vars(&base_vars()).unwrap();
        let debug_str = format!("{:?}", settings);

        assert!(!debug_str.contains("shared-secret"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(debug_str.contains("sso_token"));
    }
}
