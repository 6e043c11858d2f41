//! Cookie-backed session store.
//!
//! The session token lives in a single cookie per site. All operations take
//! and return an `axum-extra` [`CookieJar`]; changes made here become
//! `Set-Cookie` headers on whatever response the jar is returned with.

use crate::config::CookieTtl;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use time::OffsetDateTime;

const COOKIE_PATH: &str = "/";

/// Read the raw session token, if the cookie is present and non-empty.
pub fn read(jar: &CookieJar, cookie_key: &str) -> Option<String> {
    jar.get(cookie_key)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Set the session cookie.
///
/// `CookieTtl::Session` leaves the expiry unset so the browser drops the
/// cookie at the end of its session; otherwise the cookie expires `minutes`
/// from now. An expiry past the representable date range also falls back
/// to a browser-session cookie.
pub fn write(jar: CookieJar, cookie_key: &str, token: &str, ttl: CookieTtl) -> CookieJar {
    let mut cookie = Cookie::build((cookie_key.to_owned(), token.to_owned()))
        .path(COOKIE_PATH)
        .http_only(true);

    if let CookieTtl::Minutes(minutes) = ttl {
        match OffsetDateTime::now_utc().checked_add(time::Duration::minutes(i64::from(minutes))) {
            Some(expires) => cookie = cookie.expires(expires),
            None => tracing::warn!(
                target: "sso.session",
                minutes,
                "Cookie expiry out of range, falling back to a browser-session cookie"
            ),
        }
    }

    tracing::debug!(target: "sso.session", cookie = %cookie_key, ttl = ?ttl, "Session cookie set");
    jar.add(cookie)
}

/// Clear the session cookie if the request carried one.
///
/// Emits a removal cookie (expiry in the past). No-op when absent.
pub fn clear(jar: CookieJar, cookie_key: &str) -> CookieJar {
    if jar.get(cookie_key).is_none() {
        return jar;
    }

    tracing::debug!(target: "sso.session", cookie = %cookie_key, "Session cookie cleared");
    jar.remove(Cookie::build((cookie_key.to_owned(), "")).path(COOKIE_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};
    use axum::response::IntoResponse;

    fn jar_with(cookie_header: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie_header).unwrap());
        CookieJar::from_headers(&headers)
    }

    fn set_cookie_headers(jar: CookieJar) -> Vec<String> {
        let response = (jar, ()).into_response();
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_read_present_cookie() {
        let jar = jar_with("other=1; sso_token=abc.def.ghi");
        assert_eq!(read(&jar, "sso_token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_read_absent_cookie() {
        let jar = jar_with("other=1");
        assert!(read(&jar, "sso_token").is_none());
        assert!(read(&CookieJar::new(), "sso_token").is_none());
    }

    #[test]
    fn test_read_empty_cookie_is_absent() {
        let jar = jar_with("sso_token=");
        assert!(read(&jar, "sso_token").is_none());
    }

    #[test]
    fn test_write_session_cookie_has_no_expiry() {
        let jar = write(CookieJar::new(), "sso_token", "tok-abc", CookieTtl::Session);
        assert_eq!(read(&jar, "sso_token").as_deref(), Some("tok-abc"));

        let headers = set_cookie_headers(jar);
        assert_eq!(headers.len(), 1);
        let header = &headers[0];
        assert!(header.starts_with("sso_token=tok-abc"));
        assert!(header.contains("Path=/"));
        assert!(!header.contains("Expires"));
        assert!(!header.contains("Max-Age"));
    }

    #[test]
    fn test_write_minutes_cookie_sets_future_expiry() {
        let jar = write(CookieJar::new(), "sso_token", "tok-abc", CookieTtl::Minutes(30));

        let cookie = jar.get("sso_token").unwrap();
        let expires = cookie.expires_datetime().unwrap();
        let delta = expires - OffsetDateTime::now_utc();
        assert!(delta > time::Duration::minutes(29));
        assert!(delta <= time::Duration::minutes(30));

        let headers = set_cookie_headers(jar);
        assert!(headers[0].contains("Expires="));
    }

    #[test]
    fn test_write_out_of_range_minutes_omits_expiry() {
        let jar = write(CookieJar::new(), "sso_token", "tok-abc", CookieTtl::Minutes(u32::MAX));
        assert!(jar.get("sso_token").unwrap().expires_datetime().is_none());

        let headers = set_cookie_headers(jar);
        assert_eq!(headers.len(), 1);
        assert!(headers[0].starts_with("sso_token=tok-abc"));
        assert!(!headers[0].contains("Expires"));
    }

    #[test]
    fn test_clear_present_cookie_emits_removal() {
        let jar = clear(jar_with("sso_token=stale"), "sso_token");
        assert!(read(&jar, "sso_token").is_none());

        let headers = set_cookie_headers(jar);
        assert_eq!(headers.len(), 1);
        let header = &headers[0];
        assert!(header.starts_with("sso_token="));
        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("Path=/"));
    }

    #[test]
    fn test_clear_absent_cookie_is_noop() {
        let jar = clear(jar_with("other=1"), "sso_token");
        assert!(set_cookie_headers(jar).is_empty());
    }

    #[test]
    fn test_clear_after_write_drops_new_cookie() {
        let jar = write(CookieJar::new(), "sso_token", "tok", CookieTtl::Session);
        let jar = clear(jar, "sso_token");

        assert!(read(&jar, "sso_token").is_none());
        assert!(set_cookie_headers(jar).is_empty());
    }
}
