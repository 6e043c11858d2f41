//! Request context extraction.
//!
//! Builds a [`GateRequest`] from an axum request. Behind a reverse proxy the
//! browser-visible scheme and host come from `X-Forwarded-Proto` and
//! `X-Forwarded-Host`; the first comma-separated value of each is used.

use crate::gate::GateRequest;
use axum::extract::{ConnectInfo, Query, Request};
use axum::http::{header, HeaderMap, Uri};
use axum_extra::extract::cookie::CookieJar;
use std::collections::HashMap;
use std::net::SocketAddr;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";
const X_FORWARDED_HOST: &str = "x-forwarded-host";

/// Collect everything the gate needs from `req`.
pub fn gate_request(req: &Request) -> GateRequest {
    let headers = req.headers();
    let uri = req.uri();

    let scheme = scheme(headers, uri);
    let host = host(headers, uri);
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    let query = Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(query)| query)
        .unwrap_or_else(|e| {
            tracing::debug!(target: "sso.middleware", error = %e, "Ignoring unparseable query string");
            HashMap::new()
        });

    let client_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);

    GateRequest {
        absolute_url: format!("{scheme}://{host}{path_and_query}"),
        application_url: format!("{scheme}://{host}/"),
        query,
        client_ip,
        cookies: CookieJar::from_headers(headers),
        authorization,
    }
}

fn first_forwarded<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn scheme<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> &'a str {
    first_forwarded(headers, X_FORWARDED_PROTO)
        .or_else(|| uri.scheme_str())
        .unwrap_or("http")
}

fn host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> &'a str {
    first_forwarded(headers, X_FORWARDED_HOST)
        .or_else(|| headers.get(header::HOST).and_then(|v| v.to_str().ok()))
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn build(uri: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_absolute_url_from_host_header() {
        let req = build("/orders?id=1", &[("host", "app.x:8080")]);
        let gate_req = gate_request(&req);

        assert_eq!(gate_req.absolute_url, "http://app.x:8080/orders?id=1");
        assert_eq!(gate_req.application_url, "http://app.x:8080/");
        assert_eq!(gate_req.query.get("id").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_forwarded_headers_take_precedence() {
        let req = build(
            "/p",
            &[
                ("host", "internal:3000"),
                ("x-forwarded-proto", "https, http"),
                ("x-forwarded-host", "app.x"),
            ],
        );
        let gate_req = gate_request(&req);

        assert_eq!(gate_req.absolute_url, "https://app.x/p");
    }

    #[test]
    fn test_query_values_are_decoded() {
        let req = build("/p?returnUrl=https%3A%2F%2Fportal.x%2F&ticket=T1", &[("host", "a.x")]);
        let gate_req = gate_request(&req);

        assert_eq!(
            gate_req.query.get("returnUrl").map(String::as_str),
            Some("https://portal.x/")
        );
        assert_eq!(gate_req.query.get("ticket").map(String::as_str), Some("T1"));
    }

    #[test]
    fn test_client_ip_from_connect_info() {
        let mut req = build("/", &[("host", "a.x")]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 55000))));

        assert_eq!(gate_request(&req).client_ip, "10.1.2.3");
        assert_eq!(gate_request(&build("/", &[])).client_ip, "");
    }

    #[test]
    fn test_cookies_and_authorization_are_captured() {
        let req = build(
            "/",
            &[("host", "a.x"), ("cookie", "sso_token=abc"), ("authorization", "Bearer xyz")],
        );
        let gate_req = gate_request(&req);

        assert_eq!(gate_req.cookies.get("sso_token").unwrap().value(), "abc");
        assert_eq!(gate_req.authorization.as_deref(), Some("Bearer xyz"));
    }
}
