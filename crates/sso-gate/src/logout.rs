//! Distributed logout chain.
//!
//! A logout started at the identity server visits every site the user
//! signed into during the SSO session. The list of sites still to visit
//! travels in the `ssourls` query parameter as base64url-encoded JSON; each
//! hop clears its own session cookie, removes itself from the list and
//! redirects to the next site. When the list is empty the browser is sent
//! back to the identity server with the original `returnUrl`.
//!
//! Sites identify themselves by substring containment: the first entry that
//! occurs anywhere in the absolute request URL is removed. A short entry can
//! therefore match an unrelated URL; deployed chains rely on this matching,
//! so it is kept as is.

use crate::session;
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

/// Query parameter carrying the encoded chain.
pub const SSO_URLS_PARAM: &str = "ssourls";

/// Query parameter carrying the final destination.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// Malformed `ssourls` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainDecodeError {
    #[error("Logout chain is not valid base64")]
    Base64,

    #[error("Logout chain is not a JSON array of strings")]
    Json,
}

/// Ordered list of site base URLs still requiring cookie clearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutChain(Vec<String>);

/// Where the current hop sends the browser next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextHop {
    /// Continue the chain at `site`, carrying the re-encoded remaining chain.
    RedirectToHop {
        site: String,
        encoded_chain: String,
        return_url: String,
    },
    /// Chain exhausted; return to the identity server.
    RedirectToIssuer { return_url: String },
}

impl LogoutChain {
    pub fn new(sites: Vec<String>) -> Self {
        Self(sites)
    }

    pub fn sites(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as unpadded base64url of the JSON array.
    pub fn encode(&self) -> String {
        // Serializing a Vec<String> cannot fail
        let json = serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string());
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode an `ssourls` value.
    ///
    /// Accepts the URL-safe or the standard alphabet, padded or not. A `+`
    /// turned into a space by query-string decoding is restored.
    ///
    /// # Errors
    ///
    /// Returns `ChainDecodeError` if the value is not base64 or the decoded
    /// bytes are not a JSON array of strings.
    pub fn decode(encoded: &str) -> Result<Self, ChainDecodeError> {
        let normalized: String = encoded
            .trim()
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '+' | ' ' => '-',
                '/' => '_',
                other => other,
            })
            .collect();

        let bytes = URL_SAFE_NO_PAD.decode(normalized).map_err(|e| {
            tracing::debug!(target: "sso.logout", error = %e, "Logout chain base64 decode failed");
            ChainDecodeError::Base64
        })?;

        let sites: Vec<String> = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(target: "sso.logout", error = %e, "Logout chain JSON decode failed");
            ChainDecodeError::Json
        })?;

        Ok(Self(sites))
    }

    /// Remove the first entry contained in `absolute_url`.
    ///
    /// Returns the chain unchanged when no entry matches.
    pub fn without_current_site(&self, absolute_url: &str) -> Self {
        let mut sites = self.0.clone();
        if let Some(index) = sites.iter().position(|site| absolute_url.contains(site.as_str())) {
            sites.remove(index);
        }
        Self(sites)
    }

    /// Drop the current site and decide the next redirect.
    pub fn advance(&self, absolute_url: &str, return_url: &str) -> NextHop {
        let remaining = self.without_current_site(absolute_url);

        match remaining.0.first() {
            Some(site) => NextHop::RedirectToHop {
                site: site.clone(),
                encoded_chain: remaining.encode(),
                return_url: return_url.to_string(),
            },
            None => NextHop::RedirectToIssuer {
                return_url: return_url.to_string(),
            },
        }
    }
}

impl NextHop {
    /// Redirect target for this hop.
    pub fn location(&self, issuer_base_url: &str) -> String {
        match self {
            NextHop::RedirectToHop {
                site,
                encoded_chain,
                return_url,
            } => format!(
                "{}?{}={}&{}={}",
                site,
                SSO_URLS_PARAM,
                encoded_chain,
                RETURN_URL_PARAM,
                urlencoding::encode(return_url)
            ),
            NextHop::RedirectToIssuer { return_url } => format!(
                "{}?{}={}",
                issuer_base_url,
                RETURN_URL_PARAM,
                urlencoding::encode(return_url)
            ),
        }
    }
}

/// Run one logout hop: decode the chain, clear this site's session cookie,
/// and decide where to go next.
///
/// Nothing is cleared when the chain does not decode.
///
/// # Errors
///
/// Returns `ChainDecodeError` for a malformed `ssourls` value.
pub fn run_hop(
    jar: CookieJar,
    cookie_key: &str,
    encoded_chain: &str,
    absolute_url: &str,
    return_url: &str,
) -> Result<(CookieJar, NextHop), ChainDecodeError> {
    let chain = LogoutChain::decode(encoded_chain)?;
    let jar = session::clear(jar, cookie_key);
    let next = chain.advance(absolute_url, return_url);

    tracing::info!(
        target: "sso.logout",
        chain_len = chain.len(),
        last_hop = matches!(next, NextHop::RedirectToIssuer { .. }),
        "Logout hop completed"
    );

    Ok((jar, next))
}
