//! Domain normalization.
//!
//! Turns raw navigation URLs into the two gating keys:
//!
//! - **domain**: lowercase host, no scheme, no leading `www.`, no port,
//!   path, query or fragment (`https://www.News.com:8443/a?b#c` -> `news.com`)
//! - **exact URL**: the page origin, scheme + host (+ non-default port),
//!   with path, query and fragment dropped (`https://news.com/a` ->
//!   `https://news.com`)
//!
//! Anything that is not an HTTP(S) page with a host normalizes to the empty
//! string, which callers treat as "no gating possible here".

use url::Url;

use crate::error::GateError;

/// Normalize the first candidate URL of a tab query.
///
/// An empty candidate list, an internal page (`chrome://newtab/`,
/// `about:blank`) or a malformed URL yields `""`.
pub fn normalize<S: AsRef<str>>(urls: &[S], exact: bool) -> String {
    let Some(raw) = urls.first() else {
        return String::new();
    };
    let Some(url) = parse_http(raw.as_ref()) else {
        return String::new();
    };

    if exact {
        url.origin().ascii_serialization()
    } else {
        bare_domain(&url)
    }
}

/// Convenience wrapper for a single URL in non-exact mode.
pub fn domain_of(raw: &str) -> String {
    normalize(&[raw], false)
}

/// Convenience wrapper for a single URL in exact mode.
pub fn exact_of(raw: &str) -> String {
    normalize(&[raw], true)
}

fn bare_domain(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

fn parse_http(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let url = match Url::parse(raw) {
        Ok(url) if is_http(&url) => url,
        // `localhost:3000` parses with `localhost` as the scheme.
        Ok(url) if looks_like_host_port(&url) => Url::parse(&format!("http://{raw}")).ok()?,
        Ok(_) => return None,
        // Bare hosts such as an already-normalized `news.com`.
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("http://{raw}")).ok()?
        }
        Err(_) => return None,
    };

    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url),
        _ => None,
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn looks_like_host_port(url: &Url) -> bool {
    if !url.cannot_be_a_base() {
        return false;
    }
    let port = url.path().split('/').next().unwrap_or_default();
    !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
}

/// Both gating keys for one page, plus the raw href they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIdentity {
    pub href: String,
    pub domain: String,
    pub exact_url: String,
}

impl PageIdentity {
    /// Build the identity from tab-query candidates.
    ///
    /// Returns [`GateError::EmptyDomain`] when the page cannot be gated.
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> Result<Self, GateError> {
        let domain = normalize(urls, false);
        if domain.is_empty() {
            return Err(GateError::EmptyDomain);
        }
        let exact_url = normalize(urls, true);
        let href = urls
            .first()
            .map(|u| u.as_ref().trim().to_string())
            .unwrap_or_default();
        Ok(Self {
            href,
            domain,
            exact_url,
        })
    }

    pub fn from_href(href: &str) -> Result<Self, GateError> {
        Self::from_urls(&[href])
    }
}
