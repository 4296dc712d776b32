//! Proxy-facing URL construction.
//!
//! Every URL the proxy hands back to a browser (landing redirects, rewritten
//! `Location` headers, rewritten HTML attributes) goes through
//! [`PublicOrigin`], so the target host always ends up as a subdomain label
//! of the proxy's own domain.

use url::Url;

use crate::config::{ProxyConfig, SchemePolicy};

/// How the proxy is reachable from the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicOrigin {
    scheme: &'static str,
    base_domain: String,
    port: u16,
}

impl PublicOrigin {
    pub fn new(scheme: &'static str, base_domain: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            base_domain: base_domain.into().trim_matches('.').to_ascii_lowercase(),
            port,
        }
    }

    /// Apply the configured scheme policy.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let scheme = match config.proxy.scheme {
            SchemePolicy::Https => "https",
            SchemePolicy::Http => "http",
            SchemePolicy::Inbound if config.tls_enabled() => "https",
            SchemePolicy::Inbound => "http",
        };
        Self::new(scheme, config.proxy.base_domain.clone(), config.proxy.public_port)
    }

    pub fn scheme(&self) -> &'static str {
        self.scheme
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `scheme://<host>.<base_domain>:<port>`
    pub fn origin_for(&self, host: &str) -> String {
        format!("{}://{}.{}:{}", self.scheme, host, self.base_domain, self.port)
    }

    /// True when `host` already points at the proxy.
    pub fn is_proxied_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        host == self.base_domain
            || host
                .strip_suffix(&self.base_domain)
                .is_some_and(|rest| rest.ends_with('.'))
    }

    /// Redirect form: `origin[/<path>][?<query>]`, fragment dropped.
    ///
    /// Used for landing redirects and `Location` headers. Returns `None` when
    /// the URL has no host or names a non-default port.
    pub fn redirect_url(&self, url: &Url) -> Option<String> {
        let host = encodable_host(url)?;
        let mut out = self.origin_for(host);
        let path = url.path().trim_start_matches('/');
        if !path.is_empty() {
            out.push('/');
            out.push_str(path);
        }
        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            out.push('?');
            out.push_str(query);
        }
        Some(out)
    }

    /// Page form: `origin/<path>[?<query>][#<fragment>]`.
    ///
    /// Used for HTML attributes, where the original reference is kept whole.
    /// Same `None` cases as [`PublicOrigin::redirect_url`].
    pub fn page_url(&self, url: &Url) -> Option<String> {
        let host = encodable_host(url)?;
        let mut out = self.origin_for(host);
        out.push_str(url.path());
        if let Some(query) = url.query() {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = url.fragment() {
            out.push('#');
            out.push_str(fragment);
        }
        Some(out)
    }
}

/// A subdomain label carries a host but no port, so URLs with an explicit
/// non-default port cannot be routed back through the proxy.
fn encodable_host(url: &Url) -> Option<&str> {
    if url.port().is_some() {
        return None;
    }
    url.host_str()
}

/// Parse `value` as an absolute `http`/`https` URL with a host.
pub fn parse_absolute_http(value: &str) -> Option<Url> {
    let trimmed = value.trim();
    let lower = trimmed.get(..8).unwrap_or(trimmed).to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return None;
    }
    let url = Url::parse(trimmed).ok()?;
    url.host_str()?;
    Some(url)
}
