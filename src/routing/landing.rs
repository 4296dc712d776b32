//! Landing redirect construction for the bare proxy domain.
//!
//! `?url=shop.test/cart` on the bare domain becomes a redirect to
//! `https://shop.test.localhost:1337/cart`, which re-enters the proxy with a
//! resolvable target.

use thiserror::Error;
use url::Url;

use crate::rewrite::url::PublicOrigin;

/// Scheme assumed when the supplied URL has none.
const DEFAULT_SCHEME: &str = "http";

/// Why a landing `url` parameter was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LandingError {
    #[error("{0}")]
    Parse(#[from] url::ParseError),

    #[error("no host in `{0}`")]
    MissingHost(String),

    #[error("port {port} in `{url}` cannot be proxied")]
    ExplicitPort { url: String, port: u16 },
}

/// Build the proxied location for a user-supplied target URL.
pub fn landing_redirect(raw: &str, origin: &PublicOrigin) -> Result<String, LandingError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, raw)
    };

    let url = Url::parse(&candidate)?;
    if let Some(port) = url.port() {
        return Err(LandingError::ExplicitPort {
            url: raw.to_string(),
            port,
        });
    }
    origin
        .redirect_url(&url)
        .ok_or_else(|| LandingError::MissingHost(raw.to_string()))
}
