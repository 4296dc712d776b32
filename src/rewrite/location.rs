//! `Location` header rewriting.

use crate::rewrite::url::{parse_absolute_http, PublicOrigin};

/// Rewrite an absolute redirect target so it re-enters the proxy.
///
/// Returns `None` when the value should be left alone: relative locations,
/// non-HTTP schemes, locations already pointing at the proxy, and locations
/// with an explicit port.
pub fn rewrite_location(value: &str, origin: &PublicOrigin) -> Option<String> {
    let url = parse_absolute_http(value)?;
    if url.host_str().is_some_and(|host| origin.is_proxied_host(host)) {
        return None;
    }
    if let Some(port) = url.port() {
        tracing::debug!(location = %value, port, "Explicit port cannot be proxied; Location left as is");
        return None;
    }
    origin.redirect_url(&url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> PublicOrigin {
        PublicOrigin::new("https", "localhost", 1337)
    }

    #[test]
    fn test_absolute_location() {
        assert_eq!(
            rewrite_location("https://shop.test/checkout?step=2", &origin()).as_deref(),
            Some("https://shop.test.localhost:1337/checkout?step=2")
        );
    }

    #[test]
    fn test_http_location_uses_proxy_scheme() {
        assert_eq!(
            rewrite_location("http://shop.test/", &origin()).as_deref(),
            Some("https://shop.test.localhost:1337")
        );
        let plain = PublicOrigin::new("http", "localhost", 8080);
        assert_eq!(
            rewrite_location("https://shop.test/login", &plain).as_deref(),
            Some("http://shop.test.localhost:8080/login")
        );
    }

    #[test]
    fn test_relative_location_untouched() {
        assert_eq!(rewrite_location("/login?next=/", &origin()), None);
        assert_eq!(rewrite_location("login", &origin()), None);
    }

    #[test]
    fn test_already_proxied_location_untouched() {
        assert_eq!(
            rewrite_location("https://shop.test.localhost:1337/cart", &origin()),
            None
        );
    }

    #[test]
    fn test_explicit_port_location_untouched() {
        assert_eq!(rewrite_location("https://shop.test:8443/cart", &origin()), None);
    }
}
