//! HTML body rewriting.
//!
//! # Responsibilities
//! - Drop `<meta http-equiv="Content-Security-Policy">` elements
//! - Point absolute URLs in link-bearing attributes back at the proxy
//! - Inject the bootstrap script as the first child of `<html>`
//!
//! # Design Decisions
//! - Streaming tag-soup rewriter (lol_html): untouched bytes are emitted
//!   exactly as received, malformed markup degrades instead of failing
//! - Relative URLs are never touched; they already resolve against the proxy
//! - Documents without an `<html>` tag get the script prepended instead

use std::cell::Cell;

use axum::http::{header, HeaderMap};
use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{element, HtmlRewriter, Settings};

use crate::rewrite::url::{parse_absolute_http, PublicOrigin};

/// `(tag, attribute)` pairs whose URLs are rewritten.
pub const TRACKED_ATTRIBUTES: &[(&str, &str)] = &[
    ("a", "href"),
    ("link", "href"),
    ("script", "src"),
    ("img", "src"),
    ("iframe", "src"),
    ("source", "src"),
    ("form", "action"),
];

/// Attribute on the injected `<script>` holding `.<base_domain>`.
pub const PROXY_BASE_ATTRIBUTE: &str = "data-proxy-base";

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// True when the upstream declared an HTML body.
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
}

/// Result of rewriting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenDocument {
    pub body: Vec<u8>,
    pub urls_rewritten: usize,
    pub csp_removed: usize,
}

/// Rewrites proxied HTML documents. Built once, shared by every request.
#[derive(Debug, Clone)]
pub struct BodyRewriter {
    origin: PublicOrigin,
    script_tag: String,
}

impl BodyRewriter {
    /// The script tag carries the proxy suffix in `data-proxy-base`, so the
    /// client code never guesses the base domain.
    pub fn new(origin: PublicOrigin, bootstrap_script: &str) -> Self {
        let script_tag = format!(
            r#"<script {}=".{}">{}</script>"#,
            PROXY_BASE_ATTRIBUTE,
            escape_attribute(origin.base_domain()),
            bootstrap_script
        );
        Self { origin, script_tag }
    }

    /// The exact markup injected into every document.
    pub fn script_tag(&self) -> &str {
        &self.script_tag
    }

    /// Rewrite a single attribute value, if it is an absolute HTTP(S) URL
    /// that does not already point at the proxy.
    pub fn rewrite_url(&self, value: &str) -> Option<String> {
        let url = parse_absolute_http(value)?;
        if url.host_str().is_some_and(|host| self.origin.is_proxied_host(host)) {
            return None;
        }
        if let Some(port) = url.port() {
            tracing::debug!(url = %value, port, "Explicit port cannot be proxied; URL left as is");
            return None;
        }
        self.origin.page_url(&url)
    }

    /// Rewrite a full document.
    pub fn rewrite(&self, html: &[u8]) -> Result<RewrittenDocument, RewritingError> {
        let urls_rewritten = Cell::new(0usize);
        let csp_removed = Cell::new(0usize);
        let injected = Cell::new(false);

        let mut handlers = vec![
            element!("meta[http-equiv]", |el| {
                let is_csp = el.get_attribute("http-equiv").is_some_and(|v| {
                    v.trim().eq_ignore_ascii_case("content-security-policy")
                });
                if is_csp {
                    el.remove();
                    csp_removed.set(csp_removed.get() + 1);
                }
                Ok(())
            }),
            element!("html", |el| {
                if !injected.get() {
                    el.prepend(&self.script_tag, ContentType::Html);
                    injected.set(true);
                }
                Ok(())
            }),
        ];

        for &(tag, attr) in TRACKED_ATTRIBUTES {
            let urls_rewritten = &urls_rewritten;
            handlers.push(element!(format!("{}[{}]", tag, attr), move |el| {
                let Some(value) = el.get_attribute(attr) else {
                    return Ok(());
                };
                if let Some(rewritten) = self.rewrite_url(&value) {
                    tracing::debug!(tag, attr, from = %value, to = %rewritten, "HTML rewrite");
                    el.set_attribute(attr, &rewritten)?;
                    urls_rewritten.set(urls_rewritten.get() + 1);
                }
                Ok(())
            }));
        }

        let mut body = Vec::with_capacity(html.len() + self.script_tag.len());
        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: handlers,
                strict: false,
                ..Settings::default()
            },
            |chunk: &[u8]| body.extend_from_slice(chunk),
        );
        rewriter.write(html)?;
        rewriter.end()?;

        if !injected.get() {
            body.splice(0..0, self.script_tag.bytes());
        }

        Ok(RewrittenDocument {
            body,
            urls_rewritten: urls_rewritten.get(),
            csp_removed: csp_removed.get(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SCRIPT: &str = "console.log('boot')";

    fn rewriter() -> BodyRewriter {
        BodyRewriter::new(PublicOrigin::new("https", "localhost", 1337), SCRIPT)
    }

    const TAG: &str = r#"<script data-proxy-base=".localhost">console.log('boot')</script>"#;

    fn rewrite(html: &str) -> String {
        String::from_utf8(rewriter().rewrite(html.as_bytes()).unwrap().body).unwrap()
    }

    #[test]
    fn test_is_html() {
        let mut headers = HeaderMap::new();
        assert!(!is_html(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("Text/HTML; charset=utf-8"));
        assert!(is_html(&headers));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_html(&headers));
    }

    #[test]
    fn test_anchor_rewrite() {
        let out = rewrite(r#"<html><body><a href="https://news.example.com/other">x</a></body></html>"#);
        assert_eq!(
            out,
            format!(
                r#"<html>{}<body><a href="https://news.example.com.localhost:1337/other">x</a></body></html>"#,
                TAG
            )
        );
    }

    #[test]
    fn test_every_tracked_attribute() {
        let doc = r#"<html>
<link href="http://cdn.test/a.css">
<script src="https://cdn.test/a.js"></script>
<img src="https://img.test/p.png">
<iframe src="https://frame.test/"></iframe>
<video><source src="https://media.test/v.mp4"></video>
<form action="https://shop.test/buy?x=1"></form>
</html>"#;
        let result = rewriter().rewrite(doc.as_bytes()).unwrap();
        let out = String::from_utf8(result.body).unwrap();

        assert_eq!(result.urls_rewritten, 6);
        assert!(out.contains(r#"href="https://cdn.test.localhost:1337/a.css""#));
        assert!(out.contains(r#"src="https://cdn.test.localhost:1337/a.js""#));
        assert!(out.contains(r#"src="https://img.test.localhost:1337/p.png""#));
        assert!(out.contains(r#"src="https://frame.test.localhost:1337/""#));
        assert!(out.contains(r#"src="https://media.test.localhost:1337/v.mp4""#));
        assert!(out.contains(r#"action="https://shop.test.localhost:1337/buy?x=1""#));
    }

    #[test]
    fn test_relative_and_foreign_urls_untouched() {
        let body = r#"<a href="/local">l</a><a href="page.html">p</a><a href="//cdn.test/x">c</a><a href="mailto:a@b.test">m</a><img src="data:image/png;base64,AAAA">"#;
        let doc = format!("<html>{}</html>", body);
        let out = rewrite(&doc);
        assert!(out.ends_with(&format!("{}</html>", body)));
    }

    #[test]
    fn test_untracked_attributes_untouched() {
        let doc = r#"<html><div data-src="https://x.test/"></div><img srcset="https://x.test/a.png 2x"></html>"#;
        let out = rewrite(doc);
        assert!(out.contains(r#"data-src="https://x.test/""#));
        assert!(out.contains(r#"srcset="https://x.test/a.png 2x""#));
    }

    #[test]
    fn test_no_tracked_tags_only_adds_script_and_drops_csp() {
        let doc = r#"<!DOCTYPE html><html><head><meta http-equiv="Content-Security-Policy" content="default-src 'self'"><title>t</title></head><body><p>hi</p></body></html>"#;
        let result = rewriter().rewrite(doc.as_bytes()).unwrap();
        assert_eq!(result.csp_removed, 1);
        assert_eq!(result.urls_rewritten, 0);
        assert_eq!(
            String::from_utf8(result.body).unwrap(),
            format!(
                r#"<!DOCTYPE html><html>{}<head><title>t</title></head><body><p>hi</p></body></html>"#,
                TAG
            )
        );
    }

    #[test]
    fn test_other_meta_kept() {
        let out = rewrite(r#"<html><meta http-equiv="refresh" content="5"><meta charset="utf-8"></html>"#);
        assert!(out.contains(r#"<meta http-equiv="refresh" content="5">"#));
        assert!(out.contains(r#"<meta charset="utf-8">"#));
    }

    #[test]
    fn test_fragment_without_html_gets_script_prepended() {
        let out = rewrite(r#"<div><a href="https://a.test/x">a</a></div>"#);
        assert_eq!(
            out,
            format!(r#"{}<div><a href="https://a.test.localhost:1337/x">a</a></div>"#, TAG)
        );
    }

    #[test]
    fn test_script_injected_once() {
        let out = rewrite("<html><html></html></html>");
        assert_eq!(out.matches("<script ").count(), 1);
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let doc = r#"<html><body><a href="https://a.test/x">unclosed <b><i></b><img src="https://b.test/y" <p"#;
        let out = rewrite(doc);
        assert!(out.contains("https://a.test.localhost:1337/x"));
    }

    #[test]
    fn test_already_proxied_url_untouched() {
        assert_eq!(rewriter().rewrite_url("https://a.test.localhost:1337/x"), None);
        assert_eq!(
            rewriter().rewrite_url("https://a.test/x").as_deref(),
            Some("https://a.test.localhost:1337/x")
        );
    }

    #[test]
    fn test_script_carries_configured_base_domain() {
        let rewriter = BodyRewriter::new(PublicOrigin::new("https", "proxy.test", 8443), SCRIPT);
        assert_eq!(
            rewriter.script_tag(),
            r#"<script data-proxy-base=".proxy.test">console.log('boot')</script>"#
        );

        let out = String::from_utf8(rewriter.rewrite(b"<html></html>").unwrap().body).unwrap();
        assert!(out.contains(r#"data-proxy-base=".proxy.test""#));
        assert!(!out.contains(".localhost"));
    }

    #[test]
    fn test_explicit_port_left_untouched() {
        let out = rewrite(r#"<html><a href="https://example.com:8443/x">p</a><a href="https://example.com:443/y">d</a></html>"#);
        assert!(out.contains(r#"href="https://example.com:8443/x""#));
        assert!(out.contains(r#"href="https://example.com.localhost:1337/y""#));
    }
}
