//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - Page title
//! - Signals that a page is rendered client-side
//! - Cloudflare-obfuscated email addresses

use crate::url::normalize_with_base;
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Canonical absolute URLs found on the page, in document order, deduplicated
    pub links: Vec<String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
///
/// Every link is resolved against `base_url` and normalized.
///
/// # Example
///
/// ```
/// use site_ingest::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page#x">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    let mut push = |href: &str| {
        if let Some(url) = resolve_link(href, base_url) {
            if !links.contains(&url) {
                links.push(url);
            }
        }
    };

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                push(href);
            }
        }
    }

    links
}

/// Resolves a link href to a canonical absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Anything that fails to resolve
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let url = normalize_with_base(href, base_url);
    if url.is_empty() {
        None
    } else {
        Some(url)
    }
}

/// Heuristic check for pages whose content is produced by client-side script
///
/// Matches framework root markers (Next.js, Nuxt, React), explicit
/// "enable JavaScript" notices, `<noscript>` in a short document, and short
/// documents carrying three or more script tags. An empty document counts
/// as script-heavy.
pub fn looks_js_heavy(html: &str) -> bool {
    if html.trim().is_empty() {
        return true;
    }

    let h = html.to_lowercase();

    const MARKERS: &[&str] = &[
        "id=\"__next\"",
        "__next_data__",
        "window.__nuxt__",
        "id=\"__nuxt\"",
        "data-reactroot",
        "enable javascript",
        "requires javascript",
    ];
    if MARKERS.iter().any(|m| h.contains(m)) {
        return true;
    }

    if h.contains("<noscript") && h.len() < 20_000 {
        return true;
    }

    h.len() < 8_000 && h.matches("<script").count() >= 3
}

/// Decodes a Cloudflare `data-cfemail` hex payload
///
/// The first byte is the XOR key for the remaining bytes.
///
/// # Examples
///
/// ```
/// use site_ingest::crawler::decode_cfemail;
///
/// assert_eq!(decode_cfemail("422a2b0223212f276c212d2f").as_deref(), Some("hi@acme.com"));
/// assert_eq!(decode_cfemail("zz"), None);
/// ```
pub fn decode_cfemail(hex_payload: &str) -> Option<String> {
    let bytes = hex::decode(hex_payload.trim()).ok()?;
    let (key, rest) = bytes.split_first()?;
    let decoded: Vec<u8> = rest.iter().map(|b| b ^ key).collect();

    String::from_utf8(decoded)
        .ok()
        .filter(|s| !s.is_empty() && !s.contains(['<', '>', '"', '&']))
}

static CF_EMAIL_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<(?:a|span)\b[^>]*\bdata-cfemail\s*=\s*["']([0-9a-f]+)["'][^>]*>.*?</(?:a|span)>"#)
        .expect("hardcoded regex pattern is valid")
});

static CF_EMAIL_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*\bhref\s*=\s*["'][^"']*/cdn-cgi/l/email-protection#([0-9a-f]+)["'][^>]*>.*?</a>"#)
        .expect("hardcoded regex pattern is valid")
});

/// Replaces Cloudflare email-protection placeholders with plain mailto links
///
/// Handles both `data-cfemail="..."` elements and anchors pointing at
/// `/cdn-cgi/l/email-protection#...`. Placeholders that fail to decode are
/// left untouched. Documents without either marker are returned unchanged.
pub fn decode_cf_emails(html: &str) -> String {
    if !html.contains("email-protection") && !html.contains("data-cfemail") {
        return html.to_string();
    }

    let mut out = html.to_string();
    for re in [&*CF_EMAIL_ELEMENT, &*CF_EMAIL_HREF] {
        out = re
            .replace_all(&out, |caps: &Captures| match decode_cfemail(&caps[1]) {
                Some(email) => format!("<a href=\"mailto:{0}\">{0}</a>", email),
                None => caps[0].to_string(),
            })
            .into_owned();
    }

    out
}
