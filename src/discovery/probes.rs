//! Conventional-path probes
//!
//! Each probe walks a fixed list of paths under the site root and stops at
//! the first one that yields something. Network failures and non-200
//! responses just move on to the next path.

use crate::crawler::{fetch_raw, parse_html};
use crate::url::normalize_url;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Timeout for each probe request
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(25);

/// Well-known XML sitemap locations, in probe order
pub const COMMON_SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemap.xml.gz",
    "/sitemap/sitemap.xml",
    "/sitemaps/sitemap.xml",
];

/// Well-known HTML site-map pages, in probe order
pub const HTML_SITEMAP_PATHS: &[&str] = &["/sitemap", "/site-map", "/site_map", "/sitemap.html"];

/// Well-known RSS/Atom feed locations, in probe order
pub const FEED_PATHS: &[&str] = &[
    "/feed",
    "/rss.xml",
    "/atom.xml",
    "/blog/rss.xml",
    "/news/rss.xml",
];

/// Canonical probe URLs for `paths` under the site root
fn candidates(site_root: &Url, paths: &[&str]) -> Vec<String> {
    let root = site_root.as_str().trim_end_matches('/');
    paths
        .iter()
        .map(|path| normalize_url(&format!("{}{}", root, path)))
        .filter(|url| !url.is_empty())
        .collect()
}

/// Whether a response body looks like an XML sitemap
pub fn looks_like_sitemap(url: &str, body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("<urlset") || lower.contains("<sitemapindex") || url.to_lowercase().ends_with(".gz")
}

/// Returns the first conventional sitemap URL that answers with a sitemap
pub async fn probe_common_sitemap(client: &Client, site_root: &Url) -> Option<String> {
    for url in candidates(site_root, COMMON_SITEMAP_PATHS) {
        match fetch_raw(client, &url, PROBE_TIMEOUT).await {
            Ok(response) if response.status == 200 => {
                if looks_like_sitemap(&url, &response.text()) {
                    tracing::debug!("Found sitemap at {}", url);
                    return Some(url);
                }
            }
            Ok(response) => tracing::trace!("Sitemap probe {} -> {}", url, response.status),
            Err(e) => tracing::trace!("Sitemap probe {} failed: {}", url, e),
        }
    }
    None
}

/// Collects links from the first HTML site-map page that has any
///
/// Pages that turn out to be XML sitemaps are skipped here.
pub async fn probe_html_sitemap(client: &Client, site_root: &Url) -> Vec<String> {
    for url in candidates(site_root, HTML_SITEMAP_PATHS) {
        let response = match fetch_raw(client, &url, PROBE_TIMEOUT).await {
            Ok(r) if r.status == 200 => r,
            _ => continue,
        };

        let html = response.text();
        if html.trim().is_empty() || html.contains("<urlset") || html.contains("<sitemapindex") {
            continue;
        }

        let Ok(base) = Url::parse(&url) else {
            continue;
        };
        let links = parse_html(&html, &base).links;
        if !links.is_empty() {
            tracing::debug!("HTML site map {} yielded {} links", url, links.len());
            return links;
        }
    }
    Vec::new()
}

/// Collects links from the first feed that parses and has any
pub async fn probe_feeds(client: &Client, site_root: &Url) -> Vec<String> {
    for url in candidates(site_root, FEED_PATHS) {
        let response = match fetch_raw(client, &url, PROBE_TIMEOUT).await {
            Ok(r) if r.status == 200 => r,
            _ => continue,
        };

        match parse_feed_links(&response.body) {
            Some(links) if !links.is_empty() => {
                tracing::debug!("Feed {} yielded {} links", url, links.len());
                return links;
            }
            Some(_) => {}
            None => tracing::trace!("Feed {} is not well-formed XML", url),
        }
    }
    Vec::new()
}

/// Extracts every `<link>` from an RSS or Atom document
///
/// Atom links carry the URL in `href`; RSS links carry it as text. Results
/// are canonicalized and deduplicated in document order. Returns `None` if
/// the document is not well-formed XML.
pub fn parse_feed_links(xml: &[u8]) -> Option<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut links: Vec<String> = Vec::new();
    let mut in_link = false;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"link" => match href(&e) {
                Some(h) => push(&h, &mut links),
                None => {
                    in_link = true;
                    text.clear();
                }
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"link" => {
                if let Some(h) = href(&e) {
                    push(&h, &mut links);
                }
            }
            Ok(Event::Text(t)) if in_link => match t.unescape() {
                Ok(s) => text.push_str(&s),
                Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
            },
            Ok(Event::CData(c)) if in_link => text.push_str(&String::from_utf8_lossy(&c)),
            Ok(Event::End(e)) if e.local_name().as_ref() == b"link" => {
                if in_link {
                    push(&text, &mut links);
                    in_link = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }

    Some(links)
}

fn push(raw: &str, links: &mut Vec<String>) {
    let url = normalize_url(raw.trim());
    if !url.is_empty() && !links.contains(&url) {
        links.push(url);
    }
}

fn href(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"href")
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
        .filter(|v| !v.trim().is_empty())
}
