//! XML sitemap parsing and resolution
//!
//! Handles both sitemap indexes (`<sitemapindex>`, whose `<loc>` entries are
//! child sitemaps) and url sets (`<urlset>`, whose `<loc>` entries are
//! pages), optionally gzip-compressed.

use crate::crawler::fetch_raw;
use crate::url::normalize_url;
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::io::Read;
use std::time::Duration;

/// Timeout for fetching one sitemap document
pub const SITEMAP_TIMEOUT: Duration = Duration::from_secs(40);

/// URLs found in one sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapEntries {
    /// Child sitemaps (from a sitemap index)
    pub sitemaps: Vec<String>,
    /// Page URLs (from a url set)
    pub pages: Vec<String>,
}

/// Parses a sitemap document
///
/// Every `<loc>` is collected in document order and canonicalized. If the
/// document contains a `<sitemapindex>` element they are child sitemaps;
/// otherwise (a `<urlset>` or anything else carrying `<loc>`) they are pages.
/// Malformed XML keeps whatever was read before the error.
pub fn parse_sitemap(xml: &[u8]) -> SitemapEntries {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut is_index = false;
    let mut in_loc = false;
    let mut current = String::new();
    let mut locs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sitemapindex" => is_index = true,
                b"loc" => {
                    in_loc = true;
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_loc => match t.unescape() {
                Ok(text) => current.push_str(&text),
                Err(_) => current.push_str(&String::from_utf8_lossy(&t)),
            },
            Ok(Event::CData(c)) if in_loc => current.push_str(&String::from_utf8_lossy(&c)),
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                in_loc = false;
                let url = normalize_url(current.trim());
                if !url.is_empty() {
                    locs.push(url);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    "Sitemap XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    if is_index {
        SitemapEntries {
            sitemaps: locs,
            pages: Vec::new(),
        }
    } else {
        SitemapEntries {
            sitemaps: Vec::new(),
            pages: locs,
        }
    }
}

/// Gunzips a sitemap body when the URL or content type says it is compressed
///
/// Bodies that fail to decompress are returned unchanged (servers often
/// send `.gz` sitemaps already decoded via `Content-Encoding`).
pub fn decompress_if_needed(url: &str, content_type: &str, body: Vec<u8>) -> Vec<u8> {
    let compressed = url.to_lowercase().ends_with(".gz") || content_type.contains("gzip");
    if !compressed {
        return body;
    }

    let mut decoder = GzDecoder::new(body.as_slice());
    let mut out = Vec::new();
    match decoder.read_to_end(&mut out) {
        Ok(_) => out,
        Err(e) => {
            tracing::debug!("Not gzip after all for {}: {}", url, e);
            body
        }
    }
}

/// Resolves sitemaps breadth-first into page URLs
///
/// # Arguments
///
/// * `client` - HTTP client
/// * `roots` - Sitemaps to start from (robots.txt or a probed path)
/// * `limit` - Stop once this many pages have been kept
/// * `keep` - Filter applied to each page URL before it is kept
///
/// Each sitemap is fetched at most once. Failed or non-200 fetches are
/// skipped silently.
pub async fn resolve_sitemaps<F>(
    client: &Client,
    roots: &[String],
    limit: usize,
    mut keep: F,
) -> Vec<String>
where
    F: FnMut(&str) -> bool,
{
    let mut queue: VecDeque<String> = roots.iter().cloned().collect();
    let mut seen_sitemaps: HashSet<String> = HashSet::new();
    let mut seen_pages: HashSet<String> = HashSet::new();
    let mut pages = Vec::new();

    while pages.len() < limit {
        let Some(sitemap) = queue.pop_front() else {
            break;
        };
        if sitemap.is_empty() || !seen_sitemaps.insert(sitemap.clone()) {
            continue;
        }

        let response = match fetch_raw(client, &sitemap, SITEMAP_TIMEOUT).await {
            Ok(r) if r.status == 200 => r,
            Ok(r) => {
                tracing::debug!("Sitemap {} returned {}", sitemap, r.status);
                continue;
            }
            Err(e) => {
                tracing::debug!("Sitemap {} failed: {}", sitemap, e);
                continue;
            }
        };

        let xml = decompress_if_needed(&sitemap, &response.content_type, response.body);
        let entries = parse_sitemap(&xml);
        tracing::debug!(
            "Sitemap {}: {} child sitemaps, {} pages",
            sitemap,
            entries.sitemaps.len(),
            entries.pages.len()
        );

        queue.extend(
            entries
                .sitemaps
                .into_iter()
                .filter(|child| !seen_sitemaps.contains(child)),
        );

        for page in entries.pages {
            if !keep(&page) || !seen_pages.insert(page.clone()) {
                continue;
            }
            pages.push(page);
            if pages.len() >= limit {
                break;
            }
        }
    }

    pages
}
