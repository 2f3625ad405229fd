//! Discovery cascade
//!
//! Finds the initial URLs for a site. Methods are tried in order and the
//! first one that yields anything wins:
//!
//! 1. Sitemaps declared in robots.txt
//! 2. Sitemaps at conventional paths
//! 3. HTML site-map pages
//! 4. RSS/Atom feeds
//!
//! Explicit seeds are always appended after whatever discovery produced.
//! Every URL passes the same-domain check (when enabled) and the policy
//! filter before it is kept. Nothing here ever fails a crawl: every probe
//! failure degrades to "no result".

mod probes;
mod sitemap;

pub use probes::{
    looks_like_sitemap, parse_feed_links, probe_common_sitemap, probe_feeds, probe_html_sitemap,
    COMMON_SITEMAP_PATHS, FEED_PATHS, HTML_SITEMAP_PATHS, PROBE_TIMEOUT,
};
pub use sitemap::{
    decompress_if_needed, parse_sitemap, resolve_sitemaps, SitemapEntries, SITEMAP_TIMEOUT,
};

use crate::config::CrawlerConfig;
use crate::robots::ParsedRobots;
use crate::url::{eligible, is_same_domain, netloc, normalize_url};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Hard ceiling on URLs taken from sitemaps
pub const SITEMAP_URL_CEILING: usize = 5000;

/// Which discovery method produced the initial URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    RobotsSitemap,
    CommonSitemap,
    HtmlSitemap,
    Feed,
    SeedsOnly,
}

impl DiscoveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RobotsSitemap => "robots_sitemap",
            Self::CommonSitemap => "common_sitemap",
            Self::HtmlSitemap => "html_sitemap",
            Self::Feed => "feed",
            Self::SeedsOnly => "seeds_only",
        }
    }
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the discovery cascade
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Discovered URLs first, then seeds; filtered and deduplicated
    pub urls: Vec<String>,
    pub method: DiscoveryMethod,
}

/// Filter shared by every discovery method and the seed merge
#[derive(Debug, Clone)]
pub struct DiscoveryFilter<'a> {
    /// Netloc of the site; empty disables the check
    base_domain: String,
    same_domain_only: bool,
    allowed_languages: &'a [String],
}

impl<'a> DiscoveryFilter<'a> {
    pub fn new(site_root: &Url, crawler: &'a CrawlerConfig) -> Self {
        Self {
            base_domain: netloc(site_root).unwrap_or_default(),
            same_domain_only: crawler.same_domain_only,
            allowed_languages: &crawler.allowed_languages,
        }
    }

    /// Whether a canonical URL may be kept
    pub fn admits(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        if self.same_domain_only && !is_same_domain(url, &self.base_domain) {
            return false;
        }
        eligible(url, self.allowed_languages).is_ok()
    }
}

/// Maximum sitemap URLs kept for a page budget
pub fn sitemap_limit(max_pages: usize) -> usize {
    max_pages.saturating_mul(10).min(SITEMAP_URL_CEILING)
}

/// Runs the discovery cascade
///
/// # Arguments
///
/// * `client` - HTTP client
/// * `site_root` - `scheme://host/` of the site
/// * `robots` - Already-fetched robots.txt (for `Sitemap:` lines)
/// * `seeds` - Operator-supplied URLs, appended after discovery output
/// * `crawler` - Budget, same-domain toggle and allowed languages
pub async fn discover(
    client: &Client,
    site_root: &Url,
    robots: &ParsedRobots,
    seeds: &[String],
    crawler: &CrawlerConfig,
) -> Discovery {
    let filter = DiscoveryFilter::new(site_root, crawler);

    let (discovered, method) = run_cascade(client, site_root, robots, crawler, &filter).await;

    let urls = merge(&discovered, seeds, &filter);
    tracing::info!(
        "Discovery via {}: {} discovered, {} initial URLs after merging {} seeds",
        method,
        discovered.len(),
        urls.len(),
        seeds.len()
    );

    Discovery { urls, method }
}

async fn run_cascade(
    client: &Client,
    site_root: &Url,
    robots: &ParsedRobots,
    crawler: &CrawlerConfig,
    filter: &DiscoveryFilter<'_>,
) -> (Vec<String>, DiscoveryMethod) {
    let (sitemaps, sitemap_method) = if !robots.sitemaps().is_empty() {
        (robots.sitemaps().to_vec(), DiscoveryMethod::RobotsSitemap)
    } else if let Some(found) = probe_common_sitemap(client, site_root).await {
        (vec![found], DiscoveryMethod::CommonSitemap)
    } else {
        (Vec::new(), DiscoveryMethod::SeedsOnly)
    };

    if !sitemaps.is_empty() {
        let limit = sitemap_limit(crawler.max_pages);
        let pages = resolve_sitemaps(client, &sitemaps, limit, |url| filter.admits(url)).await;
        if !pages.is_empty() {
            return (pages, sitemap_method);
        }
        tracing::debug!("Sitemaps yielded no usable URLs");
    }

    let links = probe_html_sitemap(client, site_root).await;
    if !links.is_empty() {
        return (links, DiscoveryMethod::HtmlSitemap);
    }

    let links = probe_feeds(client, site_root).await;
    if !links.is_empty() {
        return (links, DiscoveryMethod::Feed);
    }

    (Vec::new(), DiscoveryMethod::SeedsOnly)
}

/// Discovered URLs first, then seeds, through the filter and deduplicated
pub fn merge(discovered: &[String], seeds: &[String], filter: &DiscoveryFilter<'_>) -> Vec<String> {
    let mut seen = HashSet::new();
    discovered
        .iter()
        .cloned()
        .chain(seeds.iter().map(|s| normalize_url(s)))
        .filter(|url| filter.admits(url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
