//! Robots.txt parser implementation
//!
//! `Sitemap:` directives are read line by line; allow/disallow decisions are
//! delegated to the robotstxt crate.

use crate::url::normalize_url;
use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty means allow all)
    content: String,
    /// Canonical sitemap URLs in declaration order, deduplicated
    sitemaps: Vec<String>,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            sitemaps: parse_sitemap_directives(content),
        }
    }

    /// Creates a permissive ParsedRobots with no sitemaps
    ///
    /// Used when robots.txt is missing or could not be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Sitemap URLs declared with `Sitemap:` lines
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path to check
    /// * `user_agent` - The crawler's product token (e.g. `SiteIngest`)
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}

/// Collects `Sitemap:` values (case-insensitive key), canonicalized and deduplicated
fn parse_sitemap_directives(content: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("sitemap") {
            continue;
        }

        let url = normalize_url(value);
        if !url.is_empty() && !out.contains(&url) {
            out.push(url);
        }
    }

    out
}
