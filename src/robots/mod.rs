//! Robots.txt handling module
//!
//! robots.txt is consulted for `Sitemap:` directives during discovery and,
//! when enabled in the configuration, for disallow rules during the crawl.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::fetch_raw;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Timeout for the robots.txt request
pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(20);

/// Fetches robots.txt from the site root
///
/// Anything other than a 200 response (including transport errors) yields
/// [`ParsedRobots::allow_all`]; robots.txt problems never stop a crawl.
pub async fn fetch_robots(client: &Client, site_root: &Url) -> ParsedRobots {
    let robots_url = match site_root.join("/robots.txt") {
        Ok(url) => url,
        Err(_) => return ParsedRobots::allow_all(),
    };

    match fetch_raw(client, robots_url.as_str(), ROBOTS_TIMEOUT).await {
        Ok(response) if response.status == 200 => {
            let content = response.text();
            tracing::debug!(
                "robots.txt found at {} ({} bytes)",
                robots_url,
                content.len()
            );
            ParsedRobots::from_content(&content)
        }
        Ok(response) => {
            tracing::debug!("robots.txt at {} returned {}", robots_url, response.status);
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::debug!("robots.txt fetch failed for {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
