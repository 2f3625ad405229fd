use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

/// Main configuration structure for Site-Ingest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The site being ingested
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Lowercase identifier; names the output directory
    pub slug: String,

    /// Display name used as the corpus heading
    pub name: String,

    /// Site root (scheme is inferred when missing)
    pub website: String,

    /// Explicit seed URLs, appended after discovery output
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Page budget for the whole run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Fixed delay inserted after every page (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Minimum extracted-text length for a page to be stored
    #[serde(rename = "min-chars", default = "default_min_chars")]
    pub min_chars: usize,

    /// Only follow URLs on the site's own domain (and its subdomains)
    #[serde(rename = "same-domain-only", default = "default_true")]
    pub same_domain_only: bool,

    /// Language codes to keep; canonicalized during validation
    #[serde(rename = "allowed-languages", default = "default_languages")]
    pub allowed_languages: Vec<String>,

    /// Skip pages disallowed by robots.txt for our user agent
    #[serde(rename = "respect-robots-disallow", default)]
    pub respect_robots_disallow: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            politeness_delay_ms: default_delay_ms(),
            min_chars: default_min_chars(),
            same_domain_only: true,
            allowed_languages: default_languages(),
            respect_robots_disallow: false,
        }
    }
}

/// How the headless-browser fetch is used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Every page is fetched through the browser
    JsOnly,
    /// Plain fetch first, browser when the plain result is insufficient
    JsFallback,
    /// Never use the browser
    #[value(alias = "off", alias = "none")]
    Disabled,
}

impl RenderMode {
    /// Whether a browser must be started for this mode
    pub fn needs_renderer(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::JsOnly => "js-only",
            Self::JsFallback => "js-fallback",
            Self::Disabled => "disabled",
        };
        write!(f, "{}", s)
    }
}

/// Navigation milestone the renderer waits for before serializing the DOM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaitUntil {
    /// Navigation finished, including the page's load event
    Load,
    /// `document.readyState` is `interactive` or later
    DomContentLoaded,
    /// Load, plus a short settle for late requests
    NetworkIdle,
}

/// Rendering fallback configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_render_mode")]
    pub mode: RenderMode,

    #[serde(rename = "wait-until", default = "default_wait_until")]
    pub wait_until: WaitUntil,

    /// Navigation timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_render_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: default_render_mode(),
            wait_until: default_wait_until(),
            timeout_ms: default_render_timeout_ms(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL)
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Parent directory; each site writes into `<directory>/<slug>`
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

fn default_max_pages() -> usize {
    50
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_min_chars() -> usize {
    200
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string(), "zh-cn".to_string()]
}

fn default_render_mode() -> RenderMode {
    RenderMode::JsFallback
}

fn default_wait_until() -> WaitUntil {
    WaitUntil::NetworkIdle
}

fn default_render_timeout_ms() -> u64 {
    90_000
}

fn default_crawler_name() -> String {
    "SiteIngest".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_output_dir() -> String {
    "./companies".to_string()
}
