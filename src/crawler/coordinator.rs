//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Fetching robots.txt and running the discovery cascade
//! - Seeding the frontier and re-checking every URL it yields
//! - Fetching pages over HTTP with the rendering fallback
//! - Extracting and persisting page text
//! - Feeding harvested links back into the frontier
//! - Writing the manifest, corpus and diagnostic report

use crate::config::{Config, RenderMode};
use crate::crawler::budget::Bucket;
use crate::crawler::extractor::{extract_text, has_foreign_script};
use crate::crawler::fetcher::{accept_language, build_http_client, fetch_plain, FetchError};
use crate::crawler::parser::{looks_js_heavy, parse_html};
use crate::crawler::renderer::{launch_renderer, PageRenderer};
use crate::crawler::session::CrawlSession;
use crate::discovery::{discover, DiscoveryMethod};
use crate::output::{write_corpus, write_manifest, write_report, CrawlReport, PageRecord, SourcesMeta};
use crate::robots::{fetch_robots, ParsedRobots};
use crate::storage::{ArtifactStore, FsStore};
use crate::url::{eligible, is_same_domain, netloc, site_root, SkipReason};
use crate::Result;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use url::Url;

/// Text shorter than this (or half of `min-chars`, if larger) may trigger a render
const RENDER_RETRY_FLOOR: usize = 50;

/// What a finished crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// The manifest as written, page text included
    pub meta: SourcesMeta,
    pub report: CrawlReport,
    pub method: DiscoveryMethod,
    /// `<output>/<slug>`
    pub site_dir: PathBuf,
}

/// HTML obtained for a visited URL
struct FetchedPage {
    html: String,
    rendered: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    config_hash: String,
    client: Client,
    site_root: Url,
    base_domain: String,
    renderer: Option<Box<dyn PageRenderer>>,
    launch_browser: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `config_hash` - SHA-256 of the configuration file, recorded in the report
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(IngestError)` - The site root is invalid or the HTTP client
    ///   could not be built
    pub fn new(config: Config, config_hash: impl Into<String>) -> Result<Self> {
        let site_root = site_root(&config.site.website)?;
        let base_domain = netloc(&site_root).unwrap_or_default();
        let client = build_http_client(
            &config.user_agent,
            &accept_language(&config.crawler.allowed_languages),
        )?;

        Ok(Self {
            config,
            config_hash: config_hash.into(),
            client,
            site_root,
            base_domain,
            renderer: None,
            launch_browser: true,
        })
    }

    /// Uses `renderer` instead of launching a headless browser
    pub fn with_renderer(mut self, renderer: Box<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self.launch_browser = false;
        self
    }

    /// Never launches a headless browser; the run behaves as if launch failed
    pub fn without_renderer(mut self) -> Self {
        self.renderer = None;
        self.launch_browser = false;
        self
    }

    pub fn site_root(&self) -> &Url {
        &self.site_root
    }

    /// Runs the crawl to completion and writes all artifacts
    ///
    /// The rendering engine is shut down before returning, on success and
    /// on error alike.
    pub async fn run(mut self) -> Result<CrawlOutcome> {
        if self.launch_browser {
            self.renderer =
                launch_renderer(&self.config.render, &self.config.user_agent.header_value()).await;
        }

        let result = self.crawl().await;

        if let Some(renderer) = self.renderer.as_mut() {
            renderer.shutdown().await;
        }

        result
    }

    async fn crawl(&self) -> Result<CrawlOutcome> {
        let site = &self.config.site;
        let crawler = &self.config.crawler;

        let mut store = FsStore::open(Path::new(&self.config.output.directory), &site.slug)?;
        tracing::info!(
            "Starting crawl of {} into {} (budget {} pages)",
            self.site_root,
            store.root().display(),
            crawler.max_pages
        );

        let robots = fetch_robots(&self.client, &self.site_root).await;
        let discovery = discover(&self.client, &self.site_root, &robots, &site.seeds, crawler).await;

        let mode = self.effective_mode();
        let mut session = CrawlSession::new(crawler.max_pages);
        self.seed(&mut session, &robots, &discovery.urls)?;

        let delay = Duration::from_millis(crawler.politeness_delay_ms);
        let start_time = Instant::now();

        while session.has_budget() {
            let Some(entry) = session.pop()? else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            if !self.process_url(&mut session, &mut store, &robots, mode, &entry.url).await? {
                continue;
            }

            let visited = session.visited_count();
            if visited % 10 == 0 {
                let rate = visited as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} pages visited, {} stored, {} in frontier, {:.2} pages/sec",
                    visited,
                    session.counters.stored_ok,
                    session.frontier_len(),
                    rate
                );
            }

            tokio::time::sleep(delay).await;
        }

        tracing::info!(
            "Crawl completed: {} pages fetched, {} stored in {:?}",
            session.records().len(),
            session.counters.stored_ok,
            start_time.elapsed()
        );

        let report = session.report(discovery.method.as_str(), &self.config_hash);
        let meta = SourcesMeta::new(&site.slug, &site.name, &site.website, session.into_records());

        write_manifest(&mut store, &meta)?;
        write_corpus(&mut store, &meta)?;
        if let Err(e) = write_report(&mut store, &report) {
            tracing::warn!("Failed to write crawl report: {}", e);
        }

        Ok(CrawlOutcome {
            meta,
            report,
            method: discovery.method,
            site_dir: store.root().to_path_buf(),
        })
    }

    /// js-only without a renderer degrades to plain fetching
    fn effective_mode(&self) -> RenderMode {
        let mode = self.config.render.mode;
        if mode == RenderMode::JsOnly && self.renderer.is_none() {
            tracing::warn!("Rendering unavailable; js-only mode falls back to plain HTTP");
            return RenderMode::Disabled;
        }
        mode
    }

    /// Admits the initial URLs, without bucket caps
    fn seed(&self, session: &mut CrawlSession, robots: &ParsedRobots, urls: &[String]) -> Result<()> {
        session.counters.initial_urls = urls.len() as u64;

        for url in urls {
            if url.is_empty() {
                continue;
            }
            session.discover(url);
            if let Err(reason) = self.admission_check(url, robots) {
                session.skip(url, reason);
                continue;
            }
            session.enqueue(url)?;
        }

        tracing::debug!("Frontier seeded with {} URLs", session.frontier_len());
        Ok(())
    }

    /// Same-domain, policy and (optionally) robots checks
    fn admission_check(&self, url: &str, robots: &ParsedRobots) -> std::result::Result<(), SkipReason> {
        let crawler = &self.config.crawler;

        if crawler.same_domain_only && !is_same_domain(url, &self.base_domain) {
            return Err(SkipReason::CrossDomain);
        }
        eligible(url, &crawler.allowed_languages)?;
        if crawler.respect_robots_disallow
            && !robots.is_allowed(url, &self.config.user_agent.crawler_name)
        {
            return Err(SkipReason::RobotsDisallowed);
        }
        Ok(())
    }

    /// Re-checks, fetches, persists and harvests one popped URL
    ///
    /// Returns false when the URL was refused before being visited.
    async fn process_url(
        &self,
        session: &mut CrawlSession,
        store: &mut dyn ArtifactStore,
        robots: &ParsedRobots,
        mode: RenderMode,
        url: &str,
    ) -> Result<bool> {
        let Ok(page_url) = Url::parse(url) else {
            session.skip(url, SkipReason::BadUrl);
            return Ok(false);
        };
        if session.was_visited(url) {
            session.skip(url, SkipReason::Duplicate);
            return Ok(false);
        }
        if let Err(reason) = self.admission_check(url, robots) {
            session.skip(url, reason);
            return Ok(false);
        }
        let bucket = Bucket::of(url);
        if session.bucket_full(bucket) {
            session.skip(url, SkipReason::BucketCap);
            return Ok(false);
        }

        session.visit(url, bucket)?;
        tracing::debug!("Visiting {} [{}]", url, bucket);

        let fetched = self.fetch_page(session, mode, url).await;
        session.mark_fetched(url, fetched.is_some())?;
        let Some(page) = fetched else {
            return Ok(true);
        };

        let page = self.maybe_rerender(session, mode, &page_url, page).await;
        let parsed = parse_html(&page.html, &page_url);

        let record = self.persist(session, store, url, &page, parsed.title)?;
        session.push_record(record)?;

        if session.records().len() < session.max_pages() {
            self.harvest(session, robots, &parsed.links)?;
        }

        Ok(true)
    }

    /// First fetch per render mode, with the failure fallback
    async fn fetch_page(
        &self,
        session: &mut CrawlSession,
        mode: RenderMode,
        url: &str,
    ) -> Option<FetchedPage> {
        let first = if mode == RenderMode::JsOnly {
            self.render(url).await.map(|html| FetchedPage { html, rendered: true })
        } else {
            fetch_plain(&self.client, url)
                .await
                .map(|html| FetchedPage { html, rendered: false })
        };

        match first {
            Ok(page) => {
                session.counters.fetched_html += 1;
                if page.rendered {
                    session.counters.rendered_js += 1;
                }
                Some(page)
            }
            Err(e) => {
                session.counters.fetched_failed += 1;
                tracing::debug!("Fetch failed for {}: {}", url, e);

                if mode != RenderMode::JsFallback {
                    return None;
                }
                match self.render(url).await {
                    Ok(html) => {
                        session.counters.rendered_js += 1;
                        Some(FetchedPage { html, rendered: true })
                    }
                    Err(e) => {
                        tracing::debug!("Render fallback failed for {}: {}", url, e);
                        None
                    }
                }
            }
        }
    }

    /// Re-renders a thin, script-built page; keeps the plain HTML otherwise
    ///
    /// Returns the page to persist together with its extracted text.
    async fn maybe_rerender(
        &self,
        session: &mut CrawlSession,
        mode: RenderMode,
        page_url: &Url,
        page: FetchedPage,
    ) -> ExtractedPage {
        let text = extract_text(&page.html, page_url);
        if !text.trim().is_empty() {
            session.counters.extracted_ok += 1;
        }

        let threshold = RENDER_RETRY_FLOOR.max(self.config.crawler.min_chars / 2);
        let thin = text.trim().chars().count() < threshold;

        if mode == RenderMode::JsFallback
            && self.renderer.is_some()
            && !page.rendered
            && thin
            && looks_js_heavy(&page.html)
        {
            tracing::debug!("Thin script-heavy page, rendering {}", page_url);
            match self.render(page_url.as_str()).await {
                Ok(html) => {
                    session.counters.rendered_js += 1;
                    let text = extract_text(&html, page_url);
                    return ExtractedPage {
                        html,
                        text,
                        rendered: true,
                    };
                }
                Err(e) => tracing::debug!("Render failed for {}: {}", page_url, e),
            }
        }

        ExtractedPage {
            html: page.html,
            text,
            rendered: page.rendered,
        }
    }

    /// Writes the page's artifacts and builds its record
    fn persist(
        &self,
        session: &mut CrawlSession,
        store: &mut dyn ArtifactStore,
        url: &str,
        page: &ExtractedPage,
        title: Option<String>,
    ) -> Result<PageRecord> {
        let crawler = &self.config.crawler;
        let id = session.next_id();
        let raw_file = store.write_raw_page(id, &page.html)?;

        let mut text = page.text.trim();
        if !text.is_empty() && has_foreign_script(text, &crawler.allowed_languages) {
            tracing::debug!("Dropping text of {}: script outside allowed languages", url);
            text = "";
        }

        let (text, text_file) = if !text.is_empty() && text.chars().count() >= crawler.min_chars {
            session.counters.stored_ok += 1;
            (text.to_string(), store.write_extracted(id, text)?)
        } else {
            session.counters.stored_too_short += 1;
            (String::new(), String::new())
        };

        Ok(PageRecord {
            id,
            url: url.to_string(),
            raw_file,
            text_file,
            title: title.unwrap_or_default(),
            rendered: page.rendered,
            text,
        })
    }

    /// Feeds links from a fetched page back into the frontier
    fn harvest(&self, session: &mut CrawlSession, robots: &ParsedRobots, links: &[String]) -> Result<()> {
        for link in links {
            session.counters.discovered_links += 1;
            session.discover(link);

            if let Err(reason) = self.admission_check(link, robots) {
                session.skip(link, reason);
                continue;
            }
            if session.is_known(link) {
                session.skip(link, SkipReason::Duplicate);
                continue;
            }
            if session.bucket_full(Bucket::of(link)) {
                session.skip(link, SkipReason::BucketCap);
                continue;
            }
            session.enqueue(link)?;
        }
        Ok(())
    }

    async fn render(&self, url: &str) -> std::result::Result<String, FetchError> {
        match &self.renderer {
            Some(renderer) => renderer.render(url).await,
            None => Err(FetchError::RenderUnavailable),
        }
    }
}

/// Final HTML of a page with its extracted text
struct ExtractedPage {
    html: String,
    text: String,
    rendered: bool,
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client and launch the renderer if the mode needs one
/// 2. Fetch robots.txt and run the discovery cascade
/// 3. Crawl best-first under the page budget and bucket caps
/// 4. Write raw HTML and extracted text per page
/// 5. Write the manifest, the corpus and the diagnostic report
///
/// # Example
///
/// ```no_run
/// use site_ingest::config::load_config_with_hash;
/// use site_ingest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("acme.toml"))?;
/// let outcome = run_crawl(config, hash).await?;
/// println!("{} pages stored", outcome.meta.stored_count());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: String) -> Result<CrawlOutcome> {
    Coordinator::new(config, config_hash)?.run().await
}
