//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! discover / crawl / persist cycle end-to-end into a temporary directory.

use async_trait::async_trait;
use site_ingest::config::{parse_config, Config};
use site_ingest::crawler::{Coordinator, CrawlOutcome, FetchError, PageRenderer};
use site_ingest::output::{load_manifest, rebuild_corpus, CORPUS_FILE, MANIFEST_FILE, REPORT_FILE};
use site_ingest::storage::FsStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILLER: &str = "Acme builds industrial sensors for factories around the world. \
    Our products measure temperature, pressure and vibration with high accuracy.";

/// Creates a test configuration for the mock site
///
/// `extra` is appended verbatim, so tests can add crawler or render keys.
fn create_test_config(base: &str, seeds: &[String], out: &TempDir, extra: &str) -> Config {
    let seeds = seeds
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");

    parse_config(&format!(
        r#"
[site]
slug = "acme"
name = "Acme Corp"
website = "{base}"
seeds = [{seeds}]

[crawler]
politeness-delay-ms = 0
min-chars = 40
{extra}

[user-agent]
crawler-name = "TestBot"

[output]
directory = '{dir}'
"#,
        dir = out.path().display()
    ))
    .expect("test config should be valid")
}

fn article(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body><article><h1>{title}</h1>\
         <p>{body}</p><p>{FILLER}</p></article></body></html>"
    )
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

async fn crawl(config: Config) -> CrawlOutcome {
    Coordinator::new(config, "test-hash")
        .expect("coordinator should build")
        .without_renderer()
        .run()
        .await
        .expect("crawl should succeed")
}

/// Renderer that returns fixed HTML for every URL
struct StubRenderer {
    html: String,
}

#[async_trait]
impl PageRenderer for StubRenderer {
    async fn render(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.html.clone())
    }
}

/// Renderer that returns fixed HTML and counts how often it was asked
#[derive(Clone)]
struct CountingRenderer {
    html: String,
    calls: Arc<AtomicUsize>,
}

impl CountingRenderer {
    fn new(html: String) -> Self {
        Self {
            html,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for CountingRenderer {
    async fn render(&self, _url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.html.clone())
    }
}

#[tokio::test]
async fn test_seeds_only_crawl_follows_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Home</title></head><body>
            <p>Welcome to Acme. {FILLER}</p>
            <a href="/products">Products</a>
            <a href="{base}/about">About</a>
            <a href="https://elsewhere.example/">Partner</a>
            <a href="/brochure.pdf">Brochure</a>
            </body></html>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(html(article("Products", "The Acme S1 sensor range.")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(article("About", "Founded in 1999 in Rotterdam.")))
        .mount(&server)
        .await;

    let config = create_test_config(&base, &[format!("{base}/")], &out, "");
    let outcome = crawl(config).await;

    assert_eq!(outcome.method.as_str(), "seeds_only");
    assert_eq!(outcome.meta.pages.len(), 3);
    assert_eq!(outcome.meta.pages[0].url, format!("{base}/"));
    assert_eq!(outcome.meta.pages[0].id, 1);
    assert_eq!(outcome.meta.pages[0].title, "Home");

    let urls: Vec<&str> = outcome.meta.pages.iter().map(|p| p.url.as_str()).collect();
    assert!(urls.contains(&format!("{base}/products").as_str()));
    assert!(urls.contains(&format!("{base}/about").as_str()));

    let diag = &outcome.report.diagnostics;
    assert_eq!(diag.visited, 3);
    assert_eq!(diag.stored_ok, 3);
    assert!(diag.skipped_cross_domain >= 1);
    assert!(diag.skipped_policy >= 1);
    assert_eq!(outcome.report.config_hash, "test-hash");

    let site_dir = out.path().join("acme");
    assert_eq!(outcome.site_dir, site_dir);
    assert!(site_dir.join("raw/pages/001.html").exists());
    assert!(site_dir.join("extracted/001.txt").exists());
    assert!(site_dir.join(MANIFEST_FILE).exists());
    assert!(site_dir.join(REPORT_FILE).exists());

    let corpus = std::fs::read_to_string(site_dir.join(CORPUS_FILE)).unwrap();
    assert!(corpus.starts_with("# Acme Corp\n\nWebsite: "));
    assert!(corpus.contains("## Page 1\n"));
    assert!(corpus.contains(&format!("Source:\n- {base}/products")));
}

#[tokio::test]
async fn test_robots_sitemap_with_language_filter() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nAllow: /\nSitemap: {base}/sitemap-pages.xml\n"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-pages.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                "<urlset>\
                 <url><loc>{base}/about</loc></url>\
                 <url><loc>{base}/fr/about</loc></url>\
                 <url><loc>{base}/pricing</loc></url>\
                 </urlset>"
            ),
            "application/xml",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(article("About", "Who we are.")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pricing"))
        .respond_with(html(article("Pricing", "Plans start at 10 EUR.")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(article("Home", "Welcome.")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fr/about"))
        .respond_with(html(article("A propos", "Qui sommes-nous.")))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&base, &[format!("{base}/")], &out, "");
    let outcome = crawl(config).await;

    assert_eq!(outcome.method.as_str(), "robots_sitemap");
    assert_eq!(outcome.report.discovery_method, "robots_sitemap");
    assert_eq!(outcome.meta.pages.len(), 3);
    assert!(outcome
        .meta
        .pages
        .iter()
        .all(|p| !p.url.contains("/fr/")));
}

#[tokio::test]
async fn test_blog_bucket_cap() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    let links: String = (1..=30)
        .map(|i| format!(r#"<a href="/blog/post-{i}">Post {i}</a>"#))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            "<html><body><p>{FILLER}</p>{links}</body></html>"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/blog/post-\d+$"))
        .respond_with(html(article("Post", "A blog post about sensors.")))
        .mount(&server)
        .await;

    let config = create_test_config(&base, &[format!("{base}/")], &out, "max-pages = 50");
    let outcome = crawl(config).await;

    let report = &outcome.report;
    assert_eq!(report.bucket_caps.get("blog"), Some(&20));
    assert_eq!(report.bucket_counts.get("blog"), Some(&20));
    assert_eq!(report.bucket_counts.get("other"), Some(&1));
    assert_eq!(report.diagnostics.skipped_bucket_cap, 10);
    assert_eq!(outcome.meta.pages.len(), 21);
    assert_eq!(
        report
            .skipped_samples
            .get("bucket_cap")
            .map(|samples| samples.len()),
        Some(10)
    );
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    let links: String = (1..=10)
        .map(|i| format!(r#"<a href="/page-{i}">Page {i}</a>"#))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            "<html><body><p>{FILLER}</p>{links}</body></html>"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/page-\d+$"))
        .respond_with(html(article("Page", "Details.")))
        .mount(&server)
        .await;

    let config = create_test_config(&base, &[format!("{base}/")], &out, "max-pages = 4");
    let outcome = crawl(config).await;

    assert_eq!(outcome.meta.pages.len(), 4);
    assert_eq!(outcome.report.diagnostics.visited, 4);
    assert_eq!(outcome.report.max_pages, 4);
}

#[tokio::test]
async fn test_js_fallback_renders_thin_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/app"))
        .respond_with(html(
            r#"<html><head><title>App</title></head><body><div id="__next"></div>
            <script src="/a.js"></script><script src="/b.js"></script></body></html>"#,
        ))
        .mount(&server)
        .await;

    let renderer = StubRenderer {
        html: article("App", "Rendered dashboard content for the Acme cloud."),
    };
    let config = create_test_config(
        &base,
        &[format!("{base}/app")],
        &out,
        "\n[render]\nmode = \"js-fallback\"",
    );
    let outcome = Coordinator::new(config, "")
        .unwrap()
        .with_renderer(Box::new(renderer))
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.meta.pages.len(), 1);
    let page = &outcome.meta.pages[0];
    assert!(page.rendered);
    assert!(page.is_stored());
    assert!(page.text.contains("Rendered dashboard content"));
    assert_eq!(outcome.report.diagnostics.rendered_js, 1);

    let corpus = std::fs::read_to_string(outcome.site_dir.join(CORPUS_FILE)).unwrap();
    assert!(corpus.contains("(rendered via JS)"));

    let raw = std::fs::read_to_string(outcome.site_dir.join(&page.raw_file)).unwrap();
    assert!(raw.contains("Rendered dashboard content"));
}

#[tokio::test]
async fn test_js_fallback_renders_after_failed_fetch() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(
            ResponseTemplate::new(500).set_body_raw("<html><body>oops</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let renderer = CountingRenderer::new(article("Recovered", "Served by the browser instead."));
    let config = create_test_config(
        &base,
        &[format!("{base}/broken")],
        &out,
        "\n[render]\nmode = \"js-fallback\"",
    );
    let outcome = Coordinator::new(config, "")
        .unwrap()
        .with_renderer(Box::new(renderer.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(renderer.calls(), 1);
    assert_eq!(outcome.meta.pages.len(), 1);
    let page = &outcome.meta.pages[0];
    assert!(page.rendered);
    assert!(page.text.contains("Served by the browser"));

    let diag = &outcome.report.diagnostics;
    assert_eq!(diag.fetched_failed, 1);
    assert_eq!(diag.fetched_html, 0);
    assert_eq!(diag.rendered_js, 1);
}

#[tokio::test]
async fn test_js_fallback_skips_render_when_not_needed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    // Thin but static: nothing suggests scripts build the content
    Mock::given(method("GET"))
        .and(path("/thin"))
        .respond_with(html("<html><body><p>Short note.</p></body></html>"))
        .mount(&server)
        .await;
    // Script-heavy markers, but the plain HTML already carries enough text
    Mock::given(method("GET"))
        .and(path("/heavy"))
        .respond_with(html(format!(
            r#"<html><body><div id="__next"><article><h1>Heavy</h1>
            <p>Server-rendered copy. {FILLER}</p></article></div>
            <script src="/a.js"></script><script src="/b.js"></script>
            <script src="/c.js"></script></body></html>"#
        )))
        .mount(&server)
        .await;

    let renderer = CountingRenderer::new(article("Rendered", "Should never be used."));
    let config = create_test_config(
        &base,
        &[format!("{base}/thin"), format!("{base}/heavy")],
        &out,
        "\n[render]\nmode = \"js-fallback\"",
    );
    let outcome = Coordinator::new(config, "")
        .unwrap()
        .with_renderer(Box::new(renderer.clone()))
        .run()
        .await
        .unwrap();

    assert_eq!(renderer.calls(), 0);
    assert_eq!(outcome.meta.pages.len(), 2);
    assert!(outcome.meta.pages.iter().all(|p| !p.rendered));
    assert_eq!(outcome.report.diagnostics.rendered_js, 0);
    assert_eq!(outcome.report.diagnostics.fetched_html, 2);
}

#[tokio::test]
async fn test_js_only_uses_renderer_for_every_page() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(article("Plain", "Should never be fetched.")))
        .expect(0)
        .mount(&server)
        .await;

    let renderer = StubRenderer {
        html: article("Rendered", "Everything goes through the browser."),
    };
    let config = create_test_config(
        &base,
        &[format!("{base}/")],
        &out,
        "\n[render]\nmode = \"js-only\"",
    );
    let outcome = Coordinator::new(config, "")
        .unwrap()
        .with_renderer(Box::new(renderer))
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.meta.pages.len(), 1);
    assert!(outcome.meta.pages[0].rendered);
    assert_eq!(outcome.report.diagnostics.fetched_html, 1);
    assert_eq!(outcome.report.diagnostics.rendered_js, 1);
}

#[tokio::test]
async fn test_no_renderer_degrades_gracefully() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/app"))
        .respond_with(html(
            r#"<html><body><div id="__next"></div><script src="/a.js"></script></body></html>"#,
        ))
        .mount(&server)
        .await;

    let config = create_test_config(
        &base,
        &[format!("{base}/app")],
        &out,
        "\n[render]\nmode = \"js-only\"",
    );
    let outcome = crawl(config).await;

    assert_eq!(outcome.meta.pages.len(), 1);
    let page = &outcome.meta.pages[0];
    assert!(!page.rendered);
    assert!(!page.is_stored());
    assert!(page.text_file.is_empty());
    assert_eq!(outcome.report.diagnostics.stored_too_short, 1);
    assert_eq!(outcome.report.diagnostics.rendered_js, 0);

    let corpus = std::fs::read_to_string(outcome.site_dir.join(CORPUS_FILE)).unwrap();
    assert!(corpus.contains("No usable content."));
}

#[tokio::test]
async fn test_server_error_fails_but_not_found_page_is_kept() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(
            ResponseTemplate::new(500).set_body_raw("<html><body>oops</body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw(article("Moved", "This page now lives elsewhere."), "text/html"),
        )
        .mount(&server)
        .await;

    let config = create_test_config(
        &base,
        &[format!("{base}/down"), format!("{base}/gone")],
        &out,
        "\n[render]\nmode = \"disabled\"",
    );
    let outcome = crawl(config).await;

    assert_eq!(outcome.meta.pages.len(), 1);
    assert_eq!(outcome.meta.pages[0].url, format!("{base}/gone"));
    assert_eq!(outcome.meta.pages[0].id, 1);

    let diag = &outcome.report.diagnostics;
    assert_eq!(diag.visited, 2);
    assert_eq!(diag.fetched_failed, 1);
    assert_eq!(diag.fetched_html, 1);
}

#[tokio::test]
async fn test_cloudflare_email_is_decoded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    let key = 0x42u8;
    let mut payload = vec![key];
    payload.extend("sales@acme.com".bytes().map(|b| b ^ key));
    let payload = hex::encode(payload);

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html(format!(
            r#"<html><head><title>Contact</title></head><body><article>
            <p>Write to us at <a href="/cdn-cgi/l/email-protection" class="__cf_email__"
            data-cfemail="{payload}">[email&#160;protected]</a> for a quote. {FILLER}</p>
            </article></body></html>"#
        )))
        .mount(&server)
        .await;

    let config = create_test_config(&base, &[format!("{base}/contact")], &out, "");
    let outcome = crawl(config).await;

    let page = &outcome.meta.pages[0];
    assert!(page.text.contains("sales@acme.com"));
    assert!(!page.text.contains("email protected"));

    let raw = std::fs::read_to_string(outcome.site_dir.join(&page.raw_file)).unwrap();
    assert!(raw.contains("mailto:sales@acme.com"));
}

#[tokio::test]
async fn test_kana_text_is_dropped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(article(
            "Acme",
            "センサーの製品情報はこちらです。お問い合わせください。",
        )))
        .mount(&server)
        .await;

    let config = create_test_config(&base, &[format!("{base}/")], &out, "");
    let outcome = crawl(config).await;

    assert_eq!(outcome.meta.pages.len(), 1);
    let page = &outcome.meta.pages[0];
    assert!(page.text_file.is_empty());
    assert!(!page.is_stored());
    assert!(outcome.site_dir.join(&page.raw_file).exists());
    assert_eq!(outcome.report.diagnostics.stored_too_short, 1);
}

#[tokio::test]
async fn test_export_corpus_rebuilds_from_disk() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Home</title></head><body><p>{FILLER}</p>
            <a href="/team">Team</a></body></html>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(html(article("Team", "Our engineers and staff.")))
        .mount(&server)
        .await;

    let config = create_test_config(&base, &[format!("{base}/")], &out, "");
    let outcome = crawl(config).await;

    let corpus_path = outcome.site_dir.join(CORPUS_FILE);
    let original = std::fs::read_to_string(&corpus_path).unwrap();
    std::fs::remove_file(&corpus_path).unwrap();

    let mut store = FsStore::existing(out.path(), "acme").unwrap();
    let pages = rebuild_corpus(&mut store).unwrap();
    assert_eq!(pages, outcome.meta.stored_count());

    let rebuilt = std::fs::read_to_string(&corpus_path).unwrap();
    assert_eq!(rebuilt, original);

    let manifest = load_manifest(&store).unwrap();
    assert_eq!(manifest.pages.len(), outcome.meta.pages.len());
    assert_eq!(manifest.fetched_at, outcome.meta.fetched_at);
}
