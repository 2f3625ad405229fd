//! Site-Ingest main entry point
//!
//! This is the command-line interface for the Site-Ingest website ingester.

use anyhow::Context;
use clap::Parser;
use site_ingest::config::{canonicalize, load_config_with_hash, validate, Config, RenderMode};
use site_ingest::crawler::{accept_language, BucketCaps, Coordinator};
use site_ingest::output::{load_report, print_report, rebuild_corpus, CORPUS_FILE};
use site_ingest::storage::{ArtifactStore, FsStore};
use site_ingest::url::site_root;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Site-Ingest: turns a company website into a question-answering corpus
///
/// Site-Ingest discovers a site's pages from sitemaps, feeds and seeds,
/// crawls them best-first under per-section budgets, and writes raw HTML,
/// extracted text, a page manifest and a corpus document.
#[derive(Parser, Debug)]
#[command(name = "site-ingest")]
#[command(version = "1.0.0")]
#[command(about = "Ingests a company website into a text corpus", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_corpus"])]
    dry_run: bool,

    /// Show the report of the last crawl and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_corpus"])]
    stats: bool,

    /// Rebuild sources.md from the existing manifest and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_corpus: bool,

    /// Override the page budget
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Extra seed URL (repeatable), appended to the configured seeds
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Override the render mode
    #[arg(long, value_enum, value_name = "MODE")]
    render: Option<RenderMode>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_corpus {
        handle_export_corpus(&config)?;
    } else {
        handle_crawl(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_ingest=info,warn"),
            1 => EnvFilter::new("site_ingest=debug,info"),
            2 => EnvFilter::new("site_ingest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides and re-validates
fn apply_overrides(config: &mut Config, cli: &Cli) -> anyhow::Result<()> {
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    config.site.seeds.extend(cli.seeds.iter().cloned());
    if let Some(mode) = cli.render {
        config.render.mode = mode;
    }

    canonicalize(config);
    validate(config).context("invalid command-line override")?;
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let root = site_root(&config.site.website)?;

    println!("=== Site-Ingest Dry Run ===\n");

    println!("Site:");
    println!("  Name: {}", config.site.name);
    println!("  Slug: {}", config.site.slug);
    println!("  Root: {}", root);

    println!("\nSeeds ({}):", config.site.seeds.len());
    for seed in &config.site.seeds {
        println!("  - {}", seed);
    }

    println!("\nCrawler Configuration:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!("  Minimum characters: {}", config.crawler.min_chars);
    println!("  Same domain only: {}", config.crawler.same_domain_only);
    println!(
        "  Allowed languages: {} (Accept-Language: {})",
        config.crawler.allowed_languages.join(", "),
        accept_language(&config.crawler.allowed_languages)
    );
    println!(
        "  Respect robots.txt disallow: {}",
        config.crawler.respect_robots_disallow
    );

    println!("\nBucket Caps:");
    for (bucket, cap) in BucketCaps::for_budget(config.crawler.max_pages).iter() {
        println!("  {}: {}", bucket, cap);
    }

    println!("\nRendering:");
    println!("  Mode: {}", config.render.mode);
    println!("  Wait until: {:?}", config.render.wait_until);
    println!("  Timeout: {}ms", config.render.timeout_ms);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  Directory: {}",
        Path::new(&config.output.directory)
            .join(&config.site.slug)
            .display()
    );

    Ok(())
}

/// Handles the --stats mode: prints the report of the last crawl
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = FsStore::existing(Path::new(&config.output.directory), &config.site.slug)
        .context("no crawl output found for this site")?;
    let report = load_report(&store).context("failed to read crawl report")?;
    print_report(&report);
    Ok(())
}

/// Handles the --export-corpus mode: rebuilds sources.md from disk
fn handle_export_corpus(config: &Config) -> anyhow::Result<()> {
    let mut store = FsStore::existing(Path::new(&config.output.directory), &config.site.slug)
        .context("no crawl output found for this site")?;

    let pages = rebuild_corpus(&mut store).context("failed to rebuild corpus")?;
    println!(
        "Corpus rebuilt with {} pages: {}",
        pages,
        store.root().join(CORPUS_FILE).display()
    );
    Ok(())
}

/// Handles the main crawl mode
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    tracing::info!("Starting crawl of {}", config.site.website);

    let outcome = Coordinator::new(config, config_hash)?.run().await?;

    if outcome.meta.stored_count() == 0 {
        tracing::warn!("No page produced usable text; the corpus is empty");
    }
    tracing::info!(
        "Wrote {} pages ({} with text) to {}",
        outcome.meta.pages.len(),
        outcome.meta.stored_count(),
        outcome.site_dir.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_flag_accepts_modes() {
        let cli = Cli::try_parse_from(["site-ingest", "acme.toml", "--render", "js-only"]).unwrap();
        assert_eq!(cli.render, Some(RenderMode::JsOnly));

        let cli = Cli::try_parse_from(["site-ingest", "acme.toml", "--render", "off"]).unwrap();
        assert_eq!(cli.render, Some(RenderMode::Disabled));
    }

    #[test]
    fn test_render_flag_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["site-ingest", "acme.toml", "--render", "always"]).is_err());
    }
}
