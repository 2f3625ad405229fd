//! Diagnostic report generation
//!
//! The report is for operators: it explains why a crawl produced what it
//! did (which discovery method won, where the budget went, what was
//! skipped and why). Nothing downstream depends on it.

use crate::output::OutputResult;
use crate::storage::ArtifactStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name of the report inside the site directory
pub const REPORT_FILE: &str = "crawl_debug.json";

/// Maximum fetched URLs kept as samples
pub const FETCHED_SAMPLE_LIMIT: usize = 50;

/// Maximum skipped URLs kept per reason
pub const SKIP_SAMPLE_LIMIT: usize = 30;

/// Crawl loop counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlCounters {
    /// URLs handed to the frontier by discovery and seeds
    pub initial_urls: u64,
    /// Links harvested from fetched pages
    pub discovered_links: u64,
    pub enqueued: u64,
    pub popped: u64,
    pub visited: u64,
    pub fetched_html: u64,
    pub fetched_failed: u64,
    pub rendered_js: u64,
    pub extracted_ok: u64,
    pub stored_ok: u64,
    pub stored_too_short: u64,
    pub skipped_duplicate: u64,
    pub skipped_cross_domain: u64,
    pub skipped_policy: u64,
    pub skipped_bucket_cap: u64,
}

impl CrawlCounters {
    /// All skips regardless of reason
    pub fn total_skipped(&self) -> u64 {
        self.skipped_duplicate
            + self.skipped_cross_domain
            + self.skipped_policy
            + self.skipped_bucket_cap
    }
}

/// Skipped URL samples keyed by reason code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkipSamples(BTreeMap<String, Vec<String>>);

impl SkipSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps `url` under `reason` unless that reason is already full
    pub fn record(&mut self, reason: &str, url: &str) {
        let reason = if reason.is_empty() { "unknown" } else { reason };
        let urls = self.0.entry(reason.to_string()).or_default();
        if urls.len() < SKIP_SAMPLE_LIMIT {
            urls.push(url.to_string());
        }
    }

    pub fn get(&self, reason: &str) -> Option<&[String]> {
        self.0.get(reason).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Report written once at the end of a crawl
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub max_pages: usize,
    pub bucket_caps: BTreeMap<String, usize>,
    pub bucket_counts: BTreeMap<String, usize>,

    /// Page records produced
    pub fetched: usize,

    /// Page records whose text was stored
    pub extracted: usize,

    pub diagnostics: CrawlCounters,

    /// Discovery method that produced the initial URLs
    #[serde(default)]
    pub discovery_method: String,

    #[serde(default)]
    pub config_hash: String,

    /// Final lifecycle state counts
    #[serde(default)]
    pub page_states: BTreeMap<String, usize>,

    #[serde(default)]
    pub fetched_samples: Vec<String>,

    #[serde(default)]
    pub skipped_samples: SkipSamples,
}

/// Writes the report as pretty-printed JSON
///
/// Callers treat a failure here as non-fatal.
pub fn write_report(store: &mut dyn ArtifactStore, report: &CrawlReport) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    store.write_artifact(REPORT_FILE, &json)?;
    Ok(())
}

/// Loads a previously written report
pub fn load_report(store: &dyn ArtifactStore) -> OutputResult<CrawlReport> {
    let json = store.read_artifact(REPORT_FILE)?;
    Ok(serde_json::from_str(&json)?)
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    let d = &report.diagnostics;

    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Page budget: {}", report.max_pages);
    if !report.discovery_method.is_empty() {
        println!("  Discovery method: {}", report.discovery_method);
    }
    println!("  Initial URLs: {}", d.initial_urls);
    println!("  Pages fetched: {}", report.fetched);
    println!("  Pages stored: {}", report.extracted);
    if !report.config_hash.is_empty() {
        println!("  Config hash: {}", report.config_hash);
    }
    println!();

    println!("Frontier:");
    println!("  Links discovered: {}", d.discovered_links);
    println!("  Enqueued: {}", d.enqueued);
    println!("  Popped: {}", d.popped);
    println!("  Visited: {}", d.visited);
    println!();

    println!("Fetch & Extract:");
    println!("  HTML fetched: {}", d.fetched_html);
    println!("  Fetch failed: {}", d.fetched_failed);
    println!("  Rendered via JS: {}", d.rendered_js);
    println!("  Text extracted: {}", d.extracted_ok);
    println!("  Stored: {}", d.stored_ok);
    println!("  Too short: {}", d.stored_too_short);
    println!();

    println!("Buckets (count / cap):");
    for (bucket, cap) in &report.bucket_caps {
        let count = report.bucket_counts.get(bucket).copied().unwrap_or(0);
        println!("  {}: {} / {}", bucket, count, cap);
    }
    println!();

    let total_skipped = d.total_skipped();
    if total_skipped > 0 {
        println!("Skipped ({}):", total_skipped);
        println!("  Duplicate: {}", d.skipped_duplicate);
        println!("  Cross-domain: {}", d.skipped_cross_domain);
        println!("  Policy: {}", d.skipped_policy);
        println!("  Bucket cap: {}", d.skipped_bucket_cap);
        println!();
    }

    if !report.skipped_samples.is_empty() {
        println!("Skip Reasons:");
        let mut reasons: Vec<_> = report.skipped_samples.iter().collect();
        reasons.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));
        for (reason, urls) in reasons {
            println!("  {} ({} sampled)", reason, urls.len());
            if let Some(first) = urls.first() {
                println!("    e.g. {}", first);
            }
        }
        println!();
    }

    let stored_rate = if report.fetched > 0 {
        (report.extracted as f64 / report.fetched as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Store Rate: {:.1}% ({} / {} fetched pages stored)",
        stored_rate, report.extracted, report.fetched
    );
}
