//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Content buckets and per-bucket budgets
//! - The priority frontier and URL scoring
//! - Plain HTTP fetching and the headless-browser fallback
//! - HTML parsing, link extraction and text extraction
//! - Overall crawl coordination

mod budget;
mod coordinator;
mod extractor;
mod fetcher;
mod parser;
mod renderer;
mod scheduler;
mod session;

pub use budget::{Bucket, BucketCaps, BucketCounts};
pub use coordinator::{run_crawl, Coordinator, CrawlOutcome};
pub use extractor::{extract_text, has_foreign_script};
pub use fetcher::{
    accept_language, build_http_client, decode_body, fetch_plain, fetch_raw, FetchError,
    RawResponse, PAGE_TIMEOUT,
};
pub use parser::{decode_cf_emails, decode_cfemail, looks_js_heavy, parse_html, ParsedPage};
pub use renderer::{launch_renderer, ChromiumRenderer, PageRenderer};
pub use scheduler::{score, Frontier, FrontierEntry};
pub use session::CrawlSession;
