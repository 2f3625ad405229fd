//! Priority frontier for the crawl
//!
//! This module handles:
//! - Static relevance scoring of candidate URLs
//! - Best-first ordering with FIFO tie-breaking
//! - Tracking which URLs were ever admitted, so none is enqueued twice

use crate::url::strip_region_prefix;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use url::Url;

/// Path substrings that mark high-value pages
const HIGH_VALUE: &[&str] = &[
    "/products",
    "/product",
    "/platform",
    "/pricing",
    "/about",
    "/company",
    "/solutions",
    "/solution",
    "/customers",
    "/customer",
    "/contact",
    "/security",
    "/trust",
    "/compliance",
    "/docs",
    "/documentation",
];

/// Path substrings that mark high-volume, low-value sections
const LOW_VALUE: &[&str] = &[
    "/blog",
    "/news",
    "/press",
    "/events",
    "/resources",
    "/resource",
    "/tag/",
    "/category/",
    "/author/",
];

const HIGH_VALUE_BONUS: i32 = 80;
const LOW_VALUE_PENALTY: i32 = 60;
const QUERY_PENALTY: i32 = 12;
const DEPTH_PENALTY: i32 = 2;
const FREE_DEPTH: usize = 4;

/// Score given to URLs that cannot be parsed
const UNPARSEABLE_SCORE: i32 = -999;

/// Static crawl priority of a URL; higher is fetched earlier
///
/// # Scoring
///
/// | Condition | Points |
/// |-----------|--------|
/// | Path contains a high-value section | +80 |
/// | Path contains a low-value section | -60 |
/// | URL has a query string | -12 |
/// | Each path segment beyond the fourth | -2 |
///
/// A leading region segment is stripped before the path is inspected.
///
/// # Examples
///
/// ```
/// use site_ingest::crawler::score;
///
/// assert!(score("https://acme.com/pricing") > score("https://acme.com/blog/post"));
/// assert!(score("https://acme.com/about") > score("https://acme.com/about?tab=team"));
/// ```
pub fn score(url: &str) -> i32 {
    let Ok(parsed) = Url::parse(url) else {
        return UNPARSEABLE_SCORE;
    };

    let path = strip_region_prefix(&parsed.path().to_lowercase());
    let mut s = 0;

    if HIGH_VALUE.iter().any(|h| path.contains(h)) {
        s += HIGH_VALUE_BONUS;
    }
    if LOW_VALUE.iter().any(|l| path.contains(l)) {
        s -= LOW_VALUE_PENALTY;
    }
    if parsed.query().is_some_and(|q| !q.is_empty()) {
        s -= QUERY_PENALTY;
    }

    let depth = path.split('/').filter(|seg| !seg.is_empty()).count();
    s -= DEPTH_PENALTY * depth.saturating_sub(FREE_DEPTH) as i32;

    s
}

/// A URL waiting in the frontier
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// Static score at admission time
    pub priority: i32,

    /// Admission order; breaks ties between equal priorities
    pub sequence: u64,

    /// Canonical URL
    pub url: String,
}

// BinaryHeap is a max-heap: higher priority first, then lower sequence first
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for FrontierEntry {}

/// Best-first queue of canonical URLs
///
/// A URL is admitted at most once per run, even after it has been popped.
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    enqueued: HashSet<String>,
    next_sequence: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a URL with its computed score
    ///
    /// Returns `false` (and leaves the frontier unchanged) when the URL was
    /// admitted before.
    pub fn push(&mut self, url: &str) -> bool {
        if !self.enqueued.insert(url.to_string()) {
            return false;
        }

        self.heap.push(FrontierEntry {
            priority: score(url),
            sequence: self.next_sequence,
            url: url.to_string(),
        });
        self.next_sequence += 1;
        true
    }

    /// Removes and returns the highest-priority entry
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop()
    }

    /// Whether the URL was ever admitted
    pub fn was_enqueued(&self, url: &str) -> bool {
        self.enqueued.contains(url)
    }

    /// Number of entries waiting
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
