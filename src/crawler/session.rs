//! Mutable state of one crawl run
//!
//! Everything the crawl loop reads and writes lives here: the frontier,
//! the visited set, bucket budgets, per-URL lifecycle, counters, samples
//! and page records. The session is owned by the loop and passed to no
//! one else, so none of it needs locking.

use crate::crawler::budget::{Bucket, BucketCaps, BucketCounts};
use crate::crawler::scheduler::{Frontier, FrontierEntry};
use crate::output::report::FETCHED_SAMPLE_LIMIT;
use crate::output::{CrawlCounters, CrawlReport, PageRecord, SkipSamples};
use crate::state::{PageState, PageTracker};
use crate::url::SkipReason;
use crate::Result;
use std::collections::HashSet;

/// State of a crawl in progress
#[derive(Debug)]
pub struct CrawlSession {
    max_pages: usize,
    frontier: Frontier,
    visited: HashSet<String>,
    caps: BucketCaps,
    bucket_counts: BucketCounts,
    tracker: PageTracker,
    pub counters: CrawlCounters,
    skipped_samples: SkipSamples,
    fetched_samples: Vec<String>,
    records: Vec<PageRecord>,
}

impl CrawlSession {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages,
            frontier: Frontier::new(),
            visited: HashSet::new(),
            caps: BucketCaps::for_budget(max_pages),
            bucket_counts: BucketCounts::new(),
            tracker: PageTracker::new(),
            counters: CrawlCounters::default(),
            skipped_samples: SkipSamples::new(),
            fetched_samples: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn caps(&self) -> &BucketCaps {
        &self.caps
    }

    pub fn bucket_counts(&self) -> &BucketCounts {
        &self.bucket_counts
    }

    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PageRecord> {
        self.records
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn state_of(&self, url: &str) -> Option<PageState> {
        self.tracker.get(url)
    }

    /// Whether the crawl may take another page
    ///
    /// Failed fetches count toward the budget too, so the visited set (a
    /// superset of the records) bounds the loop.
    pub fn has_budget(&self) -> bool {
        self.visited.len() < self.max_pages && self.records.len() < self.max_pages
    }

    /// Whether a URL was already fetched or admitted to the frontier
    pub fn is_known(&self, url: &str) -> bool {
        self.visited.contains(url) || self.frontier.was_enqueued(url)
    }

    pub fn was_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Whether `bucket` already holds as many pages as its cap allows
    pub fn bucket_full(&self, bucket: Bucket) -> bool {
        self.caps.is_full(bucket, self.bucket_counts.get(bucket))
    }

    /// Notes a newly seen URL
    pub fn discover(&mut self, url: &str) {
        self.tracker.discover(url);
    }

    /// Admits a URL to the frontier
    ///
    /// Returns false (and counts a duplicate) if it was admitted before.
    pub fn enqueue(&mut self, url: &str) -> Result<bool> {
        if !self.frontier.push(url) {
            self.skip(url, SkipReason::Duplicate);
            return Ok(false);
        }
        self.tracker.advance(url, PageState::Enqueued)?;
        self.counters.enqueued += 1;
        Ok(true)
    }

    /// Takes the best URL off the frontier
    pub fn pop(&mut self) -> Result<Option<FrontierEntry>> {
        let Some(entry) = self.frontier.pop() else {
            return Ok(None);
        };
        self.counters.popped += 1;
        self.tracker.advance(&entry.url, PageState::Popped)?;
        Ok(Some(entry))
    }

    /// Records a refusal
    ///
    /// The URL moves to `Skipped` only if it is still undecided (newly
    /// discovered, or popped and being re-checked); URLs refused again later
    /// are only counted.
    pub fn skip(&mut self, url: &str, reason: SkipReason) {
        match &reason {
            SkipReason::Duplicate => self.counters.skipped_duplicate += 1,
            SkipReason::CrossDomain => self.counters.skipped_cross_domain += 1,
            SkipReason::BucketCap => self.counters.skipped_bucket_cap += 1,
            _ => self.counters.skipped_policy += 1,
        }
        if reason != SkipReason::Duplicate {
            self.skipped_samples.record(&reason.to_string(), url);
        }

        let current = self.tracker.get(url).unwrap_or(PageState::Discovered);
        if current.can_transition_to(PageState::Skipped) {
            // checked above
            let _ = self.tracker.advance(url, PageState::Skipped);
        }
        tracing::debug!("Skip {} ({})", url, reason);
    }

    /// Commits a popped URL to the budget
    pub fn visit(&mut self, url: &str, bucket: Bucket) -> Result<()> {
        self.tracker.advance(url, PageState::Visited)?;
        self.visited.insert(url.to_string());
        self.bucket_counts.increment(bucket);
        self.counters.visited += 1;
        Ok(())
    }

    /// Records whether HTML was obtained for a visited URL
    pub fn mark_fetched(&mut self, url: &str, ok: bool) -> Result<()> {
        let state = if ok {
            PageState::Fetched
        } else {
            PageState::FetchFailed
        };
        self.tracker.advance(url, state)
    }

    /// Id the next page record will get
    pub fn next_id(&self) -> usize {
        self.records.len() + 1
    }

    /// Appends a page record and closes the URL's lifecycle
    pub fn push_record(&mut self, record: PageRecord) -> Result<()> {
        let state = if record.is_stored() {
            PageState::ExtractOk
        } else {
            PageState::ExtractEmpty
        };
        self.tracker.advance(&record.url, state)?;

        if self.fetched_samples.len() < FETCHED_SAMPLE_LIMIT {
            self.fetched_samples.push(record.url.clone());
        }
        self.records.push(record);
        Ok(())
    }

    /// Builds the diagnostic report for the current state
    pub fn report(&self, discovery_method: &str, config_hash: &str) -> CrawlReport {
        CrawlReport {
            max_pages: self.max_pages,
            bucket_caps: self
                .caps
                .iter()
                .map(|(b, cap)| (b.to_string(), cap))
                .collect(),
            bucket_counts: Bucket::ALL
                .iter()
                .map(|&b| (b.to_string(), self.bucket_counts.get(b)))
                .collect(),
            fetched: self.records.len(),
            extracted: self.records.iter().filter(|r| r.is_stored()).count(),
            diagnostics: self.counters.clone(),
            discovery_method: discovery_method.to_string(),
            config_hash: config_hash.to_string(),
            page_states: self
                .tracker
                .counts()
                .into_iter()
                .map(|(state, n)| (state.to_string(), n))
                .collect(),
            fetched_samples: self.fetched_samples.clone(),
            skipped_samples: self.skipped_samples.clone(),
        }
    }
}
