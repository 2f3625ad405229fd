//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: the lifecycle of a single canonical URL
//! - `PageTracker`: current state of every URL seen in a run, with
//!   transitions validated against the lifecycle

mod page_state;

pub use page_state::PageState;

use crate::IngestError;
use std::collections::{BTreeMap, HashMap};

/// Current state per canonical URL for one crawl run
#[derive(Debug, Default)]
pub struct PageTracker {
    states: HashMap<String, PageState>,
}

impl PageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a URL, if it was ever seen
    pub fn get(&self, url: &str) -> Option<PageState> {
        self.states.get(url).copied()
    }

    /// Records a newly seen URL as `Discovered`
    ///
    /// URLs already tracked keep their state.
    pub fn discover(&mut self, url: &str) {
        self.states
            .entry(url.to_string())
            .or_insert(PageState::Discovered);
    }

    /// Moves a URL to `next`, rejecting illegal steps
    ///
    /// Unknown URLs are treated as `Discovered`.
    pub fn advance(&mut self, url: &str, next: PageState) -> Result<(), IngestError> {
        let current = self.get(url).unwrap_or(PageState::Discovered);

        if !current.can_transition_to(next) {
            return Err(IngestError::InvalidTransition {
                url: url.to_string(),
                from: current,
                to: next,
            });
        }

        self.states.insert(url.to_string(), next);
        Ok(())
    }

    /// Number of URLs currently in each state
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for state in self.states.values() {
            *counts.entry(state.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_happy_path() {
        let mut tracker = PageTracker::new();
        let url = "https://acme.com/";
        tracker.discover(url);
        tracker.advance(url, PageState::Enqueued).unwrap();
        tracker.advance(url, PageState::Popped).unwrap();
        tracker.advance(url, PageState::Visited).unwrap();
        tracker.advance(url, PageState::Fetched).unwrap();
        tracker.advance(url, PageState::ExtractEmpty).unwrap();
        assert_eq!(tracker.get(url), Some(PageState::ExtractEmpty));
    }

    #[test]
    fn test_tracker_rejects_revisit() {
        let mut tracker = PageTracker::new();
        let url = "https://acme.com/a";
        tracker.advance(url, PageState::Enqueued).unwrap();
        tracker.advance(url, PageState::Popped).unwrap();
        tracker.advance(url, PageState::Visited).unwrap();

        let err = tracker.advance(url, PageState::Enqueued).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidTransition {
                from: PageState::Visited,
                to: PageState::Enqueued,
                ..
            }
        ));
        assert_eq!(tracker.get(url), Some(PageState::Visited));
    }

    #[test]
    fn test_discover_keeps_existing_state() {
        let mut tracker = PageTracker::new();
        let url = "https://acme.com/b";
        tracker.advance(url, PageState::Enqueued).unwrap();
        tracker.discover(url);
        assert_eq!(tracker.get(url), Some(PageState::Enqueued));
    }

    #[test]
    fn test_counts() {
        let mut tracker = PageTracker::new();
        tracker.discover("https://acme.com/1");
        tracker.discover("https://acme.com/2");
        tracker.advance("https://acme.com/3", PageState::Skipped).unwrap();

        let counts = tracker.counts();
        assert_eq!(counts.get("discovered"), Some(&2));
        assert_eq!(counts.get("skipped"), Some(&1));
    }
}
