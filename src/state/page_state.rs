/// Page state definitions for tracking crawl progress
///
/// Every canonical URL moves forward through these states at most once per run.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageState {
    // ===== Active States =====
    /// URL was found by discovery or on a fetched page
    Discovered,

    /// URL passed the filters and sits in the frontier
    Enqueued,

    /// URL was taken off the frontier and is being re-checked
    Popped,

    /// URL passed the re-checks and counts toward the budget
    Visited,

    /// HTML was obtained (plain or rendered)
    Fetched,

    // ===== Terminal States =====
    /// URL was refused by a filter, the dedup sets or a bucket cap
    Skipped,

    /// No HTML could be obtained
    FetchFailed,

    /// Extracted text was stored
    ExtractOk,

    /// Page was recorded but its text was too short or in a blocked script
    ExtractEmpty,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Skipped | Self::FetchFailed | Self::ExtractOk | Self::ExtractEmpty
        )
    }

    /// Returns true if this represents a page record in the manifest
    pub fn has_record(&self) -> bool {
        matches!(self, Self::ExtractOk | Self::ExtractEmpty)
    }

    /// Checks whether moving from `self` to `next` is a legal step
    ///
    /// ```text
    /// discovered -> enqueued -> popped -> visited -> fetched -> extract_ok
    ///      |                       |         |           \---> extract_empty
    ///      \-> skipped             \-> skipped \-> fetch_failed
    /// ```
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Discovered, Self::Enqueued)
                | (Self::Discovered, Self::Skipped)
                | (Self::Enqueued, Self::Popped)
                | (Self::Popped, Self::Skipped)
                | (Self::Popped, Self::Visited)
                | (Self::Visited, Self::Fetched)
                | (Self::Visited, Self::FetchFailed)
                | (Self::Fetched, Self::ExtractOk)
                | (Self::Fetched, Self::ExtractEmpty)
        )
    }

    /// Converts the page state to its report string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Enqueued => "enqueued",
            Self::Popped => "popped",
            Self::Visited => "visited",
            Self::Fetched => "fetched",
            Self::Skipped => "skipped",
            Self::FetchFailed => "fetch_failed",
            Self::ExtractOk => "extract_ok",
            Self::ExtractEmpty => "extract_empty",
        }
    }

    /// Parses a page state from its report string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_name(s: &str) -> Option<Self> {
        Self::all_states().into_iter().find(|state| state.as_str() == s)
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Discovered,
            Self::Enqueued,
            Self::Popped,
            Self::Visited,
            Self::Fetched,
            Self::Skipped,
            Self::FetchFailed,
            Self::ExtractOk,
            Self::ExtractEmpty,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!PageState::Discovered.is_terminal());
        assert!(!PageState::Enqueued.is_terminal());
        assert!(!PageState::Popped.is_terminal());
        assert!(!PageState::Visited.is_terminal());
        assert!(!PageState::Fetched.is_terminal());

        assert!(PageState::Skipped.is_terminal());
        assert!(PageState::FetchFailed.is_terminal());
        assert!(PageState::ExtractOk.is_terminal());
        assert!(PageState::ExtractEmpty.is_terminal());
    }

    #[test]
    fn test_has_record() {
        assert!(PageState::ExtractOk.has_record());
        assert!(PageState::ExtractEmpty.has_record());
        assert!(!PageState::FetchFailed.has_record());
        assert!(!PageState::Skipped.has_record());
    }

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            PageState::Discovered,
            PageState::Enqueued,
            PageState::Popped,
            PageState::Visited,
            PageState::Fetched,
            PageState::ExtractOk,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_no_backward_or_skipping_transitions() {
        assert!(!PageState::Visited.can_transition_to(PageState::Enqueued));
        assert!(!PageState::Enqueued.can_transition_to(PageState::Visited));
        assert!(!PageState::Discovered.can_transition_to(PageState::Fetched));
        assert!(!PageState::Visited.can_transition_to(PageState::Skipped));
    }

    #[test]
    fn test_terminal_states_have_no_successor() {
        for terminal in PageState::all_states().into_iter().filter(|s| s.is_terminal()) {
            for next in PageState::all_states() {
                assert!(
                    !terminal.can_transition_to(next),
                    "{} -> {} should be illegal",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_name_roundtrip() {
        for state in PageState::all_states() {
            assert_eq!(PageState::from_name(state.as_str()), Some(state));
        }
        assert_eq!(PageState::from_name("nope"), None);
    }
}
