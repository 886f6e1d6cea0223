/// Crawl phase definitions for the page loop
///
/// This module defines the phases a crawl moves through and which moves between
/// them are legal.
use std::fmt;

/// Represents where a crawl run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Run created, no page requested yet
    Idle,

    /// A listing page is being fetched (including retries)
    FetchingPage,

    /// Cards of the fetched page are being turned into records
    ExtractingPage,

    /// Deciding whether to stop or move on to the next page
    Evaluating,

    // ===== Terminal Phases =====
    /// Run stopped normally; accepted records are handed to the sink
    Done,

    /// Run aborted; nothing is handed to the sink
    Failed,
}

impl CrawlPhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is legal
    ///
    /// ```text
    /// Idle           -> FetchingPage | Done | Failed
    /// FetchingPage   -> ExtractingPage | Evaluating | Failed
    /// ExtractingPage -> Evaluating | Done | Failed
    /// Evaluating     -> FetchingPage | Done | Failed
    /// ```
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (self, next) {
            (Idle, FetchingPage | Done | Failed) => true,
            (FetchingPage, ExtractingPage | Evaluating | Failed) => true,
            (ExtractingPage, Evaluating | Done | Failed) => true,
            (Evaluating, FetchingPage | Done | Failed) => true,
            _ => false,
        }
    }

    /// Lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingPage => "fetching_page",
            Self::ExtractingPage => "extracting_page",
            Self::Evaluating => "evaluating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(CrawlPhase::Done.is_terminal());
        assert!(CrawlPhase::Failed.is_terminal());

        assert!(!CrawlPhase::Idle.is_terminal());
        assert!(!CrawlPhase::FetchingPage.is_terminal());
        assert!(!CrawlPhase::ExtractingPage.is_terminal());
        assert!(!CrawlPhase::Evaluating.is_terminal());
    }

    #[test]
    fn test_page_cycle() {
        assert!(CrawlPhase::Idle.can_transition_to(CrawlPhase::FetchingPage));
        assert!(CrawlPhase::FetchingPage.can_transition_to(CrawlPhase::ExtractingPage));
        assert!(CrawlPhase::ExtractingPage.can_transition_to(CrawlPhase::Evaluating));
        assert!(CrawlPhase::Evaluating.can_transition_to(CrawlPhase::FetchingPage));
        assert!(CrawlPhase::Evaluating.can_transition_to(CrawlPhase::Done));
    }

    #[test]
    fn test_failed_page_skips_extraction() {
        assert!(CrawlPhase::FetchingPage.can_transition_to(CrawlPhase::Evaluating));
        assert!(CrawlPhase::FetchingPage.can_transition_to(CrawlPhase::Failed));
        assert!(!CrawlPhase::FetchingPage.can_transition_to(CrawlPhase::Done));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!CrawlPhase::Idle.can_transition_to(CrawlPhase::ExtractingPage));
        assert!(!CrawlPhase::ExtractingPage.can_transition_to(CrawlPhase::FetchingPage));
        assert!(!CrawlPhase::Evaluating.can_transition_to(CrawlPhase::Evaluating));
    }

    #[test]
    fn test_terminal_phases_are_final() {
        use CrawlPhase::*;

        for next in [Idle, FetchingPage, ExtractingPage, Evaluating, Done, Failed] {
            assert!(!CrawlPhase::Done.can_transition_to(next));
            assert!(!CrawlPhase::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlPhase::FetchingPage), "fetching_page");
        assert_eq!(format!("{}", CrawlPhase::Done), "done");
    }
}
