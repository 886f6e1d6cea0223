//! State module for tracking crawl progress
//!
//! This module provides the run-scoped state owned by a single crawl coordinator.
//!
//! # Components
//!
//! - `CrawlPhase`: Where the page loop currently is (fetching, extracting, evaluating, done, failed)
//! - `CrawlState`: Accepted records, seen product ids and run counters

mod crawl_phase;
mod crawl_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use crawl_state::{Admission, CrawlState};
