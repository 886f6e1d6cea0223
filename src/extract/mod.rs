//! Extraction engine for listing pages
//!
//! This module turns listing markup into typed product records:
//! - Ordered selector fallback chains (`resolver`)
//! - Tolerant field parsers for prices, ratings, discounts and specifications (`fields`)
//! - Card-to-record mapping (`product`)

pub mod fields;
mod product;
mod resolver;

pub use fields::{RatingCounts, Specifications};
pub use product::{ListingSelectors, ProductExtractor, ProductRecord, CARD_ID_ATTR};
pub use resolver::{element_text, first_attr, SelectorChain};

use thiserror::Error;

/// Errors raised while extracting product cards
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Invalid selector '{selector}' for {field}: {message}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        message: String,
    },

    #[error("Cannot resolve product URL '{href}': {message}")]
    InvalidUrl { href: String, message: String },
}
