//! URL handling module for Listing-Sweep
//!
//! This module builds paginated listing URLs and normalizes the links and image
//! sources pulled out of product cards.

mod normalize;

pub use normalize::{absolutize, parse_listing_url, site_origin, strip_query};

use url::Url;

/// Name of the query parameter carrying the page number
pub const PAGE_PARAM: &str = "page";

/// A single listing page to fetch
///
/// Page 1 is the base URL exactly as configured. Every later page carries a
/// `page` query parameter, replacing any value already present in the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    base: Url,
    page: u32,
}

impl PageRequest {
    /// Creates a request for the given page; page numbers below 1 are treated as 1
    pub fn new(base: &Url, page: u32) -> Self {
        Self {
            base: base.clone(),
            page: page.max(1),
        }
    }

    /// The 1-based page number
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Builds the URL for this page
    ///
    /// # Examples
    ///
    /// ```
    /// use listing_sweep::url::PageRequest;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://shop.example/list?q=tv").unwrap();
    /// assert_eq!(PageRequest::new(&base, 1).url().as_str(), "https://shop.example/list?q=tv");
    /// assert_eq!(
    ///     PageRequest::new(&base, 3).url().as_str(),
    ///     "https://shop.example/list?q=tv&page=3"
    /// );
    /// ```
    pub fn url(&self) -> Url {
        if self.page <= 1 {
            return self.base.clone();
        }
        build_page_url(&self.base, self.page)
    }
}

/// Sets the `page` query parameter on a copy of `base`
///
/// The first existing `page` parameter keeps its position and gets the new value;
/// any further duplicates are dropped. Without an existing one, it is appended.
pub fn build_page_url(base: &Url, page: u32) -> Url {
    let page_value = page.to_string();
    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = Vec::new();

    for (key, value) in base.query_pairs() {
        if key == PAGE_PARAM {
            if !replaced {
                pairs.push((key.into_owned(), page_value.clone()));
                replaced = true;
            }
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }

    if !replaced {
        pairs.push((PAGE_PARAM.to_string(), page_value));
    }

    let mut url = base.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    url
}
