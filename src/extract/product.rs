//! Product card extraction
//!
//! Maps one listing card onto a [`ProductRecord`] by running each field's
//! selector chain and then the matching field parser.

use crate::extract::fields::{
    normalize_image_url, parse_discount, parse_price, parse_rating, parse_rating_counts,
    parse_specification_list, Specifications,
};
use crate::extract::resolver::{first_attr, SelectorChain};
use crate::extract::ExtractError;
use crate::url::absolutize;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// Attribute carrying the site-native product identifier on each card
pub const CARD_ID_ATTR: &str = "data-id";

const CARD: &str = "div[data-id]";
const TITLE: &[&str] = &[".RG5Slk", ".KzDlHZ", "._4rR01T"];
const SALE_PRICE: &[&str] = &[".hZ3P6w", ".Nx9bqj", "._30jeq3"];
const ORIGINAL_PRICE: &[&str] = &[".y6Y9S4", "._3I9_wc", "._27UcVY"];
const DISCOUNT: &[&str] = &[".HQe8jr", ".UkUFwK", "._3Ay6Sb"];
const RATING: &[&str] = &[".MKiFS6", "._3LWZlK"];
const RATING_COUNT: &[&str] = &[".PvbNMB", "._2_R_DZ"];
const IMAGE: &[&str] = &["img.UCc1lI", "img.DByoQZ", "img._396cs4"];
const PRODUCT_URL: &[&str] = &["a.k7wcnx", "a.CGtC98", "a._1fQZEK", "a.rPDeLR"];
const SPECIFICATIONS: &[&str] = &["ul.HwRTzP", "ul._1xgFaf"];
const DETAIL_LINK: &[&str] = &["a[href*=\"/p/\"]"];

const IMAGE_ATTRS: &[&str] = &["src", "data-src"];
const HREF_ATTR: &[&str] = &["href"];

/// One product as captured from a listing page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub price: Option<i64>,
    pub price_text: Option<String>,
    pub original_price: Option<i64>,
    pub original_price_text: Option<String>,
    pub discount_percent: Option<u8>,
    pub discount_text: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<u64>,
    pub review_count: Option<u64>,
    pub specifications: Option<Specifications>,
    pub image_url: Option<String>,
    pub url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl ProductRecord {
    /// A record is worth keeping only if it has a title or a parsed price;
    /// anything else is an ad slot or placeholder card
    pub fn has_minimum_content(&self) -> bool {
        self.title.is_some() || self.price.is_some()
    }
}

/// Compiled selector chains for every extracted field
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub card: Selector,
    pub title: SelectorChain,
    pub sale_price: SelectorChain,
    pub original_price: SelectorChain,
    pub discount: SelectorChain,
    pub rating: SelectorChain,
    pub rating_count: SelectorChain,
    pub image: SelectorChain,
    pub product_url: SelectorChain,
    pub detail_link: SelectorChain,
    pub specifications: SelectorChain,
}

impl ListingSelectors {
    /// Compiles the built-in chains for the supported listing markup
    pub fn new() -> Result<Self, ExtractError> {
        let card = Selector::parse(CARD).map_err(|e| ExtractError::InvalidSelector {
            field: "card",
            selector: CARD.to_string(),
            message: format!("{:?}", e),
        })?;

        Ok(Self {
            card,
            title: SelectorChain::parse("title", TITLE)?,
            sale_price: SelectorChain::parse("sale_price", SALE_PRICE)?,
            original_price: SelectorChain::parse("original_price", ORIGINAL_PRICE)?,
            discount: SelectorChain::parse("discount", DISCOUNT)?,
            rating: SelectorChain::parse("rating", RATING)?,
            rating_count: SelectorChain::parse("rating_count", RATING_COUNT)?,
            image: SelectorChain::parse("image", IMAGE)?,
            product_url: SelectorChain::parse("product_url", PRODUCT_URL)?,
            detail_link: SelectorChain::parse("detail_link", DETAIL_LINK)?,
            specifications: SelectorChain::parse("specifications", SPECIFICATIONS)?,
        })
    }
}

/// Turns listing cards into product records
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    selectors: ListingSelectors,
    origin: Url,
}

impl ProductExtractor {
    /// Creates an extractor resolving product links against `origin`
    pub fn new(origin: Url) -> Result<Self, ExtractError> {
        Ok(Self {
            selectors: ListingSelectors::new()?,
            origin,
        })
    }

    /// All listing cards of a document, in document order
    pub fn cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.selectors.card).collect()
    }

    /// Extracts one card
    ///
    /// Missing fields are simply absent. The only failure is a product link that
    /// cannot be turned into an absolute URL.
    pub fn extract(&self, card: ElementRef<'_>) -> Result<ProductRecord, ExtractError> {
        let s = &self.selectors;

        let id = card
            .value()
            .attr(CARD_ID_ATTR)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let title = s.title.text(card);
        let price_text = s.sale_price.text(card);
        let original_price_text = s.original_price.text(card);
        let discount_text = s.discount.text(card);
        let rating_text = s.rating.text(card);
        let counts = s
            .rating_count
            .text(card)
            .map(|text| parse_rating_counts(&text))
            .unwrap_or_default();

        let image_url = s
            .image
            .attr(card, IMAGE_ATTRS)
            .map(|src| normalize_image_url(&src));

        let href = s
            .product_url
            .attr(card, HREF_ATTR)
            .or_else(|| s.detail_link.resolve(card).and_then(|a| first_attr(a, HREF_ATTR)));
        let url = href
            .map(|href| {
                absolutize(&href, &self.origin)
                    .map(|url| url.to_string())
                    .map_err(|e| ExtractError::InvalidUrl {
                        href: href.clone(),
                        message: e.to_string(),
                    })
            })
            .transpose()?;

        let specifications = s
            .specifications
            .resolve(card)
            .and_then(parse_specification_list);

        Ok(ProductRecord {
            id,
            price: price_text.as_deref().and_then(parse_price),
            original_price: original_price_text.as_deref().and_then(parse_price),
            discount_percent: discount_text.as_deref().and_then(parse_discount),
            rating: rating_text.as_deref().and_then(parse_rating),
            rating_count: counts.ratings,
            review_count: counts.reviews,
            title,
            price_text,
            original_price_text,
            discount_text,
            specifications,
            image_url,
            url,
            fetched_at: Utc::now(),
        })
    }
}
