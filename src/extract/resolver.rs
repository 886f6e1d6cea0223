//! Ordered selector fallback chains
//!
//! A listing site usually serves several markup generations at once, so every
//! logical field is located through a list of candidate selectors. Candidates are
//! tried strictly in the listed order and the first one with any match inside the
//! container wins, even if a later candidate would have matched "better".

use crate::extract::ExtractError;
use scraper::{ElementRef, Selector};

/// An ordered list of compiled candidate selectors for one field
#[derive(Debug, Clone)]
pub struct SelectorChain {
    field: &'static str,
    patterns: Vec<&'static str>,
    candidates: Vec<Selector>,
}

impl SelectorChain {
    /// Compiles every candidate pattern, in order
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidSelector`] naming the first pattern that
    /// does not compile.
    pub fn parse(field: &'static str, patterns: &[&'static str]) -> Result<Self, ExtractError> {
        let candidates = patterns
            .iter()
            .map(|pattern| {
                Selector::parse(pattern).map_err(|e| ExtractError::InvalidSelector {
                    field,
                    selector: (*pattern).to_string(),
                    message: format!("{:?}", e),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            field,
            patterns: patterns.to_vec(),
            candidates,
        })
    }

    /// Returns the first matching descendant together with the index of the
    /// candidate that produced it
    pub fn resolve_with_index<'a>(&self, container: ElementRef<'a>) -> Option<(usize, ElementRef<'a>)> {
        self.candidates
            .iter()
            .enumerate()
            .find_map(|(index, selector)| container.select(selector).next().map(|el| (index, el)))
    }

    /// Returns the first matching descendant of `container`
    pub fn resolve<'a>(&self, container: ElementRef<'a>) -> Option<ElementRef<'a>> {
        let (index, element) = self.resolve_with_index(container)?;
        if index > 0 {
            tracing::trace!(
                "{} resolved by fallback selector {}",
                self.field,
                self.patterns[index]
            );
        }
        Some(element)
    }

    /// Trimmed text of the resolved element, absent when nothing matched or the
    /// winning element is blank
    pub fn text(&self, container: ElementRef<'_>) -> Option<String> {
        self.resolve(container)
            .map(element_text)
            .filter(|text| !text.is_empty())
    }

    /// First non-empty attribute of the resolved element, checked in `names` order
    pub fn attr(&self, container: ElementRef<'_>, names: &[&str]) -> Option<String> {
        self.resolve(container).and_then(|el| first_attr(el, names))
    }
}

/// Concatenated, trimmed text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First attribute among `names` that is present and non-empty
pub fn first_attr(element: ElementRef<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
