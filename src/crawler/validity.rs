//! Content validity check
//!
//! The proxy layer happily returns 200 with a CAPTCHA or block page, so a
//! successful transport call is not enough: a page only counts once the
//! marker of a genuine results page is present.
//!
//! The landing page is judged more loosely: a search with no results has
//! no listing markup but still carries its header and result count.

use crate::crawler::document::{Document, Marker};

/// Decides whether fetched content is a genuine listing-results page
#[derive(Debug, Clone)]
pub struct ValidityCheck {
    markers: Vec<Marker>,
}

impl ValidityCheck {
    pub fn new(marker: Marker) -> Self {
        Self {
            markers: vec![marker],
        }
    }

    /// Check for the first page of a search
    ///
    /// Accepts the listing marker or the result count, so an empty search
    /// reaches analysis instead of being retried as a block page.
    pub fn landing(marker: Marker) -> Self {
        Self {
            markers: vec![marker, Marker::with_class("span", "resultscount")],
        }
    }

    /// True when any of the markers is present
    pub fn is_valid(&self, content: &str) -> bool {
        let document = Document::parse(content);
        self.markers.iter().any(|marker| document.contains(marker))
    }
}

impl Default for ValidityCheck {
    fn default() -> Self {
        Self::new(Marker::with_class("div", "result"))
    }
}
