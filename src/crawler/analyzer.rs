//! Landing-page analysis
//!
//! The first results page carries everything needed to plan the run:
//! - A location label derived from the title and breadcrumb headings
//! - The total result count
//! - The URL pattern of subsequent result pages
//!
//! The site shows three address shapes (county/state, city/state and bare
//! ZIP). The breadcrumb's third-from-last segment is the only thing that
//! tells a ZIP search apart, so that position is fixed.

use crate::crawler::document::{Document, Marker};
use crate::HarvestError;

/// Listings per results page
pub const PAGE_SIZE: u64 = 15;

const TITLE_SUFFIX: &str = " Land for sale :";
const COUNT_SEPARATOR: char = '\u{a0}';
/// Zero-based position of the total among the non-empty count fields
const COUNT_FIELD: usize = 4;

/// Facts about the result set, derived once from the landing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Normalised location, e.g. `Osage_County-OK` or `Flagstaff-AZ-86001`
    pub location: String,

    /// Total listings the site reports for the query
    pub num_of_results: u64,

    /// Result pages 2..N, in page order
    pub page_urls: Vec<String>,
}

impl PageContext {
    /// Total result pages, landing page included
    pub fn page_count(&self) -> usize {
        self.page_urls.len() + 1
    }
}

/// Analyzes landing-page content
pub fn analyze(content: &str) -> Result<PageContext, HarvestError> {
    analyze_document(&Document::parse(content))
}

/// Analyzes an already parsed landing page
pub fn analyze_document(document: &Document) -> Result<PageContext, HarvestError> {
    let location = parse_location(document)?;
    let num_of_results = parse_num_of_results(document)?;
    let page_urls = paginated_urls(document, num_of_results)?;

    Ok(PageContext {
        location,
        num_of_results,
        page_urls,
    })
}

/// Builds the location label from the `h1` title and `h2` breadcrumb
pub fn parse_location(document: &Document) -> Result<String, HarvestError> {
    let title = document
        .find_first(&Marker::tag("h1"))
        .ok_or_else(|| malformed("title heading (h1) missing"))?
        .text();
    let breadcrumb = document
        .find_first(&Marker::tag("h2"))
        .ok_or_else(|| malformed("breadcrumb heading (h2) missing"))?
        .text();

    let mut location = title
        .replace(TITLE_SUFFIX, "")
        .replace(", ", "-")
        .replace(' ', "_");

    if let Some(zipcode) = breadcrumb_zipcode(&breadcrumb) {
        location.push('-');
        location.push_str(&zipcode);
    }

    Ok(location)
}

/// Third-from-last breadcrumb segment, when it is purely numeric
fn breadcrumb_zipcode(breadcrumb: &str) -> Option<String> {
    let collapsed = breadcrumb.replace("\n\n", "\n");
    let segments: Vec<&str> = collapsed.split('\n').collect();
    let candidate = segments.get(segments.len().checked_sub(3)?)?;

    (!candidate.is_empty() && candidate.chars().all(char::is_numeric))
        .then(|| candidate.to_string())
}

/// Reads the total from the result-count marker, `1` when it is absent
pub fn parse_num_of_results(document: &Document) -> Result<u64, HarvestError> {
    let Some(marker) = document.find_first(&Marker::with_class("span", "resultscount")) else {
        tracing::debug!("No result-count marker, assuming a single page");
        return Ok(1);
    };

    let text = marker.text();
    let field = text
        .split(COUNT_SEPARATOR)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .nth(COUNT_FIELD)
        .ok_or_else(|| malformed(&format!("result count text '{}' is too short", text)))?;

    field
        .replace(',', "")
        .parse::<u64>()
        .map_err(|_| malformed(&format!("result count '{}' is not a number", field)))
}

/// URLs of pages 2..=ceil(count / 15), derived from the `next` link
pub fn paginated_urls(document: &Document, num_of_results: u64) -> Result<Vec<String>, HarvestError> {
    if num_of_results <= PAGE_SIZE {
        return Ok(Vec::new());
    }

    let next_href = document
        .find_first(&Marker::with_attr("link", "rel", "next"))
        .and_then(|link| link.attr("href"))
        .ok_or_else(|| malformed("next-page link missing on a multi-page result set"))?;

    let base = trim_last_char(next_href);
    let num_of_pages = num_of_results.div_ceil(PAGE_SIZE);

    Ok((2..=num_of_pages)
        .map(|page| format!("{}{}", base, page))
        .collect())
}

fn trim_last_char(s: &str) -> &str {
    match s.char_indices().last() {
        Some((index, _)) => &s[..index],
        None => s,
    }
}

fn malformed(reason: &str) -> HarvestError {
    HarvestError::MalformedLandingPage(reason.to_string())
}
