//! Listing extraction
//!
//! Turns the markup of one listing into a [`ListingRecord`]. Only the
//! title link is mandatory: without it there is no pid and no detail URL.
//! Every other field falls back to its sentinel, and a field that is
//! present but unreadable degrades the whole record to the error state.

use crate::crawler::analyzer::PageContext;
use crate::crawler::document::{Document, Marker, Node};
use crate::crawler::record::{
    Acreage, ListingRecord, CITY_NOT_PRESENT, PRICE_SENTINEL,
};
use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

/// Origin that relative listing and office links are resolved against
pub const SITE_BASE_URL: &str = "https://www.landwatch.com";

/// Comma-terminated alphanumeric token, as in `Flagstaff, AZ,`
static CITY_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",?[a-zA-Z][a-zA-Z0-9]*,").expect("valid city regex"));

/// Errors raised while extracting one listing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No title link, so the listing cannot be identified
    #[error("listing has no title link")]
    MissingListingLink,

    #[error("listing link '{href}' does not end in a numeric pid")]
    InvalidPid { href: String },

    /// A field was present but could not be read
    #[error("field '{field}' unreadable: {reason}")]
    Record { field: &'static str, reason: String },
}

/// Records extracted from one results page
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub records: Vec<ListingRecord>,

    /// Listings dropped for lack of an identity
    pub skipped: usize,
}

/// Extracts listing records from result-page markup
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    base_url: Url,
    listing: Marker,
    title: Marker,
    link: Marker,
    description: Marker,
    office: Marker,
    agent: Marker,
}

impl ListingExtractor {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            listing: Marker::with_class("div", "result"),
            title: Marker::with_class("div", "propName"),
            link: Marker::tag("a"),
            description: Marker::with_class("div", "description"),
            office: Marker::with_class("a", "officename"),
            agent: Marker::with_class("div", "propertyAgent"),
        }
    }

    /// Extracts one listing, stamped with today's local date
    pub fn extract(&self, fragment: &Node<'_>, ctx: &PageContext) -> Result<ListingRecord, ExtractError> {
        self.extract_at(fragment, ctx, Local::now().date_naive())
    }

    /// Extracts one listing, stamped with `date`
    pub fn extract_at(
        &self,
        fragment: &Node<'_>,
        ctx: &PageContext,
        date: NaiveDate,
    ) -> Result<ListingRecord, ExtractError> {
        let (pid, listing_url) = self.identify(fragment)?;
        let mut record = ListingRecord::with_defaults(pid, listing_url, ctx.location.clone(), date);

        if let Err(err) = self.fill_fields(fragment, &mut record) {
            tracing::debug!(pid, error = %err, "Listing degraded to error state");
            record.acres = Acreage::Error;
        }

        Ok(record)
    }

    /// Extracts every listing on a fetched results page
    ///
    /// Listings without an identity are skipped with a warning; the rest
    /// are returned in page order.
    pub fn extract_page(&self, content: &str, ctx: &PageContext, date: NaiveDate) -> PageExtraction {
        let document = Document::parse(content);
        let mut extraction = PageExtraction::default();

        for fragment in document.find_all(&self.listing) {
            match self.extract_at(&fragment, ctx, date) {
                Ok(record) => extraction.records.push(record),
                Err(err) => {
                    tracing::warn!(location = %ctx.location, error = %err, "Skipping listing");
                    extraction.skipped += 1;
                }
            }
        }

        extraction
    }

    fn identify(&self, fragment: &Node<'_>) -> Result<(u64, String), ExtractError> {
        let href = fragment
            .find_first(&self.title)
            .and_then(|title| title.find_first(&self.link))
            .and_then(|link| link.attr("href"))
            .ok_or(ExtractError::MissingListingLink)?;

        let invalid = || ExtractError::InvalidPid {
            href: href.to_string(),
        };
        let listing_url = self.base_url.join(href).map_err(|_| invalid())?;
        let pid = listing_url
            .path()
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<u64>().ok())
            .ok_or_else(invalid)?;

        Ok((pid, listing_url.to_string()))
    }

    /// Fills the optional fields in order, stopping at the first unreadable one
    fn fill_fields(&self, fragment: &Node<'_>, record: &mut ListingRecord) -> Result<(), ExtractError> {
        if let Some(text) = fragment.find_text("Acre") {
            record.acres = Acreage::Measured(parse_acres(text)?);
        } else {
            tracing::trace!(pid = record.pid, "No acreage, using sentinel");
        }

        let title = fragment.find_first(&self.title).map(|node| node.text());
        record.price = match &title {
            Some(text) => parse_price(text)?,
            None => PRICE_SENTINEL,
        };
        if let Some(text) = &title {
            record.city = parse_city(text);
        }

        if let Some(description) = fragment.find_first(&self.description) {
            record.description = description.text().trim().to_string();
        }

        if let Some(office) = fragment.find_first(&self.office) {
            record.office_name = office.text();
            let href = office.attr("href").ok_or_else(|| field_error("office_url", "link has no href"))?;
            record.office_url = self
                .base_url
                .join(href)
                .map_err(|e| field_error("office_url", &e.to_string()))?
                .to_string();
        }

        if let Some(agent) = fragment.find_first(&self.agent) {
            record.office_status = parse_office_status(&agent.text())?;
        }

        Ok(())
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new(Url::parse(SITE_BASE_URL).expect("valid site base URL"))
    }
}

fn field_error(field: &'static str, reason: &str) -> ExtractError {
    ExtractError::Record {
        field,
        reason: reason.to_string(),
    }
}

/// `"160.00 Acres"` -> `160.0`
///
/// Acreage must be positive, otherwise no price per acre can be derived.
fn parse_acres(text: &str) -> Result<f64, ExtractError> {
    let value = text.split("Acre").next().unwrap_or_default().trim().replace(',', "");
    let acres = value
        .parse::<f64>()
        .map_err(|_| field_error("acres", &format!("'{}' is not a number", text.trim())))?;

    if !acres.is_finite() || acres <= 0.0 {
        return Err(field_error("acres", &format!("'{}' is not a usable acreage", text.trim())));
    }
    Ok(acres)
}

/// Amount after the last `$` of the title
fn parse_price(title: &str) -> Result<i64, ExtractError> {
    let amount = title.rsplit('$').next().unwrap_or_default().trim().replace(',', "");
    amount
        .parse::<i64>()
        .map_err(|_| field_error("price", &format!("'{}' is not a price", amount)))
}

/// City from a `City, ST` title prefix
///
/// The end of the prefix counts as a delimiter. Exactly two tokens must
/// match; any other shape is reported as [`CITY_NOT_PRESENT`].
fn parse_city(title: &str) -> String {
    let prefix = format!("{},", title.split('$').next().unwrap_or_default().trim());
    let tokens: Vec<&str> = CITY_TOKEN_RE.find_iter(&prefix).map(|m| m.as_str()).collect();

    match tokens.as_slice() {
        [city, _] => city.replace(',', ""),
        _ => CITY_NOT_PRESENT.to_string(),
    }
}

/// Second line of the agent block, e.g. `Signature Partner`
fn parse_office_status(block: &str) -> Result<String, ExtractError> {
    block
        .trim()
        .split('\n')
        .nth(1)
        .map(|line| line.trim().to_string())
        .ok_or_else(|| field_error("office_status", "agent block has a single line"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::record::{
        DESC_NOT_PRESENT, OFFICE_NAME_NOT_PRESENT, OFFICE_STATUS_BLANK, OFFICE_URL_NOT_PRESENT,
        TITLE_NOT_PRESENT,
    };

    const LINK: &str = "/Coconino-County-Arizona-Land-for-sale/pid/25009439";

    fn ctx() -> PageContext {
        PageContext {
            location: "Flagstaff-AZ-86001".to_string(),
            num_of_results: 1,
            page_urls: Vec::new(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 10, 26).unwrap()
    }

    fn extract(html: &str) -> Result<ListingRecord, ExtractError> {
        let doc = Document::parse_fragment(html);
        ListingExtractor::default().extract_at(&doc.root(), &ctx(), date())
    }

    fn flagstaff(extra: &str) -> String {
        format!(
            r#"<div class="result">
                <div class="propName"><a href="{}">Flagstaff, AZ $2,800,000</a></div>
                <div class="propSize">160.00 Acres</div>
                {}
            </div>"#,
            LINK, extra
        )
    }

    #[test]
    fn test_flagstaff_listing() {
        let record = extract(&flagstaff("")).unwrap();
        assert_eq!(record.pid, 25009439);
        assert_eq!(
            record.listing_url,
            "https://www.landwatch.com/Coconino-County-Arizona-Land-for-sale/pid/25009439"
        );
        assert_eq!(record.city, "Flagstaff");
        assert_eq!(record.price, 2_800_000);
        assert_eq!(record.acres, Acreage::Measured(160.0));
        assert_eq!(record.price_per_acre(), Some(17500.0));
        assert_eq!(record.office_name, OFFICE_NAME_NOT_PRESENT);
        assert_eq!(record.office_url, OFFICE_URL_NOT_PRESENT);
        assert_eq!(record.office_status, OFFICE_STATUS_BLANK);
        assert_eq!(record.location, "Flagstaff-AZ-86001");
        assert_eq!(record.date_first_seen, date());
    }

    #[test]
    fn test_office_fields() {
        let record = extract(&flagstaff(
            r#"<a class="officename" href="/default.aspx?ct=r&amp;type=146,157956">First United Realty, Inc.</a>
               <div class="propertyAgent">
                   Listed by
                   Signature Partner
               </div>"#,
        ))
        .unwrap();
        assert_eq!(record.office_name, "First United Realty, Inc.");
        assert_eq!(
            record.office_url,
            "https://www.landwatch.com/default.aspx?ct=r&type=146,157956"
        );
        assert_eq!(record.office_status, "Signature Partner");
        assert!(!record.is_error());
    }

    #[test]
    fn test_description() {
        let missing = extract(&flagstaff("")).unwrap();
        assert_eq!(missing.description, DESC_NOT_PRESENT);

        let present = extract(&flagstaff(
            r#"<div class="description">
                  Absolutely beautiful 160 acre parcel.  </div>"#,
        ))
        .unwrap();
        assert_eq!(present.description, "Absolutely beautiful 160 acre parcel.");
    }

    #[test]
    fn test_link_outside_title_block_is_hard_failure() {
        let record = extract(&format!(
            r#"<div class="result"><div class="title"><a href="{}">x</a></div></div>"#,
            LINK
        ));
        assert_eq!(record, Err(ExtractError::MissingListingLink));
    }

    #[test]
    fn test_default_record_has_unit_price_per_acre() {
        let record = ListingRecord::with_defaults(1, LINK.to_string(), "X".to_string(), date());
        assert_eq!(record.price, PRICE_SENTINEL);
        assert_eq!(record.acres, Acreage::Measured(1.0));
        assert_eq!(record.price_per_acre(), Some(1.0));
    }

    #[test]
    fn test_zero_acreage_degrades_record() {
        let record = extract(&format!(
            r#"<div class="result">
                <div class="propName"><a href="/x/pid/5">Flagstaff, AZ $2,800,000</a></div>
                <div>0 Acres</div>
            </div>"#
        ))
        .unwrap();
        assert_eq!(record.pid, 5);
        assert!(record.is_error());
        assert_eq!(record.acres, Acreage::Error);
        assert_eq!(record.price_per_acre(), None);

        let csv = String::from_utf8(crate::output::to_csv_bytes(&[record]).unwrap()).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",2800000,Error,Error,"));
        assert!(!row.contains("inf"));
    }

    #[test]
    fn test_title_without_acreage() {
        let record = extract(&format!(
            r#"<div class="result"><div class="propName"><a href="{}">Flagstaff, AZ $90,000</a></div></div>"#,
            LINK
        ))
        .unwrap();
        assert_eq!(record.acres, Acreage::Measured(1.0));
        assert_eq!(record.price, 90_000);
        assert_eq!(record.price_per_acre(), Some(90_000.0));
    }

    #[test]
    fn test_idempotent_apart_from_date() {
        let html = flagstaff(r#"<div class="description">Views</div>"#);
        let doc = Document::parse_fragment(&html);
        let extractor = ListingExtractor::default();

        let first = extractor.extract_at(&doc.root(), &ctx(), date()).unwrap();
        let mut second = extractor
            .extract_at(&doc.root(), &ctx(), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
            .unwrap();
        assert_ne!(first, second);

        second.date_first_seen = first.date_first_seen;
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_link_is_hard_failure() {
        let result = extract(r#"<div class="result"><div class="propName">Flagstaff, AZ $1</div></div>"#);
        assert_eq!(result, Err(ExtractError::MissingListingLink));
    }

    #[test]
    fn test_non_numeric_pid_is_hard_failure() {
        let result = extract(
            r#"<div class="result"><div class="propName"><a href="/listing/abc">x $1</a></div></div>"#,
        );
        assert!(matches!(result, Err(ExtractError::InvalidPid { .. })));
    }

    #[test]
    fn test_unreadable_acreage_degrades_record() {
        let record = extract(&format!(
            r#"<div class="result">
                <div class="propName"><a href="{}">Flagstaff, AZ $2,800,000</a></div>
                <span>Many Acres</span>
                <div class="description">Kept</div>
            </div>"#,
            LINK
        ))
        .unwrap();
        assert!(record.is_error());
        assert_eq!(record.price_per_acre(), None);
        assert_eq!(record.pid, 25009439);
        // later fields keep their sentinels
        assert_eq!(record.description, DESC_NOT_PRESENT);
    }

    #[test]
    fn test_single_line_agent_block_degrades_record() {
        let record = extract(&flagstaff(
            r#"<div class="description">Kept</div><div class="propertyAgent">Listed by</div>"#,
        ))
        .unwrap();
        assert!(record.is_error());
        assert_eq!(record.description, "Kept");
        assert_eq!(record.city, "Flagstaff");
    }

    #[test]
    fn test_office_link_without_href_degrades_record() {
        let record = extract(&flagstaff(r#"<a class="officename">Realty</a>"#)).unwrap();
        assert!(record.is_error());
        assert_eq!(record.office_name, "Realty");
        assert_eq!(record.office_url, OFFICE_URL_NOT_PRESENT);
    }

    #[test]
    fn test_city_two_token_policy() {
        assert_eq!(parse_city("Flagstaff, AZ $2,800,000"), "Flagstaff");
        assert_eq!(parse_city("Flagstaff, AZ"), "Flagstaff");
        assert_eq!(parse_city("Pawhuska, OK, Osage County $5"), CITY_NOT_PRESENT);
        assert_eq!(parse_city("Oklahoma $5"), CITY_NOT_PRESENT);
        assert_eq!(parse_city("160 Acres $5"), CITY_NOT_PRESENT);
    }

    #[test]
    fn test_no_title_block_city() {
        let record = ListingRecord::with_defaults(1, LINK.to_string(), "X".to_string(), date());
        assert_eq!(record.city, TITLE_NOT_PRESENT);
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("Flagstaff, AZ $2,800,000"), Ok(2_800_000));
        assert_eq!(parse_price("Reduced $1 now $45,500 "), Ok(45_500));
        assert!(parse_price("Call for price").is_err());
    }

    #[test]
    fn test_parse_acres() {
        assert_eq!(parse_acres("160.00 Acres"), Ok(160.0));
        assert_eq!(parse_acres(" 2.5 Acre Lot"), Ok(2.5));
        assert_eq!(parse_acres("1,200 Acres"), Ok(1200.0));
        assert!(parse_acres("Acres").is_err());
    }

    #[test]
    fn test_extract_page_skips_unidentified_listings() {
        let page = format!(
            r#"<html><body>
                {}
                <div class="result"><div class="propName">No link $5</div></div>
                {}
            </body></html>"#,
            flagstaff(""),
            flagstaff("")
        );
        let extraction = ListingExtractor::default().extract_page(&page, &ctx(), date());
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.skipped, 1);
    }
}
