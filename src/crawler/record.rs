//! Listing record model
//!
//! Every field is always populated, with a sentinel when the page did not
//! provide a usable value, so the CSV never has missing columns.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

pub const CITY_NOT_PRESENT: &str = "CityNotPresent";
pub const TITLE_NOT_PRESENT: &str = "NotPresent";
pub const DESC_NOT_PRESENT: &str = "DescNotPresent";
pub const OFFICE_NAME_NOT_PRESENT: &str = "OfficeNameNotPresent";
pub const OFFICE_URL_NOT_PRESENT: &str = "OfficeURLNotPresent";
pub const OFFICE_STATUS_BLANK: &str = "OfficeStatusBlank";

/// Price used when the listing shows none
pub const PRICE_SENTINEL: i64 = 1;
/// Acreage used when the listing shows none
pub const ACRES_SENTINEL: f64 = 1.0;

const ERROR_CELL: &str = "Error";

/// Output column names, in order
pub const CSV_COLUMNS: [&str; 12] = [
    "pid",
    "listing_url",
    "city",
    "price",
    "acres",
    "price_per_acre",
    "description",
    "location",
    "office_name",
    "office_url",
    "office_status",
    "date_first_seen",
];

/// Acreage of a listing, or the marker of a record that failed extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acreage {
    Measured(f64),
    Error,
}

impl fmt::Display for Acreage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measured(acres) => write!(f, "{}", acres),
            Self::Error => f.write_str(ERROR_CELL),
        }
    }
}

/// One listing, ready for output
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub pid: u64,
    pub listing_url: String,
    pub city: String,
    pub price: i64,
    pub acres: Acreage,
    pub description: String,
    pub location: String,
    pub office_name: String,
    pub office_url: String,
    pub office_status: String,
    pub date_first_seen: NaiveDate,
}

impl ListingRecord {
    /// A record with every optional field at its sentinel
    pub fn with_defaults(pid: u64, listing_url: String, location: String, date: NaiveDate) -> Self {
        Self {
            pid,
            listing_url,
            city: TITLE_NOT_PRESENT.to_string(),
            price: PRICE_SENTINEL,
            acres: Acreage::Measured(ACRES_SENTINEL),
            description: DESC_NOT_PRESENT.to_string(),
            location,
            office_name: OFFICE_NAME_NOT_PRESENT.to_string(),
            office_url: OFFICE_URL_NOT_PRESENT.to_string(),
            office_status: OFFICE_STATUS_BLANK.to_string(),
            date_first_seen: date,
        }
    }

    /// `price / acres`; `None` in the error state or without a usable acreage
    pub fn price_per_acre(&self) -> Option<f64> {
        match self.acres {
            Acreage::Measured(acres) if acres.is_finite() && acres > 0.0 => {
                Some(self.price as f64 / acres)
            }
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.acres == Acreage::Error
    }

    /// Flattened row for CSV serialization
    pub fn to_row(&self) -> ListingRow<'_> {
        let cell = |value: Option<f64>| match value {
            Some(v) => Cell::Number(v),
            None => Cell::Text(ERROR_CELL),
        };

        ListingRow {
            pid: self.pid,
            listing_url: &self.listing_url,
            city: &self.city,
            price: self.price,
            acres: cell(match self.acres {
                Acreage::Measured(acres) => Some(acres),
                Acreage::Error => None,
            }),
            price_per_acre: cell(self.price_per_acre()),
            description: &self.description,
            location: &self.location,
            office_name: &self.office_name,
            office_url: &self.office_url,
            office_status: &self.office_status,
            date_first_seen: self.date_first_seen,
        }
    }
}

/// A numeric cell that may carry the error marker instead
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(&'static str),
}

/// Serialized shape of a [`ListingRecord`]; field order is column order
#[derive(Debug, Serialize)]
pub struct ListingRow<'a> {
    pub pid: u64,
    pub listing_url: &'a str,
    pub city: &'a str,
    pub price: i64,
    pub acres: Cell,
    pub price_per_acre: Cell,
    pub description: &'a str,
    pub location: &'a str,
    pub office_name: &'a str,
    pub office_url: &'a str,
    pub office_status: &'a str,
    pub date_first_seen: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ListingRecord {
        ListingRecord::with_defaults(
            25009439,
            "https://www.landwatch.com/Coconino-County-Arizona-Land-for-sale/pid/25009439".to_string(),
            "Flagstaff-AZ".to_string(),
            NaiveDate::from_ymd_opt(2019, 10, 26).unwrap(),
        )
    }

    #[test]
    fn test_defaults_are_sentinels() {
        let r = record();
        assert_eq!(r.city, "NotPresent");
        assert_eq!(r.price, 1);
        assert_eq!(r.acres, Acreage::Measured(1.0));
        assert_eq!(r.description, "DescNotPresent");
        assert_eq!(r.office_name, "OfficeNameNotPresent");
        assert_eq!(r.office_url, "OfficeURLNotPresent");
        assert_eq!(r.office_status, "OfficeStatusBlank");
        assert!(!r.is_error());
    }

    #[test]
    fn test_sentinel_price_per_acre_is_one() {
        assert_eq!(record().price_per_acre(), Some(1.0));
    }

    #[test]
    fn test_price_per_acre_is_derived() {
        let mut r = record();
        r.price = 2_800_000;
        r.acres = Acreage::Measured(160.0);
        assert_eq!(r.price_per_acre(), Some(17500.0));

        r.acres = Acreage::Measured(3.0);
        assert_eq!(r.price_per_acre(), Some(2_800_000.0 / 3.0));
    }

    #[test]
    fn test_zero_acreage_has_no_price_per_acre() {
        let mut r = record();
        r.price = 90_000;
        r.acres = Acreage::Measured(0.0);
        assert_eq!(r.price_per_acre(), None);
    }

    #[test]
    fn test_error_state() {
        let mut r = record();
        r.acres = Acreage::Error;
        assert!(r.is_error());
        assert_eq!(r.price_per_acre(), None);
        assert_eq!(r.acres.to_string(), "Error");
        assert_eq!(r.to_row().price_per_acre, Cell::Text("Error"));
    }

    #[test]
    fn test_columns_cover_every_field() {
        assert_eq!(CSV_COLUMNS.len(), 12);
        assert_eq!(CSV_COLUMNS[0], "pid");
        assert_eq!(CSV_COLUMNS[11], "date_first_seen");
    }
}
