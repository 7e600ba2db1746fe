//! CSV encoding of listing records

use crate::crawler::record::CSV_COLUMNS;
use crate::crawler::ListingRecord;
use crate::output::SinkResult;
use chrono::NaiveDate;

/// Object name for a run: `{YYYY-MM-DD}-{location}.csv`
pub fn object_key(date: NaiveDate, location: &str) -> String {
    format!("{}-{}.csv", date.format("%Y-%m-%d"), location)
}

/// Encodes records as CSV with a header row, even when there are none
pub fn to_csv_bytes(records: &[ListingRecord]) -> SinkResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_COLUMNS)?;
    for record in records {
        writer.serialize(record.to_row())?;
    }

    writer.into_inner().map_err(|e| e.into_error().into())
}
