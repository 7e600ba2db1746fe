//! Run summary
//!
//! Collected by the pipeline while it runs and printed by the CLI at the end.

use std::time::Duration;

/// Outcome of one harvest run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestSummary {
    /// Location label of the result set
    pub location: String,

    /// Result count reported by the landing page
    pub expected_results: u64,

    /// Result pages requested, landing page included
    pub pages_requested: usize,

    /// Pages that passed the validity check
    pub pages_fetched: usize,

    /// Pages given up after exhausting their attempts
    pub pages_failed: usize,

    /// Records written, error-state records included
    pub records: usize,

    /// Records in the error state
    pub error_records: usize,

    /// Listings dropped for lack of a title link
    pub skipped_listings: usize,

    /// Where the output ended up
    pub output: String,

    pub elapsed: Duration,
}

impl HarvestSummary {
    /// Share of expected results that made it into the output, as a percentage
    pub fn coverage(&self) -> f64 {
        if self.expected_results == 0 {
            return 0.0;
        }
        (self.records as f64 / self.expected_results as f64) * 100.0
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &HarvestSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Location: {}", summary.location);
    println!("Output:   {}", summary.output);
    println!("Elapsed:  {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    println!("Pages:");
    println!("  Requested: {}", summary.pages_requested);
    println!("  Fetched:   {}", summary.pages_fetched);
    println!("  Failed:    {}", summary.pages_failed);
    println!();

    println!("Listings:");
    println!("  Expected:     {}", summary.expected_results);
    println!("  Written:      {}", summary.records);
    println!("  Error state:  {}", summary.error_records);
    println!("  Skipped:      {}", summary.skipped_listings);
    println!();

    println!(
        "Coverage: {:.1}% ({} / {} listings)",
        summary.coverage(),
        summary.records,
        summary.expected_results
    );
}
