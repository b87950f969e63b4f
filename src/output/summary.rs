//! End-of-run summary

use crate::crawler::CrawlReport;
use std::path::Path;

/// Formats the counters of a finished crawl as a plain-text block
pub fn format_run_summary(report: &CrawlReport, output_path: &Path) -> String {
    let mut text = String::new();
    let seconds = report.elapsed.as_secs_f64();

    text.push_str("=== Scrape Summary ===\n\n");

    if let Some(started) = report.started_at {
        text.push_str(&format!("Started:  {}\n", started.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if let Some(finished) = report.finished_at {
        text.push_str(&format!("Finished: {}\n", finished.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    text.push_str(&format!(
        "Duration: {:.1} seconds ({:.2} minutes)\n\n",
        seconds,
        seconds / 60.0
    ));

    text.push_str(&format!(
        "Listing pages: {} fetched, {} failed (of {})\n",
        report.listing_pages_fetched, report.listing_pages_failed, report.listing_pages_requested
    ));
    text.push_str(&format!(
        "Unique restaurants found: {}\n",
        report.restaurants_discovered
    ));
    text.push_str(&format!(
        "Detail pages: {} fetched, {} failed\n",
        report.details_fetched, report.details_failed
    ));
    text.push_str(&format!("Rows written: {}\n", report.records));
    text.push_str(&format!("Output: {}\n", output_path.display()));

    text
}

/// Prints the run summary to stdout
pub fn print_run_summary(report: &CrawlReport, output_path: &Path) {
    println!("{}", format_run_summary(report, output_path));
}
