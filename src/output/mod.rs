//! Output module for the scraped table and reports
//!
//! This module handles:
//! - Writing merged records as a CSV table (and reading it back)
//! - Printing the end-of-run summary
//! - Computing descriptive insights over a written table

pub mod csv;
pub mod insights;
mod summary;

pub use self::csv::{read_table, write_records, write_table};
pub use insights::{compute_insights, print_insights, write_insights_json, Insights};
pub use summary::{format_run_summary, print_run_summary};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table has no '{0}' column")]
    MissingColumn(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
