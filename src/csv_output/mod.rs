//! CSV output module
//!
//! Writes tabular records to a CSV file and keeps the file valid when the
//! set of logged columns changes between records.

pub mod header;
pub mod stats;
pub mod warnings;
pub mod writer;

pub use header::Header;
pub use stats::WriteStats;
pub use warnings::{WarningLog, WARNING_CATEGORY};
pub use writer::CsvOutput;
