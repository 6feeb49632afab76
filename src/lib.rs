//! Tabular CSV output
//!
//! This library provides a log output that writes tabular records to a single
//! CSV file. Records may add columns at any time: the file is rewritten under
//! the widened header, with empty cells backfilled for earlier rows, and
//! streaming resumes.
//!
//! It includes modules for the record types, the output interface, output
//! configuration, and the CSV writer itself.

pub mod config;
pub mod csv_output;
pub mod error;
pub mod output;
pub mod tabular;

pub use config::CsvOutputConfig;
pub use csv_output::CsvOutput;
pub use error::{MigrationError, Result, TabularCsvError};
pub use output::LogOutput;
pub use tabular::{EntryKind, LogEntry, TabularInput, Value};
