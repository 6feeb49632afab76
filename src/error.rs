//! Error module
//!
//! Defines custom error types using `thiserror` for the tabular CSV output.
//! A single error enum covers every failure `CsvOutput` can report, with `From`
//! conversions from the underlying csv, I/O and JSON errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::tabular::EntryKind;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TabularCsvError>;

/// The main error type for the tabular CSV output.
///
/// # Error Categories
///
/// - **Input errors**: an entry the output cannot log ([`TabularCsvError::UnacceptableInputType`])
/// - **Migration errors**: the file could not be read back or rewritten while
///   widening the header ([`TabularCsvError::HeaderMigration`])
/// - **Lifecycle errors**: the output was closed or left unusable
/// - **File I/O errors**: csv and general I/O failures outside of a migration
/// - **Configuration errors**: invalid or unparsable options
#[derive(Error, Debug)]
pub enum TabularCsvError {
    /// The entry handed to `record` is not a tabular record.
    ///
    /// Nothing is written and the output's state is left untouched.
    #[error("Unacceptable type: {0} entries cannot be logged to CSV")]
    UnacceptableInputType(EntryKind),

    /// Reading back or rewriting the file during a header migration failed.
    ///
    /// The file may be partially rewritten. The output refuses further writes
    /// after this error.
    #[error("Header migration failed for {}: {source}", .path.display())]
    HeaderMigration {
        /// The CSV file being migrated.
        path: PathBuf,
        /// What went wrong while migrating.
        #[source]
        source: MigrationError,
    },

    /// The output was closed and cannot accept more records.
    #[error("CSV output {} is closed", .0.display())]
    Closed(PathBuf),

    /// A previous header migration failed; the on-disk state is unknown.
    #[error("CSV output {} is unusable after a failed header migration", .0.display())]
    Unusable(PathBuf),

    /// CSV writing error outside of a migration.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// General I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error while loading configuration.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// The underlying cause of a [`TabularCsvError::HeaderMigration`].
///
/// Malformed rows and parse failures in the existing file are not told apart
/// from other read errors; they all arrive as [`MigrationError::Csv`].
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Opening, truncating or flushing the file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Parsing the existing rows or writing the rewritten ones failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// The header on disk does not have the columns this output wrote.
    #[error("expected a header of {expected} column(s) on disk, found {found}")]
    HeaderMismatch {
        /// Columns the output has written.
        expected: usize,
        /// Columns found in the file's first row.
        found: usize,
    },
}
