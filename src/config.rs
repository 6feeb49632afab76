//! Configuration for [`CsvOutput`](crate::csv_output::CsvOutput).
//!
//! Options can be built in code or loaded from JSON:
//!
//! ```
//! use tabular_csv::config::CsvOutputConfig;
//!
//! let config = CsvOutputConfig::from_json_str(
//!     r#"{"path": "logs/progress.csv", "disable_warnings": true}"#,
//! ).unwrap();
//! assert!(config.disable_warnings);
//! assert!(!config.flush_every_record);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TabularCsvError};

/// Options for a single CSV output file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CsvOutputConfig {
    /// File the output writes to. Missing parent directories are created.
    pub path: PathBuf,
    /// Suppress all warnings from this output. Intended for test harnesses.
    #[serde(default)]
    pub disable_warnings: bool,
    /// Flush the file after every row instead of on `dump`/`close`.
    #[serde(default)]
    pub flush_every_record: bool,
}

impl CsvOutputConfig {
    /// Options for writing to `path` with warnings on and buffered flushing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            disable_warnings: false,
            flush_every_record: false,
        }
    }

    /// Starts the output with warnings suppressed.
    pub fn with_warnings_disabled(mut self) -> Self {
        self.disable_warnings = true;
        self
    }

    /// Flushes the file after every row.
    pub fn with_flush_every_record(mut self) -> Self {
        self.flush_every_record = true;
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Rejects an empty path.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(TabularCsvError::Config(
                "path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
