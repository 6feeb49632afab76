use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Writer};
use tracing::{debug, error, info};

use super::header::Header;
use super::stats::WriteStats;
use super::warnings::WarningLog;
use crate::config::CsvOutputConfig;
use crate::error::{MigrationError, Result, TabularCsvError};
use crate::output::LogOutput;
use crate::tabular::{EntryKind, LogEntry};

/// Rows read back from the file during a migration, keyed by column name.
type StoredRow = HashMap<String, String>;

/// Where the output is in its lifecycle.
enum State {
    /// No record accepted yet; the file has not been created.
    Unopened,
    /// The header has been written and rows are appended to `Writer`.
    Streaming(Writer<File>),
    /// A migration is in progress, or one failed. Nothing may be written.
    Failed,
    /// `close` was called.
    Closed,
}

/// CSV log output for tabular records whose columns may change over time.
///
/// The first record fixes the initial header. Records with the same set of
/// keys are appended as plain rows. A record with a different set of keys
/// triggers a header migration: the file is closed, read back in full,
/// rewritten under the union of the old and new columns with empty cells for
/// values a row never had, and then streaming resumes. A migration costs a
/// full read and rewrite of the file, so it should stay rare.
///
/// # CSV Format
///
/// RFC 4180 with a comma delimiter and `\n` line endings. Column order is the
/// first record's key order, with later columns appended as they appear.
/// Fields containing commas, double quotes or newlines are quoted by the
/// underlying csv crate.
///
/// # Concurrency
///
/// One writer per file. `record` borrows the output mutably; callers sharing
/// an output between threads must serialize access themselves.
///
/// # Example
///
/// ```no_run
/// use tabular_csv::csv_output::CsvOutput;
/// use tabular_csv::tabular::{LogEntry, TabularInput};
///
/// let mut output = CsvOutput::new("progress.csv").unwrap();
///
/// let mut table = TabularInput::new();
/// table.record("epoch", 1);
/// table.record("loss", 0.5);
/// let mut entry = LogEntry::from(table);
/// output.record(&mut entry).unwrap();
///
/// output.close().unwrap();
/// ```
pub struct CsvOutput {
    path: PathBuf,
    header: Header,
    state: State,
    warnings: WarningLog,
    flush_every_record: bool,
    stats: WriteStats,
}

impl CsvOutput {
    /// Creates an output writing to `path` with default options.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(CsvOutputConfig::new(path))
    }

    /// Creates an output from `config`, creating missing parent directories.
    ///
    /// The file itself is created when the first record arrives.
    pub fn with_config(config: CsvOutputConfig) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut warnings = WarningLog::new();
        if config.disable_warnings {
            warnings.disable();
        }

        Ok(Self {
            path: config.path,
            header: Header::new(),
            state: State::Unopened,
            warnings,
            flush_every_record: config.flush_every_record,
            stats: WriteStats::default(),
        })
    }

    /// Entry kinds this output records.
    pub fn types_accepted(&self) -> &'static [EntryKind] {
        &[EntryKind::Tabular]
    }

    /// Writes a tabular entry as one CSV row, widening the header first if the
    /// entry's keys differ from the current columns.
    ///
    /// Every key written is marked on the entry.
    ///
    /// # Errors
    ///
    /// - [`TabularCsvError::UnacceptableInputType`] for non-tabular entries.
    ///   Nothing is written and the output is unchanged.
    /// - [`TabularCsvError::Closed`] after [`CsvOutput::close`].
    /// - [`TabularCsvError::Unusable`] after a failed migration.
    /// - [`TabularCsvError::HeaderMigration`] if the file could not be read
    ///   back or rewritten. The output is unusable afterwards.
    /// - [`TabularCsvError::Csv`] if appending the row fails.
    pub fn record(&mut self, entry: &mut LogEntry) -> Result<()> {
        let table = match entry {
            LogEntry::Tabular(table) => table,
            other => return Err(TabularCsvError::UnacceptableInputType(other.kind())),
        };
        self.check_writable()?;

        let fields = table.as_primitive_dict();
        if fields.is_empty() {
            self.warn(&format!(
                "Skipped a tabular record with no primitive values for {}",
                self.path.display()
            ));
            return Ok(());
        }
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();

        if matches!(self.state, State::Unopened) {
            self.header = Header::from_columns(keys.iter().copied());
            self.state = State::Streaming(self.open_with_header()?);
        } else if !self.header.matches(keys.iter().copied()) {
            self.migrate(&keys)?;
        }

        self.write_row(&fields)?;

        for key in keys {
            table.mark(key);
        }
        Ok(())
    }

    /// Emits `msg` as a warning once per distinct message.
    ///
    /// Returns true if the warning was emitted.
    pub fn warn(&mut self, msg: &str) -> bool {
        self.warnings.warn(msg)
    }

    /// Suppresses all further warnings from this output.
    pub fn disable_warnings(&mut self) {
        self.warnings.disable();
    }

    /// The warnings this output has seen so far.
    pub fn warnings(&self) -> &WarningLog {
        &self.warnings
    }

    /// Flushes buffered rows to disk.
    pub fn dump(&mut self) -> Result<()> {
        self.check_writable()?;
        if let State::Streaming(writer) = &mut self.state {
            writer.flush()?;
        }
        Ok(())
    }

    /// Flushes and closes the file. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let previous = std::mem::replace(&mut self.state, State::Closed);
        if let State::Streaming(writer) = previous {
            writer.into_inner().map_err(|e| e.into_error())?;
            debug!("Closed CSV output {}", self.path.display());
        }
        Ok(())
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// The file this output writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current columns in file order. Empty until the first record.
    pub fn header(&self) -> &[String] {
        self.header.columns()
    }

    /// Returns a reference to the current write statistics.
    pub fn stats(&self) -> &WriteStats {
        &self.stats
    }

    fn check_writable(&self) -> Result<()> {
        match self.state {
            State::Closed => Err(TabularCsvError::Closed(self.path.clone())),
            State::Failed => Err(TabularCsvError::Unusable(self.path.clone())),
            State::Unopened | State::Streaming(_) => Ok(()),
        }
    }

    /// Creates (or truncates) the file and writes the current header row.
    fn open_with_header(&mut self) -> std::result::Result<Writer<File>, csv::Error> {
        let mut writer = Writer::from_path(&self.path)?;
        self.stats.file_opens += 1;
        writer.write_record(self.header.columns())?;
        debug!(
            "Opened CSV output {} with {} column(s)",
            self.path.display(),
            self.header.len()
        );
        Ok(writer)
    }

    fn write_row(&mut self, fields: &[(String, String)]) -> Result<()> {
        let values: HashMap<&str, &str> = fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let row = self.header.arrange(|column| values.get(column).copied());

        let State::Streaming(writer) = &mut self.state else {
            return Err(TabularCsvError::Unusable(self.path.clone()));
        };
        writer.write_record(&row)?;
        if self.flush_every_record {
            writer.flush()?;
        }
        self.stats.rows_written += 1;
        Ok(())
    }

    /// Rewrites the file under the union of the current header and `keys`.
    ///
    /// The output stays in the failed state unless the rewrite completes.
    fn migrate(&mut self, keys: &[&str]) -> Result<()> {
        let previous = std::mem::replace(&mut self.state, State::Failed);

        match self.rewrite(previous, keys) {
            Ok(writer) => {
                self.state = State::Streaming(writer);
                self.warn(&format!(
                    "Inefficient CSV header rewrite occurred for {}. \
                     Log the same set of keys on every step to avoid rewriting the file.",
                    self.path.display()
                ));
                Ok(())
            }
            Err(source) => {
                error!(
                    "Header migration of {} failed: {}",
                    self.path.display(),
                    source
                );
                Err(TabularCsvError::HeaderMigration {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    fn rewrite(
        &mut self,
        previous: State,
        keys: &[&str],
    ) -> std::result::Result<Writer<File>, MigrationError> {
        if let State::Streaming(writer) = previous {
            writer.into_inner().map_err(|e| e.into_error())?;
        }

        let rows = self.read_rows()?;
        let widened = self.header.union(keys.iter().copied());

        let mut writer = Writer::from_path(&self.path)?;
        self.stats.file_opens += 1;
        writer.write_record(widened.columns())?;
        for row in &rows {
            writer.write_record(widened.arrange(|column| row.get(column).map(String::as_str)))?;
        }
        writer.flush()?;

        info!(
            "Rewrote {} with {} column(s) (was {}), {} row(s) backfilled",
            self.path.display(),
            widened.len(),
            self.header.len(),
            rows.len()
        );
        self.header = widened;
        self.stats.migrations += 1;
        self.stats.rows_rewritten += rows.len() as u64;
        Ok(writer)
    }

    /// Reads every row written so far, keyed by the columns this output wrote.
    ///
    /// Cells are matched to columns by position. The header parsed from disk is
    /// only checked for width, since the csv reader may alter its first field
    /// (a leading byte order mark is stripped).
    fn read_rows(&mut self) -> std::result::Result<Vec<StoredRow>, MigrationError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;
        self.stats.file_opens += 1;

        let found = reader.headers()?.len();
        if found != self.header.len() {
            return Err(MigrationError::HeaderMismatch {
                expected: self.header.len(),
                found,
            });
        }

        let columns = self.header.columns();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(
                columns
                    .iter()
                    .cloned()
                    .zip(record.iter().map(String::from))
                    .collect(),
            );
        }
        Ok(rows)
    }
}

impl LogOutput for CsvOutput {
    fn types_accepted(&self) -> &'static [EntryKind] {
        CsvOutput::types_accepted(self)
    }

    fn record(&mut self, entry: &mut LogEntry) -> Result<()> {
        CsvOutput::record(self, entry)
    }

    fn dump(&mut self) -> Result<()> {
        CsvOutput::dump(self)
    }

    fn close(&mut self) -> Result<()> {
        CsvOutput::close(self)
    }
}
