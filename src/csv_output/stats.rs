/// Statistics collected while writing a CSV output.
///
/// # Example
///
/// ```
/// use tabular_csv::csv_output::WriteStats;
///
/// let stats = WriteStats::default();
/// assert_eq!(stats.rows_written, 0);
/// assert_eq!(stats.migrations, 0);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteStats {
    /// Rows written from accepted records. Rewrites during a migration are not counted.
    pub rows_written: u64,
    /// Rows copied back into the file by header migrations.
    pub rows_rewritten: u64,
    /// Completed header migrations.
    pub migrations: u64,
    /// Times the file was opened, for reading or writing.
    pub file_opens: u64,
}
