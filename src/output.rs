//! Log output interface
//!
//! The seam between a logging dispatcher and the places entries end up.
//! A dispatcher checks [`LogOutput::types_accepted`] before forwarding an
//! entry; outputs still reject anything else passed to [`LogOutput::record`].

use crate::error::Result;
use crate::tabular::{EntryKind, LogEntry};

/// A destination for log entries.
///
/// Implementations are not required to be thread-safe: `record` takes
/// `&mut self`, and callers sharing an output across threads wrap it in
/// their own lock.
pub trait LogOutput {
    /// The entry kinds this output can record.
    fn types_accepted(&self) -> &'static [EntryKind];

    /// Records one entry.
    ///
    /// Outputs may mark the keys of a tabular entry they consumed, hence the
    /// mutable borrow.
    fn record(&mut self, entry: &mut LogEntry) -> Result<()>;

    /// Flushes buffered output.
    fn dump(&mut self) -> Result<()>;

    /// Flushes and releases the output's resources.
    fn close(&mut self) -> Result<()>;

    /// Returns true if this output accepts entries of `kind`.
    fn accepts(&self, kind: EntryKind) -> bool {
        self.types_accepted().contains(&kind)
    }
}
