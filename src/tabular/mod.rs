//! Tabular record types
//!
//! The values a logging dispatcher hands to its outputs. [`LogEntry`] is the
//! closed set of entry kinds; outputs declare which kinds they accept and
//! reject the rest.

pub mod input;
pub mod value;

use std::fmt;

pub use input::TabularInput;
pub use value::Value;

/// The kinds of entry a dispatcher can forward to an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A [`TabularInput`] table.
    Tabular,
    /// A free-form text message.
    Text,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Tabular => write!(f, "tabular"),
            EntryKind::Text => write!(f, "text"),
        }
    }
}

/// One entry forwarded to a log output.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Tabular(TabularInput),
    Text(String),
}

impl LogEntry {
    /// The kind of this entry, as matched against `types_accepted`.
    pub fn kind(&self) -> EntryKind {
        match self {
            LogEntry::Tabular(_) => EntryKind::Tabular,
            LogEntry::Text(_) => EntryKind::Text,
        }
    }
}

impl From<TabularInput> for LogEntry {
    fn from(table: TabularInput) -> Self {
        LogEntry::Tabular(table)
    }
}

impl From<&str> for LogEntry {
    fn from(text: &str) -> Self {
        LogEntry::Text(text.to_string())
    }
}

impl From<String> for LogEntry {
    fn from(text: String) -> Self {
        LogEntry::Text(text)
    }
}
