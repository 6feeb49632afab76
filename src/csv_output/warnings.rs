use std::collections::HashSet;

use tracing::warn;

/// Category attached to every warning event, for subscribers that filter on it.
pub const WARNING_CATEGORY: &str = "CsvOutputWarning";

/// Emits each distinct warning message once.
///
/// Warnings are `tracing` events on the `tabular_csv::warning` target with a
/// `category` field of [`WARNING_CATEGORY`]. Every message passed to
/// [`WarningLog::warn`] is remembered, including those suppressed because the
/// log was disabled.
#[derive(Debug, Default)]
pub struct WarningLog {
    warned: HashSet<String>,
    disabled: bool,
    emitted: u64,
}

impl WarningLog {
    /// An enabled log that has warned about nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `msg` unless it was seen before or the log is disabled.
    ///
    /// Returns true if the warning was emitted.
    pub fn warn(&mut self, msg: &str) -> bool {
        let first = self.warned.insert(msg.to_string());
        if !first || self.disabled {
            return false;
        }
        warn!(target: "tabular_csv::warning", category = WARNING_CATEGORY, "{}", msg);
        self.emitted += 1;
        true
    }

    /// Suppresses all further warnings. There is no way back.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    /// Returns true once warnings have been disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns true if `msg` has been seen, whether or not it was emitted.
    pub fn has_warned(&self, msg: &str) -> bool {
        self.warned.contains(msg)
    }

    /// Number of warnings actually emitted.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}
