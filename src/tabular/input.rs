use std::collections::HashSet;

use super::value::Value;

/// A table of key/value pairs collected for one logging step.
///
/// Keys keep the order in which they were first recorded, which becomes the
/// column order when the table starts a new CSV file. Outputs call
/// [`TabularInput::mark`] for every key they consumed so that callers can find
/// values no output picked up.
///
/// # Example
///
/// ```
/// use tabular_csv::tabular::TabularInput;
///
/// let mut table = TabularInput::new();
/// table.push_prefix("train/");
/// table.record("loss", 0.25);
/// table.pop_prefix();
/// table.record("epoch", 3);
///
/// let cells = table.as_primitive_dict();
/// assert_eq!(cells[0], ("train/loss".to_string(), "0.25".to_string()));
/// assert_eq!(cells[1], ("epoch".to_string(), "3".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularInput {
    entries: Vec<(String, Value)>,
    prefixes: Vec<String>,
    marked: HashSet<String>,
}

impl TabularInput {
    /// Creates an empty table with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` under the current prefix followed by `key`.
    ///
    /// Recording an existing key replaces its value in place and clears its mark.
    pub fn record(&mut self, key: impl AsRef<str>, value: impl Into<Value>) {
        let full_key = format!("{}{}", self.prefix(), key.as_ref());
        let value = value.into();
        self.marked.remove(&full_key);
        match self.entries.iter_mut().find(|(k, _)| *k == full_key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((full_key, value)),
        }
    }

    /// Pushes a prefix applied to every key recorded until it is popped.
    pub fn push_prefix(&mut self, prefix: impl Into<String>) {
        self.prefixes.push(prefix.into());
    }

    /// Pops the most recent prefix. No-op when none is active.
    pub fn pop_prefix(&mut self) {
        self.prefixes.pop();
    }

    /// The concatenation of all active prefixes.
    pub fn prefix(&self) -> String {
        self.prefixes.concat()
    }

    /// Marks `key` as consumed by an output. Unknown keys are ignored.
    pub fn mark(&mut self, key: &str) {
        if self.entries.iter().any(|(k, _)| k == key) {
            self.marked.insert(key.to_string());
        }
    }

    /// Marks every recorded key.
    pub fn mark_all(&mut self) {
        self.marked = self.entries.iter().map(|(k, _)| k.clone()).collect();
    }

    pub fn is_marked(&self, key: &str) -> bool {
        self.marked.contains(key)
    }

    /// Keys no output has consumed yet, in record order.
    pub fn unmarked_keys(&self) -> Vec<&str> {
        self.keys().filter(|k| !self.marked.contains(*k)).collect()
    }

    /// The primitive values as `(key, cell)` pairs, in record order.
    ///
    /// Structured values are skipped.
    pub fn as_primitive_dict(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.to_cell().map(|cell| (k.clone(), cell)))
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all values and marks. Active prefixes are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.marked.clear();
    }
}
