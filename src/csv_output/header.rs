use std::collections::HashSet;

/// The columns of a CSV file.
///
/// Matching is done on the *set* of column names, so a record listing the
/// same keys in a different order matches. Writing uses the ordered sequence,
/// which is fixed once a column has been written: new columns are only ever
/// appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
    names: HashSet<String>,
}

impl Header {
    /// An empty header with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a header from `columns` in order. Repeated names are dropped.
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Self {
        let mut header = Self::new();
        header.extend(columns);
        header
    }

    /// Columns in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true before any column has been added.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if `column` is part of the header.
    pub fn contains(&self, column: &str) -> bool {
        self.names.contains(column)
    }

    /// Returns true if `keys`, taken as a set, is exactly this header's set.
    pub fn matches<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> bool {
        let keys: HashSet<&str> = keys.into_iter().collect();
        keys.len() == self.names.len() && keys.iter().all(|k| self.names.contains(*k))
    }

    /// Appends the columns of `keys` not already present, in the order given.
    ///
    /// Returns the newly added columns.
    pub fn extend<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut added = Vec::new();
        for key in keys {
            if self.names.insert(key.to_string()) {
                self.columns.push(key.to_string());
                added.push(key.to_string());
            }
        }
        added
    }

    /// The union of this header and `keys`, leaving `self` untouched.
    pub fn union<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut header = self.clone();
        header.extend(keys);
        header
    }

    /// Lays out one row in column order, with an empty cell for every column
    /// `lookup` has no value for.
    pub fn arrange<'a>(&self, lookup: impl Fn(&str) -> Option<&'a str>) -> Vec<&'a str> {
        self.columns
            .iter()
            .map(|column| lookup(column).unwrap_or(""))
            .collect()
    }
}
