//! Table, Row, and Cell data structures

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::schema::{columns_from_names, Column};

/// A cell value with type information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            // Cross-type numeric comparison; only exactly representable floats match
            (CellValue::Int(a), CellValue::Float(b)) => integral_value(*b) == Some(*a),
            (CellValue::Float(a), CellValue::Int(b)) => integral_value(*a) == Some(*b),
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Integral floats hash like the equal Int so row tuples can key a set.
        match self {
            CellValue::Null => 0u8.hash(state),
            CellValue::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            CellValue::Int(i) => {
                2u8.hash(state);
                i.hash(state);
            }
            CellValue::Float(f) => match integral_value(*f) {
                Some(i) => {
                    2u8.hash(state);
                    i.hash(state);
                }
                None => {
                    3u8.hash(state);
                    if f.is_nan() {
                        f64::NAN.to_bits().hash(state);
                    } else {
                        f.to_bits().hash(state);
                    }
                }
            },
            CellValue::String(s) => {
                4u8.hash(state);
                s.hash(state);
            }
            CellValue::Date(d) => {
                5u8.hash(state);
                d.hash(state);
            }
            CellValue::DateTime(dt) => {
                6u8.hash(state);
                dt.hash(state);
            }
        }
    }
}

fn integral_value(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        let i = f as i64;
        // Values past 2^53 may not round-trip; only fold exact ones.
        if i as f64 == f {
            return Some(i);
        }
    }
    None
}

impl CellValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("NULL"),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(f.to_string()),
            CellValue::String(s) => Cow::Borrowed(s.as_ref()),
            CellValue::Date(d) => Cow::Owned(d.to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.to_string()),
        }
    }

    /// String form used when building synthetic keys; null is empty
    pub fn key_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(""),
            other => other.display(),
        }
    }

    /// Strip leading/trailing whitespace from text; other values pass through
    pub fn normalized(self) -> Self {
        match self {
            CellValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.len() == s.len() {
                    CellValue::String(s)
                } else {
                    CellValue::String(Cow::Owned(trimmed.to_string()))
                }
            }
            other => other,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(Cow::Owned(s.to_string()))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(Cow::Owned(s))
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Cell values in column order
    pub cells: Vec<CellValue>,
    /// Original line/row number in source file (1-indexed)
    pub source_line: usize,
}

impl Row {
    pub fn new(cells: Vec<CellValue>, source_line: usize) -> Self {
        Self { cells, source_line }
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A named table containing columns and rows
#[derive(Debug, Clone)]
pub struct Table {
    /// Display name used in reports and error messages
    pub name: String,
    /// Column definitions
    pub columns: Vec<Column>,
    /// All rows in the table
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table with column definitions
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from header names and row values.
    ///
    /// Rows are numbered as if read from a file with a header on line 1.
    pub fn from_rows<I, S>(name: impl Into<String>, headers: I, rows: Vec<Vec<CellValue>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(name, columns_from_names(headers));
        for (i, cells) in rows.into_iter().enumerate() {
            table.add_row(cells, i + 2);
        }
        table
    }

    /// Add a row, padding short rows with nulls
    pub fn add_row(&mut self, mut cells: Vec<CellValue>, source_line: usize) {
        if cells.len() < self.columns.len() {
            cells.resize(self.columns.len(), CellValue::Null);
        }
        self.rows.push(Row::new(cells, source_line));
    }

    /// Trim whitespace from every text cell
    pub fn normalize(&mut self) {
        for row in &mut self.rows {
            let cells = std::mem::take(&mut row.cells);
            row.cells = cells.into_iter().map(CellValue::normalized).collect();
        }
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_integral_float_matches_int() {
        assert_eq!(CellValue::Int(3), CellValue::Float(3.0));

        let mut set = FxHashSet::default();
        set.insert(vec![CellValue::Int(3), CellValue::from("a")]);
        assert!(set.contains(&vec![CellValue::Float(3.0), CellValue::from("a")]));
        assert!(!set.contains(&vec![CellValue::Float(3.5), CellValue::from("a")]));
    }

    #[test]
    fn test_large_int_only_matches_exact_float() {
        let exact = 9_007_199_254_740_992i64; // 2^53
        assert_eq!(CellValue::Int(exact), CellValue::Float(exact as f64));
        assert_ne!(CellValue::Int(exact + 1), CellValue::Float(exact as f64));
        assert_ne!(CellValue::Float(exact as f64), CellValue::Int(exact + 1));

        let mut set = FxHashSet::default();
        set.insert(CellValue::Int(exact + 1));
        assert!(!set.contains(&CellValue::Float(exact as f64)));
        assert!(set.contains(&CellValue::Int(exact + 1)));
    }

    #[test]
    fn test_normalized_trims_text_only() {
        assert_eq!(CellValue::from("  foo \t").normalized(), CellValue::from("foo"));
        assert_eq!(CellValue::Int(7).normalized(), CellValue::Int(7));
        assert_eq!(CellValue::Null.normalized(), CellValue::Null);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = Table::from_rows("t", ["a", "b", "c"], vec![vec![CellValue::Int(1)]]);
        assert_eq!(table.rows[0].cells.len(), 3);
        assert!(table.rows[0].cells[2].is_null());
        assert_eq!(table.rows[0].source_line, 2);
    }

    #[test]
    fn test_key_text() {
        assert_eq!(CellValue::Null.key_text(), "");
        assert_eq!(CellValue::Float(2.0).key_text(), "2");
        assert_eq!(CellValue::from("x").key_text(), "x");
    }
}
