//! Row codec between string-valued table rows and typed records

use crate::error::{PersistenceError, Result};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::str::FromStr;

/// A persisted row: column name -> cell text
pub type Row = BTreeMap<String, String>;

/// Cell values that spreadsheet exports use for "no value"
const EMPTY_MARKERS: [&str; 3] = ["", "nan", "none"];

fn is_empty_cell(value: &str) -> bool {
    let trimmed = value.trim();
    EMPTY_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m))
}

/// Read access to one row with errors that name the offending cell
pub struct RowReader<'a> {
    table: &'a str,
    index: usize,
    row: &'a Row,
}

impl<'a> RowReader<'a> {
    pub fn new(table: &'a str, index: usize, row: &'a Row) -> Self {
        Self { table, index, row }
    }

    /// Build a schema error pointing at `column` in this row
    pub fn error(&self, column: &str, message: impl Into<String>) -> PersistenceError {
        PersistenceError::schema(self.table, self.index, column, message)
    }

    /// Cell text for a column that must exist; the value may be empty
    pub fn text(&self, column: &str) -> Result<String> {
        self.row
            .get(column)
            .map(|v| v.trim().to_string())
            .ok_or_else(|| self.error(column, "missing column"))
    }

    /// Cell text for a column that must exist and hold a value
    pub fn required(&self, column: &str) -> Result<String> {
        let value = self.text(column)?;
        if is_empty_cell(&value) {
            return Err(self.error(column, "empty value"));
        }
        Ok(value)
    }

    /// Cell text, or `None` when the column is absent or the cell is blank
    pub fn optional(&self, column: &str) -> Option<String> {
        self.row
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !is_empty_cell(v))
            .map(str::to_string)
    }

    /// Parse a required cell
    pub fn parse<T>(&self, column: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.required(column)?;
        value
            .parse::<T>()
            .map_err(|e| self.error(column, format!("cannot parse '{value}': {e}")))
    }
}

/// A typed entity stored as one row of a table
pub trait TableRecord: Sized {
    /// Decode a row, failing on missing columns or unparseable cells
    fn from_row(row: &RowReader<'_>) -> Result<Self>;

    /// Encode this record as a row with one cell per column
    fn to_row(&self) -> Row;
}

/// A record with a unique key inside its table
pub trait KeyedRecord: TableRecord {
    type Key: Eq + Hash + Clone + Debug;

    fn key(&self) -> Self::Key;

    /// Whether `other` carries the same data as `self`.
    ///
    /// Records with bookkeeping columns (timestamps) override this so that
    /// rewriting identical data is not treated as a change.
    fn same_content(&self, other: &Self) -> bool {
        self.to_row() == other.to_row()
    }
}

/// Decode every row of a table
pub fn decode_rows<R: TableRecord>(table: &str, rows: &[Row]) -> Result<Vec<R>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| R::from_row(&RowReader::new(table, i, row)))
        .collect()
}

/// Encode records into rows
pub fn encode_rows<R: TableRecord>(records: &[R]) -> Vec<Row> {
    records.iter().map(TableRecord::to_row).collect()
}

/// Helper for building rows in `to_row` implementations
pub fn row_from_pairs<I, K, V>(pairs: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
