use std::sync::Arc;

use polars::prelude::*;
use rayon::prelude::*;

use crate::domain::{DashError, MISSING_VALUE};

/// Identity of a row, assigned by the loader as its position in the loaded table.
pub type RowId = usize;

/// An ordered set of rows from one dataset.
///
/// The frame holds the cell data, `rows` holds the loader assigned id of each
/// frame row, so that filtered or searched tables can still point back to the
/// full table they were derived from.
#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
    rows: Arc<Vec<RowId>>,
}

/// Rendered, stringified column ready for the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

impl Default for Table {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.column_names() == other.column_names()
            && self.frame.equals_missing(&other.frame)
    }
}

impl Table {
    pub fn empty() -> Self {
        Table {
            frame: DataFrame::empty(),
            rows: Arc::new(Vec::new()),
        }
    }

    /// Wraps a freshly loaded frame, numbering its rows from zero.
    pub fn from_frame(frame: DataFrame) -> Self {
        let rows = Arc::new((0..frame.height()).collect());
        Table { frame, rows }
    }

    /// Replaces the frame while keeping the row ids. Only valid for column
    /// operations that leave the rows untouched.
    pub(crate) fn with_frame(&self, frame: DataFrame) -> Self {
        debug_assert_eq!(frame.height(), self.rows.len());
        Table {
            frame,
            rows: Arc::clone(&self.rows),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.rows
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    /// Cell values of a column as text. Missing cells are `None`, a missing
    /// column is `None` as a whole.
    pub fn text_column(&self, name: &str) -> Option<Vec<Option<String>>> {
        let column = self.frame.column(name).ok()?;
        let casted = column.cast(&DataType::String).ok()?;
        let values = casted.str().ok()?;
        Some(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    /// Keeps the rows whose mask entry is true, in their original order.
    pub fn select_rows(&self, mask: &[bool]) -> Result<Table, DashError> {
        if mask.len() != self.height() {
            return Err(DashError::LoadingFailed(format!(
                "row mask has {} entries for {} rows",
                mask.len(),
                self.height()
            )));
        }
        if self.frame.width() == 0 {
            return Ok(Table::empty());
        }
        let predicate = BooleanChunked::from_slice(PlSmallStr::EMPTY, mask);
        let frame = self.frame.filter(&predicate)?;
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter_map(|(&id, &keep)| keep.then_some(id))
            .collect();
        Ok(Table {
            frame,
            rows: Arc::new(rows),
        })
    }

    /// Single row table for the row with the given id, if present.
    pub fn row(&self, id: RowId) -> Result<Option<Table>, DashError> {
        let Some(position) = self.rows.iter().position(|&r| r == id) else {
            return Ok(None);
        };
        let mask: Vec<bool> = (0..self.height()).map(|idx| idx == position).collect();
        self.select_rows(&mask).map(Some)
    }

    /// Stringifies every column for rendering. Each column is converted in its
    /// own rayon task.
    pub fn to_column_views(&self, max_column_width: usize) -> Vec<ColumnView> {
        let names = self.column_names();
        names
            .par_iter()
            .map(|name| {
                let data: Vec<String> = self
                    .text_column(name)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|value| match value {
                        Some(s) => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
                        None => MISSING_VALUE.to_string(),
                    })
                    .collect();
                let max_width = data.iter().map(|s| s.chars().count()).max().unwrap_or(0);
                let width = std::cmp::max(name.chars().count(), max_width);
                ColumnView {
                    name: name.clone(),
                    width: std::cmp::min(width, max_column_width),
                    data,
                }
            })
            .collect()
    }

    /// Cells of the row at `position` as text, in column order.
    pub fn row_values(&self, position: usize) -> Vec<Option<String>> {
        if position >= self.height() {
            return vec![None; self.frame.width()];
        }
        let row = Table {
            frame: self.frame.slice(position as i64, 1),
            rows: Arc::new(vec![self.rows[position]]),
        };
        row.column_names()
            .iter()
            .map(|name| {
                row.text_column(name)
                    .and_then(|values| values.into_iter().next().flatten())
            })
            .collect()
    }

    /// Every column as text, converted once, in column order.
    pub fn text_columns(&self) -> Vec<Vec<Option<String>>> {
        self.column_names()
            .iter()
            .map(|name| self.text_column(name).unwrap_or_default())
            .collect()
    }
}
