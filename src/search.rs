use std::fmt;

use tracing::trace;

use crate::domain::DashError;
use crate::table::Table;

/// A non-empty, lowercased search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// `None` means no search is active.
    pub fn parse(input: &str) -> Option<Self> {
        let term = input.trim().to_lowercase();
        if term.is_empty() {
            None
        } else {
            Some(SearchQuery(term))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Columns a query is matched against.
#[derive(Debug, Clone, Copy)]
pub struct SearchColumns<'a> {
    pub barcode: &'a str,
    pub description: &'a str,
}

/// Rows whose barcode or description contains the query, ignoring case.
/// Missing columns and missing cells count as empty text.
pub fn search(
    table: &Table,
    query: &SearchQuery,
    columns: SearchColumns<'_>,
) -> Result<Table, DashError> {
    if table.is_empty() {
        return Ok(Table::empty());
    }
    let height = table.height();
    let barcodes = table.text_column(columns.barcode);
    let descriptions = table.text_column(columns.description);

    let contains = |values: &Option<Vec<Option<String>>>, idx: usize| {
        values
            .as_ref()
            .and_then(|v| v[idx].as_deref())
            .is_some_and(|s| s.to_lowercase().contains(query.as_str()))
    };
    let mask: Vec<bool> = (0..height)
        .map(|idx| contains(&barcodes, idx) || contains(&descriptions, idx))
        .collect();

    let result = table.select_rows(&mask)?;
    trace!("Search found {} of {height} rows", result.height());
    Ok(result)
}
