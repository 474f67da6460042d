use std::collections::BTreeSet;
use std::fmt;

use tracing::trace;

use crate::domain::{ALL_CATEGORIES, DashError};
use crate::table::Table;

/// A choice of the category selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategorySelection {
    All,
    Only(String),
}

impl CategorySelection {
    /// Reads a selector label, mapping the sentinel to `All`.
    pub fn parse(label: &str) -> Self {
        if label == ALL_CATEGORIES {
            CategorySelection::All
        } else {
            CategorySelection::Only(label.to_string())
        }
    }
}

impl fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategorySelection::All => write!(f, "{ALL_CATEGORIES}"),
            CategorySelection::Only(category) => write!(f, "{category}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filtered {
    pub table: Table,
    /// False when the table has no category column to filter on.
    pub available: bool,
}

pub fn filter_by_category(
    table: &Table,
    column: &str,
    selected: &CategorySelection,
) -> Result<Filtered, DashError> {
    let Some(values) = table.text_column(column) else {
        trace!("No column {column}, category filter unavailable");
        return Ok(Filtered {
            table: table.clone(),
            available: false,
        });
    };
    let table = match selected {
        CategorySelection::All => table.clone(),
        CategorySelection::Only(category) => {
            let mask: Vec<bool> = values
                .iter()
                .map(|v| v.as_deref().is_some_and(|s| s.trim() == category))
                .collect();
            table.select_rows(&mask)?
        }
    };
    Ok(Filtered {
        table,
        available: true,
    })
}

/// Selector choices over all given tables: `All` followed by the sorted,
/// distinct, trimmed, non-blank values of `column`. `None` when no table has the column.
pub fn category_choices<'a>(
    tables: impl IntoIterator<Item = &'a Table>,
    column: &str,
) -> Option<Vec<CategorySelection>> {
    let mut found = false;
    let mut categories = BTreeSet::new();
    for table in tables {
        if let Some(values) = table.text_column(column) {
            found = true;
            categories.extend(
                values
                    .into_iter()
                    .flatten()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
            );
        }
    }
    if !found {
        return None;
    }
    let mut choices = vec![CategorySelection::All];
    choices.extend(categories.into_iter().map(CategorySelection::Only));
    Some(choices)
}
