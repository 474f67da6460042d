use tracing::trace;

use crate::domain::DashError;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOptions {
    pub category_column: String,
    pub sensitive_column: String,
    pub show_sensitive: bool,
    /// Header of the sensitive column when shown. Keeps its name if `None`.
    pub sensitive_label: Option<String>,
}

/// Display copy of a table: without the category column, and with the
/// sensitive column dropped or relabelled.
pub fn project(table: &Table, options: &ProjectOptions) -> Result<Table, DashError> {
    if table.is_empty() {
        return Ok(Table::empty());
    }
    let mut frame = table.frame().clone();
    if table.has_column(&options.category_column) {
        frame = frame.drop(&options.category_column)?;
    }
    let cost_like: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| name.eq_ignore_ascii_case(&options.sensitive_column))
        .collect();
    if !options.show_sensitive {
        // A sheet may carry more than one cost header; none of them may leak.
        for name in &cost_like {
            frame = frame.drop(name)?;
        }
    } else if table.has_column(&options.sensitive_column) {
        for name in cost_like.iter().filter(|n| **n != options.sensitive_column) {
            frame = frame.drop(name)?;
        }
        if let Some(label) = &options.sensitive_label {
            if label != &options.sensitive_column && frame.get_column_index(label).is_none() {
                frame.rename(&options.sensitive_column, label.as_str().into())?;
            }
        }
    }
    trace!(
        "Projected {} columns to {}",
        table.column_names().len(),
        frame.width()
    );
    Ok(table.with_frame(frame))
}
