//! Plain text rendering of dashboard views for the non-interactive commands.

use comfy_table::{ContentArrangement, Table as TextTable, presets::UTF8_FULL};

use crate::dashboard::{Dashboard, Section};
use crate::dataset::DatasetKind;
use crate::domain::{DashError, MISSING_VALUE};
use crate::filter::CategorySelection;
use crate::search::SearchQuery;

fn render_table(section: &Section) -> String {
    let mut out = TextTable::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(section.table.column_names());
    let columns = section.table.text_columns();
    for position in 0..section.table.height() {
        out.add_row(columns.iter().map(|values| {
            values
                .get(position)
                .cloned()
                .flatten()
                .unwrap_or_else(|| MISSING_VALUE.to_string())
        }));
    }
    out.to_string()
}

fn searched_in(kinds: &[DatasetKind]) -> String {
    match kinds {
        [kind] => kind.title().to_string(),
        _ => "either dataset".to_string(),
    }
}

/// Browse view of the given datasets, or search results of both when a query is given.
pub fn render(
    dashboard: &Dashboard,
    query: Option<&SearchQuery>,
    category: &CategorySelection,
    kinds: &[DatasetKind],
) -> Result<String, DashError> {
    let mut out = Vec::new();
    match query {
        Some(query) => {
            out.push(format!("Search Results for: '{query}'"));
            for &kind in kinds {
                let dataset = dashboard.dataset(kind);
                if dataset.load_error.is_some() {
                    out.push(format!(
                        "{}: could not display data from {}.",
                        kind.title(),
                        dataset.source
                    ));
                }
            }
            let found: Vec<Section> = dashboard
                .search(query)?
                .into_iter()
                .filter(|s| kinds.contains(&s.kind) && !s.table.is_empty())
                .collect();
            if found.is_empty() {
                out.push(format!(
                    "No matching items found for '{query}' in {}.",
                    searched_in(kinds)
                ));
            }
            for section in found {
                out.push(String::new());
                out.push(section.kind.found_in().to_string());
                out.push(render_table(&section));
            }
        }
        None => {
            for &kind in kinds {
                let dataset = dashboard.dataset(kind);
                let section = dashboard.browse(kind, category)?;
                if !out.is_empty() {
                    out.push(String::new());
                }
                out.push(format!("{} ({})", kind.heading(), kind.title()));
                out.push(format!("Last Updated: {}", dataset.updated));
                if !section.filter_available && !dataset.table.is_empty() {
                    out.push("Category filter unavailable".to_string());
                }
                if dataset.load_error.is_some() {
                    out.push(format!("Could not display data from {}.", dataset.source));
                } else if section.table.is_empty() {
                    out.push(format!("No items in category {category}."));
                } else {
                    out.push(render_table(&section));
                }
            }
        }
    }
    Ok(out.join("\n"))
}

pub fn render_categories(dashboard: &Dashboard) -> String {
    match dashboard.categories() {
        Some(choices) => choices
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        None => "Category filter unavailable".to_string(),
    }
}
