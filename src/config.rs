use std::fs;
use std::path::{Path, PathBuf};

use derive_setters::Setters;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{
    COST_COLUMN, DEFAULT_BROWSE_COST_THRESHOLD, DEFAULT_EVENT_POLL_TIME, DEFAULT_MAX_COLUMN_WIDTH,
    DashError,
};

/// Where a dataset is read from and the date stamp shown next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Setters)]
#[setters(prefix = "with_", into)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub date: String,
}

impl DatasetConfig {
    /// The configured path with `~` and environment variables expanded.
    pub fn expanded_path(&self) -> PathBuf {
        let raw = self.path.to_string_lossy();
        match shellexpand::full(&raw) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(e) => {
                warn!("Could not expand path {raw}: {e}");
                self.path.clone()
            }
        }
    }
}

/// Names of the columns the pipeline looks at.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub category: String,
    pub barcode: String,
    pub description: String,
    /// Matched case-insensitively while loading.
    pub cost: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            category: "Category".to_string(),
            barcode: "itembarcode".to_string(),
            description: "description".to_string(),
            cost: COST_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Setters)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct DashboardConfig {
    pub stock: DatasetConfig,
    pub new_arrival: DatasetConfig,
    pub columns: ColumnNames,
    /// Header shown for the cost column when it is visible.
    pub cost_label: Option<String>,
    pub browse_cost_threshold: usize,
    pub max_column_width: usize,
    pub event_poll_time: u64,
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            stock: DatasetConfig {
                path: PathBuf::from("stock ware.xlsx"),
                date: "2025-10-29".to_string(),
            },
            new_arrival: DatasetConfig {
                path: PathBuf::from("NEW ARRAIVAL-27-OCT-25 (1).xlsx"),
                date: "2025-10-29".to_string(),
            },
            columns: ColumnNames::default(),
            cost_label: Some("Cost".to_string()),
            browse_cost_threshold: DEFAULT_BROWSE_COST_THRESHOLD,
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            event_poll_time: DEFAULT_EVENT_POLL_TIME,
            log_file: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_json(text: &str) -> Result<Self, DashError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, DashError> {
        debug!("Reading configuration from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DashError::FileNotFound(path.to_path_buf()),
            _ => DashError::IoError(e),
        })?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_files() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.stock.path, PathBuf::from("stock ware.xlsx"));
        assert_eq!(cfg.new_arrival.date, "2025-10-29");
        assert_eq!(cfg.columns.category, "Category");
        assert_eq!(cfg.browse_cost_threshold, DEFAULT_BROWSE_COST_THRESHOLD);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = DashboardConfig::from_json(
            r#"{
                "stock": { "path": "/data/stock.xlsx", "date": "2025-11-01" },
                "columns": { "barcode": "Barcode" },
                "browse_cost_threshold": 2
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.stock.path, PathBuf::from("/data/stock.xlsx"));
        assert_eq!(cfg.stock.date, "2025-11-01");
        assert_eq!(cfg.columns.barcode, "Barcode");
        assert_eq!(cfg.columns.description, "description");
        assert_eq!(cfg.browse_cost_threshold, 2);
        assert_eq!(cfg.new_arrival, DashboardConfig::default().new_arrival);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = DashboardConfig::from_json("{ stock: ").unwrap_err();
        assert!(matches!(err, DashError::ConfigError(_)));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = DashboardConfig::from_file(Path::new("/nonexistent/stockview.json")).unwrap_err();
        assert!(matches!(err, DashError::FileNotFound(_)));
    }

    #[test]
    fn setters_override_fields() {
        let cfg = DashboardConfig::default()
            .with_browse_cost_threshold(7)
            .with_cost_label(None)
            .with_stock(DatasetConfig::default().with_path("a.csv").with_date("today"));
        assert_eq!(cfg.browse_cost_threshold, 7);
        assert_eq!(cfg.cost_label, None);
        assert_eq!(cfg.stock.path, PathBuf::from("a.csv"));
    }

    #[test]
    fn expands_home_in_paths() {
        let ds = DatasetConfig::default().with_path("$HOME/stock.xlsx");
        if let Ok(home) = std::env::var("HOME") {
            assert_eq!(ds.expanded_path(), PathBuf::from(format!("{home}/stock.xlsx")));
        }
    }
}
