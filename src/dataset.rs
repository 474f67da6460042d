use std::fmt;

use crate::loader::Source;
use crate::table::{RowId, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Stock,
    NewArrival,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Stock, DatasetKind::NewArrival];

    pub fn key(&self) -> &'static str {
        match self {
            DatasetKind::Stock => "stock",
            DatasetKind::NewArrival => "new_arrival",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "stock" | "warehouse_stock" => Some(DatasetKind::Stock),
            "new_arrival" | "arrival" | "arrivals" => Some(DatasetKind::NewArrival),
            _ => None,
        }
    }

    /// Tab title.
    pub fn title(&self) -> &'static str {
        match self {
            DatasetKind::Stock => "Warehouse Stock",
            DatasetKind::NewArrival => "New Arrival",
        }
    }

    /// Heading shown above the browse view.
    pub fn heading(&self) -> &'static str {
        match self {
            DatasetKind::Stock => "Current Warehouse Inventory",
            DatasetKind::NewArrival => "Incoming Inventory (New Shipments)",
        }
    }

    /// Heading shown above search results.
    pub fn found_in(&self) -> &'static str {
        match self {
            DatasetKind::Stock => "Found in Warehouse Stock",
            DatasetKind::NewArrival => "Found in New Arrivals",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            DatasetKind::Stock => DatasetKind::NewArrival,
            DatasetKind::NewArrival => DatasetKind::Stock,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub source: Source,
    pub table: Table,
    /// Last-updated stamp from the configuration.
    pub updated: String,
    /// Why the table is empty, if loading failed.
    pub load_error: Option<String>,
}

impl Dataset {
    pub fn new(kind: DatasetKind, source: Source, updated: impl Into<String>) -> Self {
        Self {
            kind,
            source,
            table: Table::empty(),
            updated: updated.into(),
            load_error: None,
        }
    }
}

/// Row picked for the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowSelection {
    #[default]
    None,
    Row { dataset: DatasetKind, row: RowId },
}
