use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::dataset::{Dataset, DatasetKind, RowSelection};
use crate::domain::DashError;
use crate::filter::{CategorySelection, category_choices, filter_by_category};
use crate::loader::{Loader, Source};
use crate::projector::{ProjectOptions, project};
use crate::search::{SearchColumns, SearchQuery, search};
use crate::table::Table;
use crate::visibility::{ViewMode, VisibilityContext, VisibilityPolicy};

/// A projected table ready to be shown for one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub kind: DatasetKind,
    pub table: Table,
    pub show_sensitive: bool,
    pub filter_available: bool,
}

/// Both datasets, the loader that fills them and the policy used to show them.
pub struct Dashboard {
    config: DashboardConfig,
    loader: Loader,
    policy: VisibilityPolicy,
    stock: Dataset,
    new_arrival: Dataset,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        let stock = Dataset::new(
            DatasetKind::Stock,
            Source::Path(config.stock.expanded_path()),
            config.stock.date.clone(),
        );
        let new_arrival = Dataset::new(
            DatasetKind::NewArrival,
            Source::Path(config.new_arrival.expanded_path()),
            config.new_arrival.date.clone(),
        );
        Self {
            loader: Loader::new(config.columns.cost.clone()),
            policy: VisibilityPolicy::new(config.browse_cost_threshold),
            config,
            stock,
            new_arrival,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn dataset(&self, kind: DatasetKind) -> &Dataset {
        match kind {
            DatasetKind::Stock => &self.stock,
            DatasetKind::NewArrival => &self.new_arrival,
        }
    }

    fn dataset_mut(&mut self, kind: DatasetKind) -> &mut Dataset {
        match kind {
            DatasetKind::Stock => &mut self.stock,
            DatasetKind::NewArrival => &mut self.new_arrival,
        }
    }

    /// Loads one dataset from its source. Returns the error message if the
    /// dataset could not be loaded.
    pub fn load(&mut self, kind: DatasetKind) -> Option<String> {
        let source = self.dataset(kind).source.clone();
        let loaded = self.loader.load(&source);
        let error = loaded
            .error
            .map(|e| format!("Could not load {} ({source}): {e}", kind.title()));
        let dataset = self.dataset_mut(kind);
        dataset.table = loaded.table;
        dataset.load_error = error.clone();
        debug!("{kind}: {} rows (cached: {})", dataset.table.height(), loaded.cached);
        error
    }

    pub fn load_all(&mut self) -> Vec<String> {
        DatasetKind::ALL
            .iter()
            .filter_map(|&kind| self.load(kind))
            .collect()
    }

    /// Drops all cached tables and reads both sources again.
    pub fn reload(&mut self) -> Vec<String> {
        info!(
            "Reloading datasets, dropping {} cached tables",
            self.loader.cached_entries()
        );
        self.loader.clear();
        self.load_all()
    }

    /// Points a dataset at a new source and loads it.
    pub fn open(&mut self, kind: DatasetKind, source: Source) -> Option<String> {
        info!("Opening {source} as {kind}");
        let previous = std::mem::replace(&mut self.dataset_mut(kind).source, source);
        if self.loader.invalidate(&previous) {
            debug!("Dropped cached table of {previous}");
        }
        self.load(kind)
    }

    pub fn categories(&self) -> Option<Vec<CategorySelection>> {
        category_choices(
            DatasetKind::ALL.iter().map(|&k| &self.dataset(k).table),
            &self.config.columns.category,
        )
    }

    fn project_options(&self, show_sensitive: bool) -> ProjectOptions {
        ProjectOptions {
            category_column: self.config.columns.category.clone(),
            sensitive_column: self.config.columns.cost.clone(),
            show_sensitive,
            sensitive_label: self.config.cost_label.clone(),
        }
    }

    fn section(
        &self,
        kind: DatasetKind,
        mode: ViewMode,
        table: &Table,
        filter_available: bool,
    ) -> Result<Section, DashError> {
        let show_sensitive = self.policy.should_show_sensitive(VisibilityContext {
            mode,
            row_count: table.height(),
        });
        Ok(Section {
            kind,
            table: project(table, &self.project_options(show_sensitive))?,
            show_sensitive,
            filter_available,
        })
    }

    /// Browse view of one dataset under a category selection.
    pub fn browse(
        &self,
        kind: DatasetKind,
        selection: &CategorySelection,
    ) -> Result<Section, DashError> {
        let dataset = self.dataset(kind);
        let filtered = filter_by_category(&dataset.table, &self.config.columns.category, selection)?;
        if !filtered.available && !dataset.table.is_empty() {
            warn!("{kind} has no {} column, showing all rows", self.config.columns.category);
        }
        self.section(kind, ViewMode::Browse, &filtered.table, filtered.available)
    }

    /// Search results of both datasets, unfiltered by category.
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Section>, DashError> {
        let columns = SearchColumns {
            barcode: &self.config.columns.barcode,
            description: &self.config.columns.description,
        };
        DatasetKind::ALL
            .iter()
            .map(|&kind| {
                let table = &self.dataset(kind).table;
                let found = search(table, query, columns)?;
                let available = table.has_column(&self.config.columns.category);
                self.section(kind, ViewMode::Search, &found, available)
            })
            .collect()
    }

    /// Single row view of the selected row, `None` without a selection or if
    /// the row no longer exists.
    pub fn detail(&self, selection: RowSelection) -> Result<Option<Section>, DashError> {
        let RowSelection::Row { dataset, row } = selection else {
            return Ok(None);
        };
        let table = &self.dataset(dataset).table;
        let Some(single) = table.row(row)? else {
            debug!("Row {row} not found in {dataset}");
            return Ok(None);
        };
        let available = table.has_column(&self.config.columns.category);
        self.section(dataset, ViewMode::Detail, &single, available)
            .map(Some)
    }
}
