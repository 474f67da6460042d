use crate::domain::DEFAULT_BROWSE_COST_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Browse,
    Search,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityContext {
    pub mode: ViewMode,
    /// Rows of the table about to be displayed.
    pub row_count: usize,
}

/// Decides whether the cost column is part of a view.
///
/// - Browse: only for a narrow listing, `0 < rows < browse_threshold`.
/// - Search: always, a match on barcode or description is a deliberate lookup.
/// - Detail: always.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityPolicy {
    pub browse_threshold: usize,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            browse_threshold: DEFAULT_BROWSE_COST_THRESHOLD,
        }
    }
}

impl VisibilityPolicy {
    pub fn new(browse_threshold: usize) -> Self {
        Self { browse_threshold }
    }

    pub fn should_show_sensitive(&self, context: VisibilityContext) -> bool {
        match context.mode {
            ViewMode::Browse => context.row_count > 0 && context.row_count < self.browse_threshold,
            ViewMode::Search | ViewMode::Detail => true,
        }
    }
}
