use std::path::PathBuf;

use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

/// Sentinel label of the "no filter" category choice.
pub const ALL_CATEGORIES: &str = "All Categories";

/// Internal name of the sensitive cost column after loading.
pub const COST_COLUMN: &str = "cost";

/// Browse views with fewer rows than this reveal the cost column.
pub const DEFAULT_BROWSE_COST_THRESHOLD: usize = 4;

pub const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;
pub const DEFAULT_EVENT_POLL_TIME: u64 = 100;

// Rendering of missing cells in table views
pub const MISSING_VALUE: &str = "∅";

#[derive(Debug, Error)]
pub enum DashError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),

    #[error("spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("invalid configuration: {0}")]
    ConfigError(#[from] serde_json::Error),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("unknown file type: {0}")]
    UnknownFileType(String),

    #[error("empty source: {0}")]
    EmptySource(String),

    #[error("loading failed: {0}")]
    LoadingFailed(String),

    #[error("clipboard error: {0}")]
    ClipboardError(#[from] arboard::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CMDMode {
    Search,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    NextDataset,
    PreviousDataset,
    NextCategory,
    PreviousCategory,
    Search,
    EnterCommand,
    Enter,
    Exit,
    CopyRow,
    Reload,
    Help,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
stockview - inventory dashboard

  /            search barcode or description
  Esc          clear search / close view
  c / C        next / previous category
  Tab, ← →     switch between Warehouse Stock and New Arrival
  ↑ ↓ j k      move selection
  PgUp PgDn    move one page
  g / G        first / last row
  Enter        show item details (incl. cost)
  y            copy selected row to clipboard
  r            reload both datasets from disk
  :            command (open stock <path>, open arrival <path>, reload)
  ?            this help
  q            quit
";
