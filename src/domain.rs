use std::fmt;
use std::io;

use clap::Parser;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

/// Command line and environment configuration.
///
/// The four warehouse values are deliberately optional here; they are
/// validated into a `WarehouseConfig` before any query runs so a missing
/// value surfaces as a single readable error instead of a usage dump.
#[derive(Parser, Debug)]
#[command(name = "lrv", version, about = "A tui based viewer for warehouse load reports.")]
pub struct Cli {
    /// Warehouse project identifier
    #[arg(long, env = "LRV_PROJECT")]
    pub project: Option<String>,

    /// Warehouse dataset identifier
    #[arg(long, env = "LRV_DATASET")]
    pub dataset: Option<String>,

    /// Table identifier inside the dataset
    #[arg(long, env = "LRV_TABLE")]
    pub table: Option<String>,

    /// Geographic location the dataset lives in
    #[arg(long, env = "LRV_LOCATION")]
    pub location: Option<String>,

    /// Directory holding the warehouse extracts
    #[arg(long, env = "LRV_WAREHOUSE_ROOT", default_value = "~/warehouse")]
    pub warehouse_root: String,

    /// Terminal event poll time in milliseconds
    #[arg(long, default_value_t = 100)]
    pub event_poll_time: u64,
}

#[derive(Debug, Clone)]
pub struct LrvConfig {
    pub event_poll_time: u64,
}

/// The four report columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    LoadDate,
    Source,
    RecordCount,
    LoadStatus,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 4] = [
        ColumnKey::LoadDate,
        ColumnKey::Source,
        ColumnKey::RecordCount,
        ColumnKey::LoadStatus,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ColumnKey::LoadDate => "Load Date",
            ColumnKey::Source => "Source",
            ColumnKey::RecordCount => "Record Count",
            ColumnKey::LoadStatus => "Status",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&key| key == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort column and direction. At most one column is sorted at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct SortConfig {
    pub key: Option<ColumnKey>,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    /// First render shows the newest loads first.
    fn default() -> Self {
        SortConfig {
            key: Some(ColumnKey::LoadDate),
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug)]
pub enum Message {
    Quit,
    Resize(u16, u16),
    Click(u16, u16),
    SortByColumn(ColumnKey),
    FocusNextFilter,
    UnfocusFilter,
    RawKey(KeyEvent),
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
}

#[derive(Debug)]
pub enum LrvError {
    IoError(io::Error),
    PolarsError(PolarsError),
    MissingConfig(&'static str),
    InvalidRoot(String),
    ExtractNotFound(String),
    QueryFailed(String),
}

impl From<io::Error> for LrvError {
    fn from(err: io::Error) -> Self {
        LrvError::IoError(err)
    }
}

impl From<PolarsError> for LrvError {
    fn from(err: PolarsError) -> Self {
        LrvError::PolarsError(err)
    }
}

impl fmt::Display for LrvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LrvError::IoError(e) => write!(f, "io error: {e}"),
            LrvError::PolarsError(e) => write!(f, "query engine error: {e}"),
            LrvError::MissingConfig(name) => write!(
                f,
                "Missing required configuration value '{name}' (set --{name} or LRV_{})",
                name.to_uppercase()
            ),
            LrvError::InvalidRoot(msg) => write!(f, "Could not resolve warehouse root: {msg}"),
            LrvError::ExtractNotFound(what) => write!(f, "No extract found for {what}"),
            LrvError::QueryFailed(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LrvError {}
