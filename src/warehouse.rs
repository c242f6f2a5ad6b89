use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, info};

use crate::domain::{Cli, LrvError};

/// How many rows the report query returns at most.
const REPORT_ROW_LIMIT: u32 = 100;

/// One normalized reporting row. This is the only shape that crosses into
/// the table engine; the warehouse-native date type never leaves this
/// module.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRecord {
    pub load_date: Option<String>,
    pub source: String,
    pub record_count: i64,
    pub load_status: bool,
}

/// Validated warehouse addressing. All four values are required.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub project: String,
    pub dataset: String,
    pub table: String,
    pub location: String,
    root: PathBuf,
}

impl WarehouseConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, LrvError> {
        let project = cli.project.clone().ok_or(LrvError::MissingConfig("project"))?;
        let dataset = cli.dataset.clone().ok_or(LrvError::MissingConfig("dataset"))?;
        let table = cli.table.clone().ok_or(LrvError::MissingConfig("table"))?;
        let location = cli.location.clone().ok_or(LrvError::MissingConfig("location"))?;

        let root = shellexpand::full(&cli.warehouse_root)
            .map_err(|e| LrvError::InvalidRoot(e.to_string()))?;

        Ok(WarehouseConfig {
            project,
            dataset,
            table,
            location,
            root: PathBuf::from(root.as_ref()),
        })
    }

    pub fn fq_table(&self) -> String {
        format!("{}.{}.{}", self.project, self.dataset, self.table)
    }

    fn extract_dir(&self) -> PathBuf {
        self.root
            .join(&self.location)
            .join(&self.project)
            .join(&self.dataset)
    }
}

#[derive(Debug, Clone, Copy)]
enum ExtractFormat {
    Parquet,
    Csv,
}

fn resolve_extract(config: &WarehouseConfig) -> Result<(PathBuf, ExtractFormat), LrvError> {
    let dir = config.extract_dir();
    for (ext, format) in [("parquet", ExtractFormat::Parquet), ("csv", ExtractFormat::Csv)] {
        let candidate = dir.join(format!("{}.{ext}", config.table));
        if candidate.is_file() {
            return Ok((candidate, format));
        }
    }
    Err(LrvError::ExtractNotFound(format!(
        "table {} under {}",
        config.fq_table(),
        dir.display()
    )))
}

fn scan_extract(path: &PathBuf, format: ExtractFormat) -> Result<LazyFrame, PolarsError> {
    match format {
        ExtractFormat::Parquet => LazyFrame::scan_parquet(
            PlPath::Local(path.as_path().into()),
            ScanArgsParquet::default(),
        ),
        ExtractFormat::Csv => LazyCsvReader::new(PlPath::Local(path.as_path().into()))
            .with_has_header(true)
            .finish(),
    }
}

/// The one fixed query of the whole program: the four report columns,
/// newest loads first, capped at the report row limit.
fn load_report_query(lf: LazyFrame) -> LazyFrame {
    lf.select([
        col("load_date"),
        col("source"),
        col("record_count"),
        col("load_status"),
    ])
    .sort(
        ["load_date"],
        SortMultipleOptions::default()
            .with_order_descending(true)
            .with_nulls_last(true),
    )
    .limit(REPORT_ROW_LIMIT)
}

/// Point-of-entry adapter: unwrap the warehouse date type into a plain
/// `YYYY-MM-DD` string (or None) and hand out flat records.
fn normalize_rows(df: &DataFrame) -> Result<Vec<LoadRecord>, LrvError> {
    let dates = df.column("load_date")?.cast(&DataType::String)?;
    let dates = dates.str()?;
    let sources = df.column("source")?.cast(&DataType::String)?;
    let sources = sources.str()?;
    let counts = df.column("record_count")?.cast(&DataType::Int64)?;
    let counts = counts.i64()?;
    let statuses = df.column("load_status")?.bool()?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        records.push(LoadRecord {
            load_date: dates.get(idx).map(|s| s.to_string()),
            source: sources.get(idx).unwrap_or_default().to_string(),
            record_count: counts.get(idx).unwrap_or_default(),
            load_status: statuses.get(idx).unwrap_or_default(),
        });
    }
    Ok(records)
}

/// Runs the report query once and returns normalized records. Not retried;
/// a failing query surfaces as a single descriptive error.
pub fn fetch_load_report(config: &WarehouseConfig) -> Result<Vec<LoadRecord>, LrvError> {
    let (path, format) = resolve_extract(config)?;
    info!("Reading {} extract from {}", config.fq_table(), path.display());

    let lf = scan_extract(&path, format)?;
    let df = load_report_query(lf).collect().map_err(|e| {
        LrvError::QueryFailed(format!(
            "Load report query against {} failed: {e}",
            config.fq_table()
        ))
    })?;
    debug!("Report query returned {} rows", df.height());

    normalize_rows(&df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::display_load_date;

    fn cli(project: Option<&str>) -> Cli {
        Cli {
            project: project.map(String::from),
            dataset: Some("reporting".to_string()),
            table: Some("load_report".to_string()),
            location: Some("eu".to_string()),
            warehouse_root: "/tmp/warehouse".to_string(),
            event_poll_time: 100,
        }
    }

    fn extract_frame() -> DataFrame {
        let mut df = df!(
            "load_date" => &[Some("2024-03-15"), Some("2024-01-01"), None],
            "source" => &["alpha", "beta", "gamma"],
            "record_count" => &[10i64, 5, 0],
            "load_status" => &[true, false, true],
        )
        .unwrap();
        // Store the date column in the warehouse-native date type.
        let casted = df.column("load_date").unwrap().cast(&DataType::Date).unwrap();
        df.with_column(casted).unwrap();
        df
    }

    #[test]
    fn missing_config_value_is_fatal() {
        let err = WarehouseConfig::from_cli(&cli(None)).unwrap_err();
        match err {
            LrvError::MissingConfig(name) => assert_eq!(name, "project"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn config_addresses_the_fully_qualified_table() {
        let config = WarehouseConfig::from_cli(&cli(Some("analytics"))).unwrap();
        assert_eq!(config.fq_table(), "analytics.reporting.load_report");
        assert_eq!(
            config.extract_dir(),
            PathBuf::from("/tmp/warehouse/eu/analytics/reporting")
        );
    }

    #[test]
    fn normalization_unwraps_dates_into_plain_strings() {
        let records = normalize_rows(&extract_frame()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].load_date.as_deref(), Some("2024-03-15"));
        assert_eq!(records[2].load_date, None);
        assert_eq!(records[1].source, "beta");
        assert_eq!(records[0].record_count, 10);
        assert!(!records[1].load_status);
    }

    #[test]
    fn normalize_then_display_round_trips_the_calendar_day() {
        let records = normalize_rows(&extract_frame()).unwrap();
        assert_eq!(display_load_date(records[0].load_date.as_deref()), "2024-03-15");
    }

    #[test]
    fn report_query_orders_newest_first_with_nulls_last() {
        let df = load_report_query(extract_frame().lazy()).collect().unwrap();
        let records = normalize_rows(&df).unwrap();
        assert_eq!(records[0].load_date.as_deref(), Some("2024-03-15"));
        assert_eq!(records[1].load_date.as_deref(), Some("2024-01-01"));
        assert_eq!(records[2].load_date, None);
    }

    #[test]
    fn report_query_limits_the_row_count() {
        let dates: Vec<String> = (0..150)
            .map(|i| format!("2023-{:02}-{:02}", i / 28 + 1, i % 28 + 1))
            .collect();
        let sources: Vec<String> = (0..150).map(|i| format!("src_{i}")).collect();
        let counts: Vec<i64> = (0..150).collect();
        let statuses: Vec<bool> = (0..150).map(|i| i % 2 == 0).collect();
        let df = df!(
            "load_date" => &dates,
            "source" => &sources,
            "record_count" => &counts,
            "load_status" => &statuses,
        )
        .unwrap();

        let out = load_report_query(df.lazy()).collect().unwrap();
        assert_eq!(out.height(), 100);
    }
}
