//! Top-level load pipeline.
//!
//! Reads the raw rows, aggregates them and returns an immutable [`Dataset`]
//! handle that every page computation borrows from.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use dl_core::error::Result;
use dl_core::models::{PeriodSummary, PeriodView, RawRecord};
use tracing::{debug, info};

use crate::aggregator::{AggregatedDataset, GroupingPolicy, PeriodAggregator};
use crate::reader::load_raw_records;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside a loaded dataset.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatasetMetadata {
    /// ISO-8601 timestamp when the dataset was built.
    pub generated_at: String,
    /// File or directory the rows were read from.
    pub source: PathBuf,
    /// Number of CSV files read.
    pub files_read: usize,
    /// Number of bank rows loaded.
    pub records_loaded: usize,
    /// Number of period summaries created.
    pub periods_created: usize,
    pub month_end_periods: usize,
    pub weekly_periods: usize,
    /// Wall-clock seconds spent reading CSV files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent aggregating.
    pub aggregate_time_seconds: f64,
}

/// Raw rows plus their aggregation. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<RawRecord>,
    aggregated: AggregatedDataset,
    metadata: DatasetMetadata,
}

impl Dataset {
    /// Raw bank rows in source order.
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn aggregated(&self) -> &AggregatedDataset {
        &self.aggregated
    }

    /// Period summaries sorted by report date.
    pub fn summaries(&self) -> &[PeriodSummary] {
        self.aggregated.summaries()
    }

    pub fn month_end(&self) -> PeriodView<'_> {
        self.aggregated.month_end()
    }

    pub fn weekly(&self) -> PeriodView<'_> {
        self.aggregated.weekly()
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Load every CSV file under `data_path` and aggregate it.
///
/// Any read or parse failure is returned as-is; nothing is retried.
pub fn load_dataset(data_path: &Path, policy: GroupingPolicy) -> Result<Dataset> {
    let load_start = Instant::now();
    let loaded = load_raw_records(data_path)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut dataset = build_dataset(
        loaded.records,
        policy,
        data_path.to_path_buf(),
        loaded.files.len(),
    )?;
    dataset.metadata.load_time_seconds = load_time;

    info!(
        "Loaded {} rows from {} file(s) into {} periods",
        dataset.metadata.records_loaded,
        dataset.metadata.files_read,
        dataset.metadata.periods_created,
    );
    Ok(dataset)
}

/// Aggregate rows that are already in memory.
pub fn build_dataset(
    records: Vec<RawRecord>,
    policy: GroupingPolicy,
    source: PathBuf,
    files_read: usize,
) -> Result<Dataset> {
    let aggregate_start = Instant::now();
    let aggregated = PeriodAggregator::load_and_aggregate(&records, policy)?;
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    let month_end_periods = aggregated.month_end().len();
    let weekly_periods = aggregated.weekly().len();
    debug!(
        "Aggregated {} rows: {} month-end and {} weekly periods",
        records.len(),
        month_end_periods,
        weekly_periods,
    );

    let metadata = DatasetMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source,
        files_read,
        records_loaded: records.len(),
        periods_created: aggregated.len(),
        month_end_periods,
        weekly_periods,
        load_time_seconds: 0.0,
        aggregate_time_seconds: aggregate_time,
    };

    Ok(Dataset {
        records,
        aggregated,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dl_core::error::DashboardError;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "Bank,Date,Ndate,FY,Year,Month,Week,type,DLCY,DFCY,LLCY,LFCY,CD";

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    // ── load_dataset ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_dataset_basic_pipeline() {
        let dir = TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "schema.csv",
            &[
                "Bank A,2024-04-20,8/1/2081,2080/81,2081,Baisakh,1st Week,Week,90,9,70,6,0.78",
                "Bank A,2024-05-13,31/1/2081,2080/81,2081,Baisakh,End,End,100,10,80,5,0.8",
                "Bank B,2024-05-13,31/1/2081,2080/81,2081,Baisakh,End,End,50,5,40,2,0.76",
            ],
        );

        let dataset = load_dataset(dir.path(), GroupingPolicy::FirstWins).unwrap();

        assert_eq!(dataset.records().len(), 3);
        assert_eq!(dataset.summaries().len(), 2);
        assert_eq!(dataset.month_end().len(), 1);
        assert_eq!(dataset.weekly().len(), 1);

        let end = dataset.month_end().last().unwrap();
        assert_eq!(end.deposits_total, 165.0);
        assert_eq!(end.lending_total, 127.0);
    }

    #[test]
    fn test_load_dataset_metadata_fields_populated() {
        let dir = TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "a.csv",
            &["Bank A,2024-05-13,31/1/2081,2080/81,2081,Baisakh,End,End,100,10,80,5,0.8"],
        );
        write_csv(
            dir.path(),
            "b.csv",
            &["Bank A,2024-06-13,31/2/2081,2080/81,2081,Jestha,End,End,110,10,85,5,0.8"],
        );

        let dataset = load_dataset(dir.path(), GroupingPolicy::FirstWins).unwrap();
        let meta = dataset.metadata();

        assert!(!meta.generated_at.is_empty());
        assert_eq!(meta.source, dir.path());
        assert_eq!(meta.files_read, 2);
        assert_eq!(meta.records_loaded, 2);
        assert_eq!(meta.periods_created, 2);
        assert_eq!(meta.month_end_periods, 2);
        assert_eq!(meta.weekly_periods, 0);
        assert!(meta.load_time_seconds >= 0.0);
        assert!(meta.aggregate_time_seconds >= 0.0);
    }

    #[test]
    fn test_load_dataset_header_only_is_empty() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "schema.csv", &[]);

        let err = load_dataset(dir.path(), GroupingPolicy::FirstWins).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyDataset));
    }

    #[test]
    fn test_load_dataset_malformed_row_surfaces() {
        let dir = TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "schema.csv",
            &["Bank A,not-a-date,31/1/2081,2080/81,2081,Baisakh,End,End,100,10,80,5,0.8"],
        );

        let err = load_dataset(dir.path(), GroupingPolicy::FirstWins).unwrap_err();
        assert!(matches!(err, DashboardError::MalformedInput { .. }));
    }

    #[test]
    fn test_load_dataset_strict_policy_propagates_conflict() {
        let dir = TempDir::new().unwrap();
        write_csv(
            dir.path(),
            "schema.csv",
            &[
                "Bank A,2024-05-13,31/1/2081,2080/81,2081,Baisakh,End,End,100,10,80,5,0.8",
                "Bank B,2024-05-13,31/1/2081,2080/81,2081,Baisakh,End,Week,50,5,40,2,0.76",
            ],
        );

        assert!(load_dataset(dir.path(), GroupingPolicy::FirstWins).is_ok());
        let err = load_dataset(dir.path(), GroupingPolicy::Strict).unwrap_err();
        assert!(matches!(err, DashboardError::AmbiguousGrouping { .. }));
    }

    // ── build_dataset ─────────────────────────────────────────────────────────

    #[test]
    fn test_build_dataset_from_memory() {
        use crate::test_support::record;
        use dl_core::models::RecordType;

        let records = vec![
            record("Bank A", 2081, "Baisakh", "End", RecordType::End, (2024, 5, 13), (1.0, 0.0), (1.0, 0.0), 1.0),
            record("Bank A", 2081, "Jestha", "End", RecordType::End, (2024, 6, 13), (2.0, 0.0), (1.0, 0.0), 0.5),
        ];
        let dataset =
            build_dataset(records, GroupingPolicy::FirstWins, PathBuf::from("memory"), 0).unwrap();

        assert_eq!(dataset.metadata().records_loaded, 2);
        assert_eq!(dataset.metadata().load_time_seconds, 0.0);
        assert_eq!(dataset.aggregated().latest().unwrap().month, "Jestha");
    }
}
