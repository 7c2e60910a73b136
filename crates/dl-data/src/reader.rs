//! CSV discovery and loading for the deposit/lending dashboard.
//!
//! Reads the per-bank, per-period rows compiled by the bankers' association
//! and converts them into [`RawRecord`] structs for downstream aggregation.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use dl_core::error::{DashboardError, Result};
use dl_core::models::{RawRecord, RecordType};
use serde::Deserialize;
use tracing::{debug, warn};

/// Date layouts accepted in the `Date` column, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y-%m-%d %H:%M:%S"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Every raw row read from a data path, with the files it came from.
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    /// Rows in file order, then line order.
    pub records: Vec<RawRecord>,
    /// Files that were read, in the order they were read.
    pub files: Vec<PathBuf>,
}

/// Find all `.csv` files recursively under `data_path`, sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every row under `data_path`.
///
/// `data_path` may name a single CSV file or a directory; a directory is
/// scanned recursively and its files are read in path order. Any malformed
/// row aborts the whole load.
pub fn load_raw_records(data_path: &Path) -> Result<LoadedRecords> {
    if !data_path.exists() {
        return Err(DashboardError::DataPathNotFound(data_path.to_path_buf()));
    }

    let files = if data_path.is_dir() {
        let found = find_csv_files(data_path);
        if found.is_empty() {
            return Err(DashboardError::NoDataFiles(data_path.to_path_buf()));
        }
        found
    } else {
        vec![data_path.to_path_buf()]
    };

    let mut records = Vec::new();
    for file in &files {
        let rows = read_csv_file(file)?;
        debug!("File {}: {} rows", file.display(), rows.len());
        records.extend(rows);
    }

    debug!("Loaded {} rows from {} files", records.len(), files.len());

    Ok(LoadedRecords { records, files })
}

/// Parse CSV text from any reader. `source_name` labels errors.
pub fn read_records<R: Read>(reader: R, source_name: &str) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut rows = Vec::new();

    while rdr.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|field| field.is_empty()) {
            debug!("{}: skipping empty row at line {}", source_name, line);
            continue;
        }

        let row: CsvRow =
            record
                .deserialize(Some(&headers))
                .map_err(|e| DashboardError::MalformedInput {
                    source_name: source_name.to_string(),
                    line,
                    reason: e.to_string(),
                })?;

        rows.push(row.into_record(source_name, line)?);
    }

    Ok(rows)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_csv_file(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path.display().to_string();
    read_records(std::io::BufReader::new(file), &name)
}

/// One CSV line as it appears on disk. Every column is optional here so that
/// absence can be reported with a line number instead of a serde message.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    #[serde(rename = "Bank", alias = "bank", alias = "bank_name")]
    bank: Option<String>,
    #[serde(rename = "Date", alias = "date", alias = "report_date")]
    date: Option<String>,
    #[serde(rename = "Ndate", alias = "ndate", alias = "local_date")]
    local_date: Option<String>,
    #[serde(rename = "FY", alias = "fy", alias = "fiscal_year")]
    fiscal_year: Option<String>,
    #[serde(rename = "Year", alias = "year")]
    year: Option<String>,
    #[serde(rename = "Month", alias = "month")]
    month: Option<String>,
    #[serde(rename = "Week", alias = "week")]
    week: Option<String>,
    #[serde(rename = "type", alias = "Type", alias = "record_type")]
    record_type: Option<String>,
    #[serde(rename = "DLCY", alias = "deposits_local_currency")]
    deposits_lcy: Option<String>,
    #[serde(rename = "DFCY", alias = "deposits_foreign_currency")]
    deposits_fcy: Option<String>,
    #[serde(rename = "LLCY", alias = "lending_local_currency")]
    lending_lcy: Option<String>,
    #[serde(rename = "LFCY", alias = "lending_foreign_currency")]
    lending_fcy: Option<String>,
    #[serde(rename = "CD", alias = "cd", alias = "credit_deposit_ratio")]
    cd_ratio: Option<String>,
}

impl CsvRow {
    fn into_record(self, source_name: &str, line: u64) -> Result<RawRecord> {
        let malformed = |reason: String| DashboardError::MalformedInput {
            source_name: source_name.to_string(),
            line,
            reason,
        };

        let bank_name = required(self.bank, "Bank").map_err(malformed)?;
        let date_text = required(self.date, "Date").map_err(malformed)?;
        let report_date = parse_date(&date_text)
            .ok_or_else(|| malformed(format!("unparseable date '{date_text}'")))?;
        let year_text = required(self.year, "Year").map_err(malformed)?;
        let year = parse_year(&year_text)
            .ok_or_else(|| malformed(format!("unparseable year '{year_text}'")))?;
        let month = required(self.month, "Month").map_err(malformed)?;
        let week = required(self.week, "Week").map_err(malformed)?;
        let record_type = required(self.record_type, "type")
            .and_then(|t| t.parse::<RecordType>())
            .map_err(malformed)?;

        Ok(RawRecord {
            bank_name,
            report_date,
            local_date: self.local_date.unwrap_or_default(),
            fiscal_year: self.fiscal_year.unwrap_or_default(),
            year,
            month,
            week,
            record_type,
            deposits_local_currency: parse_amount(self.deposits_lcy, "DLCY").map_err(malformed)?,
            deposits_foreign_currency: parse_amount(self.deposits_fcy, "DFCY").map_err(malformed)?,
            lending_local_currency: parse_amount(self.lending_lcy, "LLCY").map_err(malformed)?,
            lending_foreign_currency: parse_amount(self.lending_fcy, "LFCY").map_err(malformed)?,
            credit_deposit_ratio_raw: parse_amount(self.cd_ratio, "CD").map_err(malformed)?,
        })
    }
}

fn required(value: Option<String>, column: &str) -> std::result::Result<String, String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("missing required column '{column}'")),
    }
}

/// Parse a date in any of [`DATE_FORMATS`].
fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Accept `"2081"` as well as spreadsheet exports such as `"2081.0"`.
fn parse_year(text: &str) -> Option<i32> {
    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }
    let value = text.parse::<f64>().ok()?;
    (value.fract() == 0.0 && value.abs() < f64::from(i32::MAX)).then_some(value as i32)
}

/// Blank cells default to zero; anything else must be numeric. Thousands
/// separators are tolerated.
fn parse_amount(value: Option<String>, column: &str) -> std::result::Result<f64, String> {
    let Some(text) = value else {
        return Ok(0.0);
    };
    let cleaned = text.replace(',', "");
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("column '{column}' is not a number: '{text}'"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
