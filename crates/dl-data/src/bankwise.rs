//! Per-bank views over the month-end rows of the raw dataset.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use dl_core::error::{DashboardError, Result};
use dl_core::models::{select_range, PeriodSelector, RawRecord, RecordType};
use serde::Serialize;

/// One bank's month-end figures with derived totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankRow {
    pub bank_name: String,
    pub report_date: NaiveDate,
    pub local_date: String,
    pub fiscal_year: String,
    pub year: i32,
    pub month: String,
    pub deposits_local: f64,
    pub deposits_foreign: f64,
    pub deposits_total: f64,
    pub lending_local: f64,
    pub lending_foreign: f64,
    pub lending_total: f64,
    /// Percent.
    pub credit_deposit_ratio: f64,
}

impl From<&RawRecord> for BankRow {
    fn from(r: &RawRecord) -> Self {
        Self {
            bank_name: r.bank_name.clone(),
            report_date: r.report_date,
            local_date: r.local_date.clone(),
            fiscal_year: r.fiscal_year.clone(),
            year: r.year,
            month: r.month.clone(),
            deposits_local: r.deposits_local_currency,
            deposits_foreign: r.deposits_foreign_currency,
            deposits_total: r.deposits_total(),
            lending_local: r.lending_local_currency,
            lending_foreign: r.lending_foreign_currency,
            lending_total: r.lending_total(),
            credit_deposit_ratio: r.credit_deposit_ratio_pct(),
        }
    }
}

/// One point of a bank's trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankTrendPoint {
    pub bank_name: String,
    /// `"{year}-{month}"`.
    pub label: String,
    pub deposits_total: f64,
    pub lending_total: f64,
}

fn month_end_rows(records: &[RawRecord]) -> Vec<&RawRecord> {
    records
        .iter()
        .filter(|r| r.record_type == RecordType::End)
        .collect()
}

/// `(year, month)` of the last month-end row in source order.
pub fn latest_month_end(records: &[RawRecord]) -> Result<(i32, String)> {
    records
        .iter()
        .rev()
        .find(|r| r.record_type == RecordType::End)
        .map(|r| (r.year, r.month.clone()))
        .ok_or(DashboardError::EmptyDataset)
}

/// Every bank's month-end row for `year`/`month`, in source order.
pub fn month_end_snapshot(records: &[RawRecord], year: i32, month: &str) -> Vec<BankRow> {
    records
        .iter()
        .filter(|r| r.record_type == RecordType::End && r.year == year && r.month == month)
        .map(BankRow::from)
        .collect()
}

/// Distinct bank names that report month-end figures, sorted.
pub fn bank_names(records: &[RawRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.record_type == RecordType::End)
        .map(|r| r.bank_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Month-end rows of the chosen banks between the first row matching `from`
/// and the last row matching `to`.
///
/// The range is located over all banks' month-end rows before the bank
/// filter is applied.
pub fn bank_trend(
    records: &[RawRecord],
    banks: &[String],
    from: &PeriodSelector,
    to: &PeriodSelector,
) -> Result<Vec<BankTrendPoint>> {
    let rows = month_end_rows(records);
    if rows.is_empty() {
        return Err(DashboardError::EmptyDataset);
    }
    let range = select_range(rows.as_slice(), from, to)?;
    Ok(rows[range]
        .iter()
        .filter(|r| banks.contains(&r.bank_name))
        .map(|r| BankTrendPoint {
            bank_name: r.bank_name.clone(),
            label: format!("{}-{}", r.year, r.month),
            deposits_total: r.deposits_total(),
            lending_total: r.lending_total(),
        })
        .collect())
}

/// Every month-end row reported by `bank`, in source order.
pub fn bank_history(records: &[RawRecord], bank: &str) -> Vec<BankRow> {
    month_end_rows(records)
        .into_iter()
        .filter(|r| r.bank_name == bank)
        .map(BankRow::from)
        .collect()
}
