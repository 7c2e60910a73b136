//! Credit-to-deposit ratio tables and per-fiscal-year series.

use chrono::NaiveDate;
use dl_core::error::Result;
use dl_core::models::{PeriodSummary, PeriodView, ViewKind};
use serde::Serialize;

use crate::comparison::latest_summary;

/// The ratio of the newest summary overall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestCdRatio {
    pub description: String,
    pub local_date: String,
    /// Percent.
    pub ratio: f64,
}

/// One row of the ratio table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdRatioRow {
    pub fiscal_year: String,
    pub year: i32,
    pub month: String,
    pub week: String,
    pub report_date: NaiveDate,
    pub local_date: String,
    pub ratio: f64,
}

impl From<&PeriodSummary> for CdRatioRow {
    fn from(s: &PeriodSummary) -> Self {
        Self {
            fiscal_year: s.fiscal_year.clone(),
            year: s.year,
            month: s.month.clone(),
            week: s.week.clone(),
            report_date: s.report_date,
            local_date: s.local_date.clone(),
            ratio: s.credit_deposit_ratio,
        }
    }
}

/// One point of a fiscal year's ratio line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdRatioPoint {
    pub label: String,
    pub ratio: f64,
}

pub fn latest_cd_ratio(summaries: &[PeriodSummary]) -> Result<LatestCdRatio> {
    let latest = latest_summary(summaries)?;
    Ok(LatestCdRatio {
        description: latest.description.clone(),
        local_date: latest.local_date.clone(),
        ratio: latest.credit_deposit_ratio,
    })
}

/// Rows of `view`, newest report date first. Rows sharing a date keep their
/// view order.
pub fn cd_ratio_table(view: &PeriodView<'_>) -> Vec<CdRatioRow> {
    let mut rows: Vec<&PeriodSummary> = view.iter().collect();
    rows.sort_by(|a, b| b.report_date.cmp(&a.report_date));
    rows.into_iter().map(CdRatioRow::from).collect()
}

/// Distinct fiscal years of `view` in first-seen order.
pub fn fiscal_years(view: &PeriodView<'_>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for s in view.iter() {
        if !seen.contains(&s.fiscal_year) {
            seen.push(s.fiscal_year.clone());
        }
    }
    seen
}

/// The most recently seen fiscal year, selected by default.
pub fn default_fiscal_year(view: &PeriodView<'_>) -> Option<String> {
    fiscal_years(view).pop()
}

/// Ratio of each row of `view` in `fiscal_year`.
///
/// Month-end points are labelled by month; weekly points by their full
/// description since a month holds several weeks.
pub fn cd_ratio_series(view: &PeriodView<'_>, fiscal_year: &str) -> Vec<CdRatioPoint> {
    view.iter()
        .filter(|s| s.fiscal_year == fiscal_year)
        .map(|s| CdRatioPoint {
            label: match view.kind() {
                ViewKind::MonthEnd => s.month.clone(),
                ViewKind::Weekly => s.description.clone(),
            },
            ratio: s.credit_deposit_ratio,
        })
        .collect()
}
