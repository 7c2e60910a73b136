//! Point-to-point comparisons: the latest period against its predecessor and
//! an arbitrary start period against an end period.

use dl_core::error::{DashboardError, Result};
use dl_core::formatting::percent_change;
use dl_core::models::{select_range, PeriodSelector, PeriodSummary, PeriodView};
use serde::Serialize;

// ── PeriodDelta ───────────────────────────────────────────────────────────────

/// Difference of the six amount fields between two summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodDelta {
    pub deposits_local: f64,
    pub deposits_foreign: f64,
    pub deposits_total: f64,
    pub lending_local: f64,
    pub lending_foreign: f64,
    pub lending_total: f64,
}

impl PeriodDelta {
    /// `current - previous` for each amount field.
    pub fn between(previous: &PeriodSummary, current: &PeriodSummary) -> Self {
        Self {
            deposits_local: current.deposits_local_total - previous.deposits_local_total,
            deposits_foreign: current.deposits_foreign_total - previous.deposits_foreign_total,
            deposits_total: current.deposits_total - previous.deposits_total,
            lending_local: current.lending_local_total - previous.lending_local_total,
            lending_foreign: current.lending_foreign_total - previous.lending_foreign_total,
            lending_total: current.lending_total - previous.lending_total,
        }
    }
}

// ── Home metrics ──────────────────────────────────────────────────────────────

/// Headline figures: the newest summary and how it moved since the one before.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeMetrics<'a> {
    pub latest: &'a PeriodSummary,
    pub previous_description: String,
    pub deltas: PeriodDelta,
}

/// Newest summary in the date-ordered sequence.
pub fn latest_summary(summaries: &[PeriodSummary]) -> Result<&PeriodSummary> {
    summaries.last().ok_or(DashboardError::EmptyDataset)
}

/// Latest summary and its deltas against the previous summary of either
/// record type.
pub fn home_metrics(summaries: &[PeriodSummary]) -> Result<HomeMetrics<'_>> {
    let latest = latest_summary(summaries)?;
    let previous = match summaries.len().checked_sub(2) {
        Some(i) => &summaries[i],
        None => {
            return Err(DashboardError::InsufficientHistory {
                view: "all periods".to_string(),
                required: 2,
                available: summaries.len(),
            })
        }
    };
    Ok(HomeMetrics {
        latest,
        previous_description: previous.description.clone(),
        deltas: PeriodDelta::between(previous, latest),
    })
}

// ── Range comparison ──────────────────────────────────────────────────────────

/// A start and end value of one metric with its absolute and percent change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricChange {
    pub start: f64,
    pub end: f64,
    pub change: f64,
    pub percent: f64,
}

impl MetricChange {
    fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            change: end - start,
            percent: percent_change(start, end),
        }
    }
}

/// How deposits, lending and the CD ratio moved between two periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeComparison {
    pub from_description: String,
    pub to_description: String,
    /// Number of summaries in the selected range, both ends included.
    pub periods: usize,
    pub deposits: MetricChange,
    pub lending: MetricChange,
    pub credit_deposit_ratio: MetricChange,
}

/// Compare the first summary matching `from` with the last summary matching
/// `to`.
pub fn compare_range(
    summaries: &[PeriodSummary],
    from: &PeriodSelector,
    to: &PeriodSelector,
) -> Result<RangeComparison> {
    if summaries.is_empty() {
        return Err(DashboardError::EmptyDataset);
    }
    let range = select_range(summaries, from, to)?;
    let start = &summaries[*range.start()];
    let end = &summaries[*range.end()];
    Ok(RangeComparison {
        from_description: start.description.clone(),
        to_description: end.description.clone(),
        periods: range.count(),
        deposits: MetricChange::new(start.deposits_total, end.deposits_total),
        lending: MetricChange::new(start.lending_total, end.lending_total),
        credit_deposit_ratio: MetricChange::new(
            start.credit_deposit_ratio,
            end.credit_deposit_ratio,
        ),
    })
}

// ── Trend ─────────────────────────────────────────────────────────────────────

/// One point of a deposit/lending trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// `"{year}-{month}"`.
    pub label: String,
    pub deposits_total: f64,
    pub lending_total: f64,
}

/// Rows of `view` from the first match of `from` to the last match of `to`.
pub fn trend_between(
    view: &PeriodView<'_>,
    from: &PeriodSelector,
    to: &PeriodSelector,
) -> Result<Vec<TrendPoint>> {
    if view.is_empty() {
        return Err(DashboardError::EmptyDataset);
    }
    let range = select_range(view.rows(), from, to)?;
    Ok(view.rows()[range]
        .iter()
        .map(|s| TrendPoint {
            label: s.year_month_label(),
            deposits_total: s.deposits_total,
            lending_total: s.lending_total,
        })
        .collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
