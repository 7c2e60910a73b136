//! Period-over-period growth of deposit and lending totals.
//!
//! Differences are always taken against the immediately preceding row of the
//! whole view. Windows and fiscal-year filters only decide which rows are
//! reported, never which row a value is compared with (unless
//! [`BaselinePolicy::WithinSelection`] is requested explicitly).

use std::fmt;
use std::str::FromStr;

use dl_core::error::{DashboardError, Result};
use dl_core::formatting::percent_change;
use dl_core::models::{PeriodSummary, PeriodView};
use serde::Serialize;

// ── GrowthPoint ───────────────────────────────────────────────────────────────

/// Absolute change of one row against its predecessor in the view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    /// `"{year} {month} {week}"`.
    pub label: String,
    pub month: String,
    pub fiscal_year: String,
    pub deposits_total: f64,
    pub lending_total: f64,
    /// `None` for the first row of the view, which has no predecessor.
    pub deposits_delta: Option<f64>,
    pub lending_delta: Option<f64>,
}

impl GrowthPoint {
    fn between(current: &PeriodSummary, previous: Option<&PeriodSummary>) -> Self {
        Self {
            label: current.description.clone(),
            month: current.month.clone(),
            fiscal_year: current.fiscal_year.clone(),
            deposits_total: current.deposits_total,
            lending_total: current.lending_total,
            deposits_delta: previous.map(|p| current.deposits_total - p.deposits_total),
            lending_delta: previous.map(|p| current.lending_total - p.lending_total),
        }
    }
}

// ── GrowthSeries ──────────────────────────────────────────────────────────────

/// A trailing window over a view's growth, computed lazily.
///
/// Iterating twice yields the same points; nothing is cached.
#[derive(Debug, Clone)]
pub struct GrowthSeries<'a> {
    rows: Vec<&'a PeriodSummary>,
    start: usize,
}

impl<'a> GrowthSeries<'a> {
    pub fn iter(&self) -> GrowthIter<'_, 'a> {
        GrowthIter {
            rows: &self.rows,
            pos: self.start,
        }
    }

    /// Number of points the series yields.
    pub fn len(&self) -> usize {
        self.rows.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'s, 'a> IntoIterator for &'s GrowthSeries<'a> {
    type Item = GrowthPoint;
    type IntoIter = GrowthIter<'s, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`GrowthSeries::iter`].
pub struct GrowthIter<'s, 'a> {
    rows: &'s [&'a PeriodSummary],
    pos: usize,
}

impl Iterator for GrowthIter<'_, '_> {
    type Item = GrowthPoint;

    fn next(&mut self) -> Option<GrowthPoint> {
        let current = *self.rows.get(self.pos)?;
        let previous = self.pos.checked_sub(1).map(|i| self.rows[i]);
        self.pos += 1;
        Some(GrowthPoint::between(current, previous))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.rows.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GrowthIter<'_, '_> {}

/// Growth of every row in `view`, or of the last `window` rows only.
///
/// A window that starts after the first row still differences its first
/// point against the row just before the window. A window larger than the
/// view covers the whole view.
pub fn growth_series<'a>(view: &PeriodView<'a>, window: Option<usize>) -> Result<GrowthSeries<'a>> {
    view.require_history(2)?;
    let len = view.len();
    let shown = window.map_or(len, |w| w.min(len));
    Ok(GrowthSeries {
        rows: view.rows().to_vec(),
        start: len - shown,
    })
}

/// Growth of the rows belonging to one fiscal year, differenced against the
/// whole view.
pub fn fiscal_year_growth(view: &PeriodView<'_>, fiscal_year: &str) -> Result<Vec<GrowthPoint>> {
    Ok(growth_series(view, None)?
        .iter()
        .filter(|p| p.fiscal_year == fiscal_year)
        .collect())
}

// ── Percent growth ────────────────────────────────────────────────────────────

/// Which row a filtered percent-growth point is compared with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaselinePolicy {
    /// The preceding row of the unfiltered view, even when that row belongs
    /// to a fiscal year that is not selected. Reported figures use this.
    #[default]
    UnfilteredPredecessor,
    /// The preceding selected row; the first selected row reports zero.
    WithinSelection,
}

impl FromStr for BaselinePolicy {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unfiltered" | "unfiltered-predecessor" => Ok(BaselinePolicy::UnfilteredPredecessor),
            "within-selection" => Ok(BaselinePolicy::WithinSelection),
            other => Err(DashboardError::Config(format!(
                "unknown baseline policy '{other}'"
            ))),
        }
    }
}

impl fmt::Display for BaselinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaselinePolicy::UnfilteredPredecessor => f.write_str("unfiltered predecessor"),
            BaselinePolicy::WithinSelection => f.write_str("within selection"),
        }
    }
}

/// Percent change of one row against its baseline row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentGrowthPoint {
    pub label: String,
    pub month: String,
    pub fiscal_year: String,
    pub deposits_pct: f64,
    pub lending_pct: f64,
}

impl PercentGrowthPoint {
    fn between(current: &PeriodSummary, previous: Option<&PeriodSummary>) -> Self {
        let (deposits_pct, lending_pct) = match previous {
            Some(p) => (
                percent_change(p.deposits_total, current.deposits_total),
                percent_change(p.lending_total, current.lending_total),
            ),
            None => (0.0, 0.0),
        };
        Self {
            label: current.description.clone(),
            month: current.month.clone(),
            fiscal_year: current.fiscal_year.clone(),
            deposits_pct,
            lending_pct,
        }
    }
}

/// Percent growth of the rows whose fiscal year is in `fiscal_years`.
///
/// A row without a baseline, or whose baseline total is zero, reports `0`.
pub fn percent_growth_series(
    view: &PeriodView<'_>,
    fiscal_years: &[String],
    policy: BaselinePolicy,
) -> Result<Vec<PercentGrowthPoint>> {
    view.require_history(2)?;
    let selected = |s: &PeriodSummary| fiscal_years.iter().any(|fy| *fy == s.fiscal_year);

    let rows: Vec<&PeriodSummary> = match policy {
        BaselinePolicy::UnfilteredPredecessor => view.rows().to_vec(),
        BaselinePolicy::WithinSelection => view.iter().filter(|s| selected(s)).collect(),
    };

    Ok(rows
        .iter()
        .enumerate()
        .filter(|(_, s)| selected(s))
        .map(|(i, s)| {
            let previous = i.checked_sub(1).map(|j| rows[j]);
            PercentGrowthPoint::between(s, previous)
        })
        .collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
