use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DashboardError, Result};

/// Factor applied to the raw credit-to-deposit fraction to express it as a
/// percentage.
pub const RATIO_SCALE: f64 = 100.0;

/// Whether a row is a month-end snapshot or an intra-month weekly snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Month-end snapshot.
    End,
    /// Intra-month weekly snapshot.
    Week,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::End => f.write_str("End"),
            RecordType::Week => f.write_str("Week"),
        }
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "end" => Ok(RecordType::End),
            "week" => Ok(RecordType::Week),
            other => Err(format!("unknown record type '{other}'")),
        }
    }
}

/// One bank's figures for one reporting period, as read from the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Reporting bank.
    pub bank_name: String,
    /// Gregorian reporting date.
    pub report_date: NaiveDate,
    /// Same date in the local (Bikram Sambat) calendar, e.g. `"3/7/2081"`.
    pub local_date: String,
    /// Fiscal-year label, e.g. `"2081/82"`.
    pub fiscal_year: String,
    /// Local-calendar year.
    pub year: i32,
    /// Month label, e.g. `"Baisakh"`.
    pub month: String,
    /// Week label, e.g. `"1st Week"` or `"End"`.
    pub week: String,
    pub record_type: RecordType,
    pub deposits_local_currency: f64,
    pub deposits_foreign_currency: f64,
    pub lending_local_currency: f64,
    pub lending_foreign_currency: f64,
    /// Credit-to-deposit ratio as a fraction (0.85 means 85 %).
    pub credit_deposit_ratio_raw: f64,
}

impl RawRecord {
    /// The `(year, month, week)` grouping key of this row.
    pub fn period_key(&self) -> PeriodKey {
        PeriodKey::new(self.year, &self.month, &self.week)
    }

    /// Local plus foreign currency deposits.
    pub fn deposits_total(&self) -> f64 {
        self.deposits_local_currency + self.deposits_foreign_currency
    }

    /// Local plus foreign currency lending.
    pub fn lending_total(&self) -> f64 {
        self.lending_local_currency + self.lending_foreign_currency
    }

    /// Credit-to-deposit ratio on the percentage scale.
    pub fn credit_deposit_ratio_pct(&self) -> f64 {
        self.credit_deposit_ratio_raw * RATIO_SCALE
    }
}

/// Identifies one reporting snapshot.
///
/// Ordering is year first, then the month and week labels as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: String,
    pub week: String,
}

impl PeriodKey {
    pub fn new(year: i32, month: impl Into<String>, week: impl Into<String>) -> Self {
        Self {
            year,
            month: month.into(),
            week: week.into(),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.year, self.month, self.week)
    }
}

/// Aggregate of every bank row sharing one `(year, month, week)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub year: i32,
    pub month: String,
    pub week: String,
    /// Representative value taken from the first row of the group.
    pub fiscal_year: String,
    /// Representative value taken from the first row of the group.
    pub report_date: NaiveDate,
    /// Representative value taken from the first row of the group.
    pub local_date: String,
    /// Representative value taken from the first row of the group.
    pub record_type: RecordType,
    pub deposits_local_total: f64,
    pub deposits_foreign_total: f64,
    pub deposits_total: f64,
    pub lending_local_total: f64,
    pub lending_foreign_total: f64,
    pub lending_total: f64,
    /// Mean of the member rows' ratios, in percent.
    pub credit_deposit_ratio: f64,
    /// `"{year} {month} {week}"`.
    pub description: String,
    /// Number of bank rows folded into this summary.
    pub bank_count: usize,
}

impl PeriodSummary {
    pub fn period_key(&self) -> PeriodKey {
        PeriodKey::new(self.year, &self.month, &self.week)
    }

    /// `"{year}-{month}"`, the x-axis label used by monthly charts.
    pub fn year_month_label(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }
}

/// Anything labelled with a reporting period, so range selection works the
/// same over raw rows and summaries.
pub trait PeriodLike {
    fn year(&self) -> i32;
    fn month(&self) -> &str;
    fn week(&self) -> &str;
}

impl PeriodLike for RawRecord {
    fn year(&self) -> i32 {
        self.year
    }

    fn month(&self) -> &str {
        &self.month
    }

    fn week(&self) -> &str {
        &self.week
    }
}

impl PeriodLike for PeriodSummary {
    fn year(&self) -> i32 {
        self.year
    }

    fn month(&self) -> &str {
        &self.month
    }

    fn week(&self) -> &str {
        &self.week
    }
}

impl<T: PeriodLike + ?Sized> PeriodLike for &T {
    fn year(&self) -> i32 {
        (**self).year()
    }

    fn month(&self) -> &str {
        (**self).month()
    }

    fn week(&self) -> &str {
        (**self).week()
    }
}

// ── Views ────────────────────────────────────────────────────────────────────

/// Which partition of the summary sequence a view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    MonthEnd,
    Weekly,
}

impl ViewKind {
    /// The record type whose rows belong to this view.
    pub fn record_type(self) -> RecordType {
        match self {
            ViewKind::MonthEnd => RecordType::End,
            ViewKind::Weekly => RecordType::Week,
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::MonthEnd => f.write_str("month-end"),
            ViewKind::Weekly => f.write_str("weekly"),
        }
    }
}

/// A borrowed, date-ordered subset of the period summaries.
#[derive(Debug, Clone)]
pub struct PeriodView<'a> {
    kind: ViewKind,
    rows: Vec<&'a PeriodSummary>,
}

impl<'a> PeriodView<'a> {
    /// Select the rows of `summaries` whose record type matches `kind`,
    /// keeping their order.
    pub fn from_summaries(kind: ViewKind, summaries: &'a [PeriodSummary]) -> Self {
        let wanted = kind.record_type();
        Self {
            kind,
            rows: summaries
                .iter()
                .filter(|s| s.record_type == wanted)
                .collect(),
        }
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn rows(&self) -> &[&'a PeriodSummary] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a PeriodSummary> + '_ {
        self.rows.iter().copied()
    }

    pub fn last(&self) -> Option<&'a PeriodSummary> {
        self.rows.last().copied()
    }

    /// Fail with [`DashboardError::InsufficientHistory`] unless the view holds
    /// at least `required` rows.
    pub fn require_history(&self, required: usize) -> Result<()> {
        if self.rows.len() < required {
            return Err(DashboardError::InsufficientHistory {
                view: self.kind.to_string(),
                required,
                available: self.rows.len(),
            });
        }
        Ok(())
    }
}

// ── PeriodSelector ───────────────────────────────────────────────────────────

/// A range endpoint: a year and month, optionally narrowed to one week label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSelector {
    pub year: i32,
    pub month: String,
    pub week: Option<String>,
}

impl PeriodSelector {
    pub fn new(year: i32, month: impl Into<String>, week: Option<String>) -> Self {
        Self {
            year,
            month: month.into(),
            week,
        }
    }

    /// Whether the `(year, month, week)` triple falls under this selector.
    pub fn matches(&self, year: i32, month: &str, week: &str) -> bool {
        self.year == year
            && self.month == month
            && self.week.as_deref().map_or(true, |w| w == week)
    }

    /// Whether `item`'s period falls under this selector.
    pub fn selects<T: PeriodLike + ?Sized>(&self, item: &T) -> bool {
        self.matches(item.year(), item.month(), item.week())
    }
}

/// Index range from the first item matching `from` to the last item matching
/// `to`, inclusive.
pub fn select_range<T: PeriodLike>(
    items: &[T],
    from: &PeriodSelector,
    to: &PeriodSelector,
) -> Result<std::ops::RangeInclusive<usize>> {
    let start = items
        .iter()
        .position(|item| from.selects(item))
        .ok_or_else(|| DashboardError::UnknownPeriod(from.to_string()))?;
    let end = items
        .iter()
        .rposition(|item| to.selects(item))
        .ok_or_else(|| DashboardError::UnknownPeriod(to.to_string()))?;
    if end < start {
        return Err(DashboardError::InvalidRange {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(start..=end)
}

impl fmt::Display for PeriodSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.week {
            Some(week) => write!(f, "{} {} {}", self.year, self.month, week),
            None => write!(f, "{} {}", self.year, self.month),
        }
    }
}

impl FromStr for PeriodSelector {
    type Err = DashboardError;

    /// Parse `"YEAR MONTH [WEEK...]"`, e.g. `"2081 Baisakh"` or
    /// `"2081 Shrawan 3rd Week"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let year = parts
            .next()
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(|| DashboardError::Config(format!("period '{s}' must start with a year")))?;
        let month = parts
            .next()
            .ok_or_else(|| DashboardError::Config(format!("period '{s}' is missing a month")))?;
        let rest: Vec<&str> = parts.collect();
        let week = if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        };
        Ok(Self::new(year, month, week))
    }
}
