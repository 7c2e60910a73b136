//! Period aggregation: folds per-bank rows into one summary per
//! `(year, month, week)` and partitions the result into month-end and weekly
//! views.

use std::collections::BTreeMap;

use dl_core::error::{DashboardError, Result};
use dl_core::models::{PeriodKey, PeriodSummary, PeriodView, RawRecord, ViewKind};
use tracing::{debug, warn};

// ── GroupingPolicy ────────────────────────────────────────────────────────────

/// What to do when rows sharing a period key disagree on record type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupingPolicy {
    /// Keep the first row's type and log the conflict.
    #[default]
    FirstWins,
    /// Fail with [`DashboardError::AmbiguousGrouping`].
    Strict,
}

// ── AmountTotals ──────────────────────────────────────────────────────────────

/// Running sums for one period group.
#[derive(Debug, Clone, Default)]
pub struct AmountTotals {
    pub deposits_local: f64,
    pub deposits_foreign: f64,
    pub lending_local: f64,
    pub lending_foreign: f64,
    /// Sum of the rows' ratios, already scaled to percent.
    pub ratio_pct_sum: f64,
    pub count: usize,
}

impl AmountTotals {
    /// Add a single row's figures to the running totals.
    pub fn add_record(&mut self, record: &RawRecord) {
        self.deposits_local += record.deposits_local_currency;
        self.deposits_foreign += record.deposits_foreign_currency;
        self.lending_local += record.lending_local_currency;
        self.lending_foreign += record.lending_foreign_currency;
        self.ratio_pct_sum += record.credit_deposit_ratio_pct();
        self.count += 1;
    }

    /// Mean ratio in percent; zero for an empty group.
    pub fn mean_ratio_pct(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.ratio_pct_sum / self.count as f64
    }
}

// ── PeriodGroup ───────────────────────────────────────────────────────────────

/// All rows of one period key, represented by the first row encountered.
struct PeriodGroup<'a> {
    first: &'a RawRecord,
    totals: AmountTotals,
}

impl<'a> PeriodGroup<'a> {
    fn new(first: &'a RawRecord) -> Self {
        Self {
            first,
            totals: AmountTotals::default(),
        }
    }

    fn add_record(&mut self, record: &'a RawRecord, policy: GroupingPolicy) -> Result<()> {
        if record.record_type != self.first.record_type {
            let key = record.period_key().to_string();
            match policy {
                GroupingPolicy::Strict => {
                    return Err(DashboardError::AmbiguousGrouping {
                        key,
                        first: self.first.record_type,
                        conflicting: record.record_type,
                    });
                }
                GroupingPolicy::FirstWins => {
                    warn!(
                        "Period '{}' mixes record types ({} from {}, {} from {}); keeping {}",
                        key,
                        self.first.record_type,
                        self.first.bank_name,
                        record.record_type,
                        record.bank_name,
                        self.first.record_type,
                    );
                }
            }
        }
        self.totals.add_record(record);
        Ok(())
    }

    /// Totals are derived from the summed components here, never read from
    /// the source file.
    fn into_summary(self, key: PeriodKey) -> PeriodSummary {
        let t = &self.totals;
        let first = self.first;
        PeriodSummary {
            description: key.to_string(),
            year: key.year,
            month: key.month,
            week: key.week,
            fiscal_year: first.fiscal_year.clone(),
            report_date: first.report_date,
            local_date: first.local_date.clone(),
            record_type: first.record_type,
            deposits_local_total: t.deposits_local,
            deposits_foreign_total: t.deposits_foreign,
            deposits_total: t.deposits_local + t.deposits_foreign,
            lending_local_total: t.lending_local,
            lending_foreign_total: t.lending_foreign,
            lending_total: t.lending_local + t.lending_foreign,
            credit_deposit_ratio: t.mean_ratio_pct(),
            bank_count: t.count,
        }
    }
}

// ── AggregatedDataset ─────────────────────────────────────────────────────────

/// Period summaries sorted by report date, with borrowed month-end and weekly
/// views.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedDataset {
    summaries: Vec<PeriodSummary>,
}

impl AggregatedDataset {
    pub fn summaries(&self) -> &[PeriodSummary] {
        &self.summaries
    }

    pub fn view(&self, kind: ViewKind) -> PeriodView<'_> {
        PeriodView::from_summaries(kind, &self.summaries)
    }

    pub fn month_end(&self) -> PeriodView<'_> {
        self.view(ViewKind::MonthEnd)
    }

    pub fn weekly(&self) -> PeriodView<'_> {
        self.view(ViewKind::Weekly)
    }

    /// The summaries together with both views.
    pub fn split(&self) -> (&[PeriodSummary], PeriodView<'_>, PeriodView<'_>) {
        (&self.summaries, self.month_end(), self.weekly())
    }

    /// Most recent summary across both record types.
    pub fn latest(&self) -> Option<&PeriodSummary> {
        self.summaries.last()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

// ── PeriodAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that groups raw rows by reporting period.
pub struct PeriodAggregator;

impl PeriodAggregator {
    /// Group `records` by `(year, month, week)` and build one summary per
    /// group.
    ///
    /// Groups are formed in ascending key order and then stably sorted by
    /// report date, so rows with equal dates keep key order. Representative
    /// fields (fiscal year, dates, record type) come from the first row of the
    /// group in input order.
    pub fn load_and_aggregate(
        records: &[RawRecord],
        policy: GroupingPolicy,
    ) -> Result<AggregatedDataset> {
        if records.is_empty() {
            return Err(DashboardError::EmptyDataset);
        }

        let mut groups: BTreeMap<PeriodKey, PeriodGroup<'_>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.period_key())
                .or_insert_with(|| PeriodGroup::new(record))
                .add_record(record, policy)?;
        }

        let mut summaries: Vec<PeriodSummary> = groups
            .into_iter()
            .map(|(key, group)| group.into_summary(key))
            .collect();

        summaries.sort_by_key(|s| s.report_date);

        debug!(
            "Aggregated {} rows into {} periods",
            records.len(),
            summaries.len()
        );

        Ok(AggregatedDataset { summaries })
    }
}

/// Free-function form of [`PeriodAggregator::load_and_aggregate`].
pub fn load_and_aggregate(
    records: &[RawRecord],
    policy: GroupingPolicy,
) -> Result<AggregatedDataset> {
    PeriodAggregator::load_and_aggregate(records, policy)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
