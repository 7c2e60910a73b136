//! Page models.
//!
//! Each page of the dashboard is built from a loaded [`Dataset`] and the
//! user's [`PageOptions`] into a plain serializable struct that the
//! presentation layer renders as a table or JSON. Sections that need more
//! history than the dataset holds are left empty and explained in the page's
//! `notices` instead of failing the whole page.

use std::str::FromStr;

use dl_core::error::{DashboardError, Result};
use dl_core::models::{PeriodSelector, PeriodSummary, PeriodView, ViewKind};
use dl_core::settings::Settings;
use dl_data::analysis::Dataset;
use dl_data::bankwise::{self, BankRow, BankTrendPoint};
use dl_data::cd_ratio::{self, CdRatioPoint, CdRatioRow, LatestCdRatio};
use dl_data::comparison::{self, PeriodDelta, RangeComparison, TrendPoint};
use dl_data::growth::{self, BaselinePolicy, GrowthPoint, PercentGrowthPoint};
use serde::Serialize;

// ── Page ──────────────────────────────────────────────────────────────────────

/// The pages of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Home,
    Search,
    Weekly,
    Monthly,
    Bankwise,
    CdRatio,
}

impl FromStr for Page {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "home" => Ok(Page::Home),
            "search" => Ok(Page::Search),
            "weekly" => Ok(Page::Weekly),
            "monthly" => Ok(Page::Monthly),
            "bankwise" => Ok(Page::Bankwise),
            "cd-ratio" => Ok(Page::CdRatio),
            other => Err(DashboardError::Config(format!("unknown page '{other}'"))),
        }
    }
}

// ── PageOptions ───────────────────────────────────────────────────────────────

/// User selections shared by all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOptions {
    pub query: String,
    /// Trailing window of the weekly growth chart.
    pub weeks: usize,
    pub fiscal_years: Vec<String>,
    pub banks: Vec<String>,
    pub from: Option<PeriodSelector>,
    pub to: Option<PeriodSelector>,
    pub cd_view: ViewKind,
    pub baseline: BaselinePolicy,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            weeks: 5,
            fiscal_years: Vec::new(),
            banks: Vec::new(),
            from: None,
            to: None,
            cd_view: ViewKind::MonthEnd,
            baseline: BaselinePolicy::default(),
        }
    }
}

impl PageOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let cd_view = match settings.cd_view.as_str() {
            "monthly" => ViewKind::MonthEnd,
            "weekly" => ViewKind::Weekly,
            other => {
                return Err(DashboardError::Config(format!(
                    "unknown CD ratio view '{other}'"
                )))
            }
        };
        Ok(Self {
            query: settings.query.clone().unwrap_or_default(),
            weeks: settings.weeks as usize,
            fiscal_years: settings.fiscal_years.clone(),
            banks: settings.banks.clone(),
            from: settings.from.clone(),
            to: settings.to.clone(),
            cd_view,
            baseline: settings.baseline.parse()?,
        })
    }
}

// ── Page models ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomePage {
    pub latest: PeriodSummary,
    pub previous_description: Option<String>,
    pub deltas: Option<PeriodDelta>,
    pub comparison: RangeComparison,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub matches: Vec<PeriodSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPage {
    pub window: usize,
    /// The last `window` weeks, for the growth chart.
    pub recent: Vec<GrowthPoint>,
    /// Every week with its growth.
    pub history: Vec<GrowthPoint>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPage {
    pub trend: Vec<TrendPoint>,
    /// Fiscal year of the amount-growth chart.
    pub fiscal_year: Option<String>,
    pub amount_growth: Vec<GrowthPoint>,
    pub percent_fiscal_years: Vec<String>,
    pub baseline: BaselinePolicy,
    pub percent_growth: Vec<PercentGrowthPoint>,
    pub notices: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankwisePage {
    /// `(year, month)` of the snapshot table.
    pub snapshot_period: (i32, String),
    pub snapshot: Vec<BankRow>,
    pub banks: Vec<String>,
    pub trend: Vec<BankTrendPoint>,
    pub history_bank: Option<String>,
    pub history: Vec<BankRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CdRatioPage {
    pub view: ViewKind,
    pub latest: LatestCdRatio,
    pub table: Vec<CdRatioRow>,
    pub fiscal_year: Option<String>,
    pub series: Vec<CdRatioPoint>,
}

/// A built page, tagged by kind when serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "kebab-case")]
pub enum PageReport {
    Home(HomePage),
    Search(SearchPage),
    Weekly(WeeklyPage),
    Monthly(MonthlyPage),
    Bankwise(BankwisePage),
    CdRatio(CdRatioPage),
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Build `page` from `dataset`.
pub fn build_page(page: Page, dataset: &Dataset, options: &PageOptions) -> Result<PageReport> {
    tracing::debug!(?page, "building page");
    Ok(match page {
        Page::Home => PageReport::Home(home_page(dataset, options)?),
        Page::Search => PageReport::Search(search_page(dataset, options)),
        Page::Weekly => PageReport::Weekly(weekly_page(dataset, options)?),
        Page::Monthly => PageReport::Monthly(monthly_page(dataset, options)?),
        Page::Bankwise => PageReport::Bankwise(bankwise_page(dataset, options)?),
        Page::CdRatio => PageReport::CdRatio(cd_ratio_page(dataset, options)?),
    })
}

pub fn home_page(dataset: &Dataset, options: &PageOptions) -> Result<HomePage> {
    let summaries = dataset.summaries();
    let latest = comparison::latest_summary(summaries)?.clone();
    let mut notices = Vec::new();

    let metrics = degrade(comparison::home_metrics(summaries), &mut notices)?;

    // The comparison defaults to the whole dataset, first period to last.
    let first = summaries.first().ok_or(DashboardError::EmptyDataset)?;
    let from = options.from.clone().unwrap_or_else(|| exact_selector(first));
    let to = options.to.clone().unwrap_or_else(|| exact_selector(&latest));
    let range = comparison::compare_range(summaries, &from, &to)?;

    Ok(HomePage {
        previous_description: metrics.as_ref().map(|m| m.previous_description.clone()),
        deltas: metrics.map(|m| m.deltas),
        latest,
        comparison: range,
        notices,
    })
}

pub fn search_page(dataset: &Dataset, options: &PageOptions) -> SearchPage {
    SearchPage {
        query: options.query.clone(),
        matches: dl_data::search::search(dataset.summaries(), &options.query)
            .into_iter()
            .cloned()
            .collect(),
    }
}

pub fn weekly_page(dataset: &Dataset, options: &PageOptions) -> Result<WeeklyPage> {
    let view = dataset.weekly();
    let mut notices = Vec::new();

    let recent: Vec<GrowthPoint> =
        degrade(growth::growth_series(&view, Some(options.weeks)), &mut notices)?
        .map(|s| s.iter().collect())
        .unwrap_or_default();
    let history: Vec<GrowthPoint> = degrade(growth::growth_series(&view, None), &mut notices)?
        .map(|s| s.iter().collect())
        .unwrap_or_default();
    // Both series fail on the same short history; report it once.
    notices.dedup();

    Ok(WeeklyPage {
        window: options.weeks,
        recent,
        history,
        notices,
    })
}

pub fn monthly_page(dataset: &Dataset, options: &PageOptions) -> Result<MonthlyPage> {
    let view = dataset.month_end();
    let mut notices = Vec::new();

    let trend = match (view.rows().first(), view.last()) {
        (Some(first), Some(last)) => {
            let from = options.from.clone().unwrap_or_else(|| month_selector(first));
            let to = options.to.clone().unwrap_or_else(|| month_selector(last));
            comparison::trend_between(&view, &from, &to)?
        }
        _ => {
            notices.push(
                DashboardError::InsufficientHistory {
                    view: view.kind().to_string(),
                    required: 1,
                    available: 0,
                }
                .to_string(),
            );
            Vec::new()
        }
    };

    let fiscal_year = options
        .fiscal_years
        .last()
        .cloned()
        .or_else(|| cd_ratio::default_fiscal_year(&view));
    let amount_growth = match &fiscal_year {
        Some(fy) => degrade(growth::fiscal_year_growth(&view, fy), &mut notices)?.unwrap_or_default(),
        None => Vec::new(),
    };

    let percent_fiscal_years = selected_fiscal_years(options, &view);
    let percent_growth = degrade(
        growth::percent_growth_series(&view, &percent_fiscal_years, options.baseline),
        &mut notices,
    )?
    .unwrap_or_default();
    notices.dedup();

    Ok(MonthlyPage {
        trend,
        fiscal_year,
        amount_growth,
        percent_fiscal_years,
        baseline: options.baseline,
        percent_growth,
        notices,
    })
}

pub fn bankwise_page(dataset: &Dataset, options: &PageOptions) -> Result<BankwisePage> {
    let records = dataset.records();
    let (year, month) = bankwise::latest_month_end(records)?;
    let snapshot = bankwise::month_end_snapshot(records, year, &month);

    let banks = if options.banks.is_empty() {
        bankwise::bank_names(records).into_iter().take(1).collect()
    } else {
        options.banks.clone()
    };

    let view = dataset.month_end();
    let trend = match (view.rows().first(), view.last()) {
        (Some(first), Some(last)) => {
            let from = options.from.clone().unwrap_or_else(|| month_selector(first));
            let to = options.to.clone().unwrap_or_else(|| month_selector(last));
            bankwise::bank_trend(records, &banks, &from, &to)?
        }
        _ => Vec::new(),
    };

    let history_bank = banks.first().cloned();
    let history = history_bank
        .as_deref()
        .map(|bank| bankwise::bank_history(records, bank))
        .unwrap_or_default();

    Ok(BankwisePage {
        snapshot_period: (year, month),
        snapshot,
        banks,
        trend,
        history_bank,
        history,
    })
}

pub fn cd_ratio_page(dataset: &Dataset, options: &PageOptions) -> Result<CdRatioPage> {
    let view = dataset.aggregated().view(options.cd_view);
    let latest = cd_ratio::latest_cd_ratio(dataset.summaries())?;
    let fiscal_year = options
        .fiscal_years
        .last()
        .cloned()
        .or_else(|| cd_ratio::default_fiscal_year(&view));
    let series = fiscal_year
        .as_deref()
        .map(|fy| cd_ratio::cd_ratio_series(&view, fy))
        .unwrap_or_default();

    Ok(CdRatioPage {
        view: options.cd_view,
        latest,
        table: cd_ratio::cd_ratio_table(&view),
        fiscal_year,
        series,
    })
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Turn a too-short-history error into a notice; pass anything else through.
fn degrade<T>(result: Result<T>, notices: &mut Vec<String>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_degradable() => {
            tracing::debug!(error = %e, "section degraded");
            notices.push(e.to_string());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn exact_selector(summary: &PeriodSummary) -> PeriodSelector {
    PeriodSelector::new(summary.year, summary.month.clone(), Some(summary.week.clone()))
}

fn month_selector(summary: &PeriodSummary) -> PeriodSelector {
    PeriodSelector::new(summary.year, summary.month.clone(), None)
}

/// The fiscal years chosen by the user, or the most recent one.
fn selected_fiscal_years(options: &PageOptions, view: &PeriodView<'_>) -> Vec<String> {
    if !options.fiscal_years.is_empty() {
        return options.fiscal_years.clone();
    }
    cd_ratio::default_fiscal_year(view).into_iter().collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dl_core::models::{RawRecord, RecordType};
    use dl_data::aggregator::GroupingPolicy;
    use dl_data::analysis::build_dataset;
    use std::path::PathBuf;

    fn record(
        bank: &str,
        fy: &str,
        month: &str,
        week: &str,
        date: (i32, u32, u32),
        deposits: f64,
        lending: f64,
    ) -> RawRecord {
        RawRecord {
            bank_name: bank.to_string(),
            report_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            local_date: String::new(),
            fiscal_year: fy.to_string(),
            year: 2081,
            month: month.to_string(),
            week: week.to_string(),
            record_type: if week == "End" {
                RecordType::End
            } else {
                RecordType::Week
            },
            deposits_local_currency: deposits,
            deposits_foreign_currency: 0.0,
            lending_local_currency: lending,
            lending_foreign_currency: 0.0,
            credit_deposit_ratio_raw: lending / deposits,
        }
    }

    fn dataset(records: Vec<RawRecord>) -> Dataset {
        build_dataset(records, GroupingPolicy::FirstWins, PathBuf::from("memory"), 1).unwrap()
    }

    fn full_dataset() -> Dataset {
        dataset(vec![
            record("Bank A", "2080/81", "Asar", "End", (2024, 7, 15), 100.0, 80.0),
            record("Bank B", "2080/81", "Asar", "End", (2024, 7, 15), 50.0, 40.0),
            record("Bank A", "2081/82", "Shrawan", "1st Week", (2024, 7, 22), 102.0, 81.0),
            record("Bank A", "2081/82", "Shrawan", "2nd Week", (2024, 7, 29), 104.0, 82.0),
            record("Bank A", "2081/82", "Shrawan", "End", (2024, 8, 15), 110.0, 85.0),
            record("Bank B", "2081/82", "Shrawan", "End", (2024, 8, 15), 55.0, 41.0),
        ])
    }

    // ── Page / PageOptions ────────────────────────────────────────────────────

    #[test]
    fn test_page_from_str() {
        assert_eq!("cd-ratio".parse::<Page>().unwrap(), Page::CdRatio);
        assert_eq!("home".parse::<Page>().unwrap(), Page::Home);
        assert!("settings".parse::<Page>().is_err());
    }

    #[test]
    fn test_options_from_settings() {
        use clap::Parser;

        let settings = Settings::parse_from([
            "dl-dashboard",
            "--cd-view",
            "weekly",
            "--baseline",
            "within-selection",
            "--weeks",
            "3",
            "--from",
            "2081 Shrawan",
        ]);
        let options = PageOptions::from_settings(&settings).unwrap();
        assert_eq!(options.cd_view, ViewKind::Weekly);
        assert_eq!(options.baseline, BaselinePolicy::WithinSelection);
        assert_eq!(options.weeks, 3);
        assert_eq!(options.from, Some(PeriodSelector::new(2081, "Shrawan", None)));
        assert!(options.query.is_empty());
    }

    // ── Home ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_home_page_latest_and_deltas() {
        let ds = full_dataset();
        let page = home_page(&ds, &PageOptions::default()).unwrap();

        assert_eq!(page.latest.description, "2081 Shrawan End");
        assert_eq!(page.latest.deposits_total, 165.0);
        assert_eq!(page.previous_description.as_deref(), Some("2081 Shrawan 2nd Week"));
        assert_eq!(page.deltas.unwrap().deposits_total, 61.0);
        assert!(page.notices.is_empty());

        let cmp = page.comparison;
        assert_eq!(cmp.from_description, "2081 Asar End");
        assert_eq!(cmp.deposits.start, 150.0);
        assert_eq!(cmp.deposits.end, 165.0);
    }

    #[test]
    fn test_home_page_single_period_degrades() {
        let ds = dataset(vec![record("Bank A", "2080/81", "Asar", "End", (2024, 7, 15), 100.0, 80.0)]);
        let page = home_page(&ds, &PageOptions::default()).unwrap();

        assert!(page.deltas.is_none());
        assert!(page.previous_description.is_none());
        assert_eq!(page.notices.len(), 1);
        assert_eq!(page.latest.deposits_total, 100.0);
    }

    #[test]
    fn test_home_page_unknown_selector_fails() {
        let ds = full_dataset();
        let options = PageOptions {
            from: Some(PeriodSelector::new(2070, "Magh", None)),
            ..PageOptions::default()
        };
        assert!(matches!(
            home_page(&ds, &options),
            Err(DashboardError::UnknownPeriod(_))
        ));
    }

    // ── Search ────────────────────────────────────────────────────────────────

    #[test]
    fn test_search_page() {
        let ds = full_dataset();
        let options = PageOptions {
            query: "shrawan".to_string(),
            ..PageOptions::default()
        };
        let page = search_page(&ds, &options);
        assert_eq!(page.matches.len(), 3);
    }

    // ── Weekly ────────────────────────────────────────────────────────────────

    #[test]
    fn test_weekly_page_window() {
        let ds = full_dataset();
        let options = PageOptions {
            weeks: 1,
            ..PageOptions::default()
        };
        let page = weekly_page(&ds, &options).unwrap();

        assert_eq!(page.recent.len(), 1);
        assert_eq!(page.recent[0].deposits_delta, Some(2.0));
        assert_eq!(page.history.len(), 2);
        assert_eq!(page.history[0].deposits_delta, None);
    }

    #[test]
    fn test_weekly_page_without_weeks_degrades() {
        let ds = dataset(vec![record("Bank A", "2080/81", "Asar", "End", (2024, 7, 15), 100.0, 80.0)]);
        let page = weekly_page(&ds, &PageOptions::default()).unwrap();
        assert!(page.recent.is_empty());
        assert!(page.history.is_empty());
        assert_eq!(page.notices.len(), 1);
    }

    #[test]
    fn test_weekly_page_single_week_reports_one_notice() {
        let ds = dataset(vec![
            record("Bank A", "2081/82", "Shrawan", "1st Week", (2024, 7, 22), 102.0, 81.0),
            record("Bank B", "2081/82", "Shrawan", "1st Week", (2024, 7, 22), 50.0, 40.0),
        ]);
        let page = weekly_page(&ds, &PageOptions::default()).unwrap();

        assert!(page.recent.is_empty());
        assert!(page.history.is_empty());
        assert_eq!(page.notices.len(), 1);
        assert!(page.notices[0].contains("need at least 2"), "{:?}", page.notices);
    }

    // ── Monthly ───────────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_page_defaults_to_latest_fiscal_year() {
        let ds = full_dataset();
        let page = monthly_page(&ds, &PageOptions::default()).unwrap();

        assert_eq!(page.trend.len(), 2);
        assert_eq!(page.trend[0].label, "2081-Asar");
        assert_eq!(page.fiscal_year.as_deref(), Some("2081/82"));
        assert_eq!(page.amount_growth.len(), 1);
        assert_eq!(page.amount_growth[0].deposits_delta, Some(15.0));
        assert_eq!(page.percent_fiscal_years, vec!["2081/82"]);
        assert!((page.percent_growth[0].deposits_pct - 10.0).abs() < 1e-9);
        assert!(page.notices.is_empty());
    }

    // ── Bankwise ──────────────────────────────────────────────────────────────

    #[test]
    fn test_bankwise_page_defaults() {
        let ds = full_dataset();
        let page = bankwise_page(&ds, &PageOptions::default()).unwrap();

        assert_eq!(page.snapshot_period, (2081, "Shrawan".to_string()));
        assert_eq!(page.snapshot.len(), 2);
        assert_eq!(page.banks, vec!["Bank A"]);
        assert_eq!(page.trend.len(), 2);
        assert_eq!(page.history_bank.as_deref(), Some("Bank A"));
        assert_eq!(page.history.len(), 2);
    }

    // ── CD ratio ──────────────────────────────────────────────────────────────

    #[test]
    fn test_cd_ratio_page_monthly() {
        let ds = full_dataset();
        let page = cd_ratio_page(&ds, &PageOptions::default()).unwrap();

        assert_eq!(page.view, ViewKind::MonthEnd);
        assert_eq!(page.table.len(), 2);
        assert_eq!(page.table[0].month, "Shrawan");
        assert_eq!(page.fiscal_year.as_deref(), Some("2081/82"));
        assert_eq!(page.series.len(), 1);
        assert_eq!(page.series[0].label, "Shrawan");
    }

    #[test]
    fn test_build_page_serializes_with_tag() {
        let ds = full_dataset();
        let report = build_page(Page::CdRatio, &ds, &PageOptions::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["page"], "cd-ratio");
        assert_eq!(json["view"], "month_end");
    }
}
