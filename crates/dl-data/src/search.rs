//! Free-text search over period summaries.

use dl_core::formatting::format_long_date;
use dl_core::models::PeriodSummary;

/// The string renderings a query is matched against.
fn searchable_fields(summary: &PeriodSummary) -> [String; 7] {
    [
        summary.description.clone(),
        summary.year.to_string(),
        summary.month.clone(),
        summary.fiscal_year.clone(),
        summary.report_date.format("%Y-%m-%d").to_string(),
        summary.local_date.clone(),
        format_long_date(summary.report_date),
    ]
}

/// Whether any searchable field of `summary` contains `needle`, which must
/// already be lower-cased.
fn matches(summary: &PeriodSummary, needle: &str) -> bool {
    searchable_fields(summary)
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Summaries with at least one field containing `query`, case-insensitively,
/// in their original order. An empty query matches every summary.
pub fn search<'a>(summaries: &'a [PeriodSummary], query: &str) -> Vec<&'a PeriodSummary> {
    let needle = query.trim().to_lowercase();
    summaries.iter().filter(|s| matches(s, &needle)).collect()
}
