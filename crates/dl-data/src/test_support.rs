//! Row builders shared by the unit tests of this crate.

use chrono::NaiveDate;
use dl_core::models::{PeriodSummary, RawRecord, RecordType};

#[allow(clippy::too_many_arguments)]
pub(crate) fn record(
    bank: &str,
    year: i32,
    month: &str,
    week: &str,
    record_type: RecordType,
    date: (i32, u32, u32),
    deposits: (f64, f64),
    lending: (f64, f64),
    cd_raw: f64,
) -> RawRecord {
    RawRecord {
        bank_name: bank.to_string(),
        report_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        local_date: String::new(),
        fiscal_year: "2080/81".to_string(),
        year,
        month: month.to_string(),
        week: week.to_string(),
        record_type,
        deposits_local_currency: deposits.0,
        deposits_foreign_currency: deposits.1,
        lending_local_currency: lending.0,
        lending_foreign_currency: lending.1,
        credit_deposit_ratio_raw: cd_raw,
    }
}

/// A summary whose totals are given directly; components are put entirely on
/// the local-currency side.
pub(crate) fn summary(
    fiscal_year: &str,
    month: &str,
    week: &str,
    day: u32,
    deposits_total: f64,
    lending_total: f64,
) -> PeriodSummary {
    let record_type = if week == "End" {
        RecordType::End
    } else {
        RecordType::Week
    };
    PeriodSummary {
        year: 2081,
        month: month.to_string(),
        week: week.to_string(),
        fiscal_year: fiscal_year.to_string(),
        report_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(day)),
        local_date: format!("{day}/1/2081"),
        record_type,
        deposits_local_total: deposits_total,
        deposits_foreign_total: 0.0,
        deposits_total,
        lending_local_total: lending_total,
        lending_foreign_total: 0.0,
        lending_total,
        credit_deposit_ratio: if deposits_total == 0.0 {
            0.0
        } else {
            lending_total / deposits_total * 100.0
        },
        description: format!("2081 {month} {week}"),
        bank_count: 1,
    }
}
