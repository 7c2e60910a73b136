//! Plain-text rendering of page models.
//!
//! Every page becomes one or more titled tables. Column widths are measured
//! in terminal cells so wide characters line up with ASCII ones.

use std::fmt::Write as _;

use dl_core::formatting::{
    format_amount, format_delta, format_long_date, format_optional_delta, format_percent,
};
use dl_runtime::pages::{
    BankwisePage, CdRatioPage, HomePage, MonthlyPage, PageReport, SearchPage, WeeklyPage,
};
use unicode_width::UnicodeWidthStr;

// ── TextTable ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A titled table rendered with space-padded columns.
#[derive(Debug, Clone)]
pub struct TextTable {
    title: String,
    headers: Vec<&'static str>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    /// Columns whose header is listed in `headers`; the first `text_columns`
    /// are left-aligned and the rest right-aligned.
    pub fn new(title: impl Into<String>, headers: &[&'static str], text_columns: usize) -> Self {
        let align = (0..headers.len())
            .map(|i| if i < text_columns { Align::Left } else { Align::Right })
            .collect();
        Self {
            title: title.into(),
            headers: headers.to_vec(),
            align,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.width());
                }
            }
        }
        widths
    }

    fn write_row<S: AsRef<str>>(&self, out: &mut String, cells: &[S], widths: &[usize]) {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .zip(&self.align)
            .map(|((cell, &width), align)| pad(cell.as_ref(), width, *align))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.title);
        self.write_row(&mut out, &self.headers, &widths);
        let _ = writeln!(out, "{}", "─".repeat(total));
        if self.rows.is_empty() {
            let _ = writeln!(out, "(no rows)");
        }
        for row in &self.rows {
            self.write_row(&mut out, row, &widths);
        }
        out
    }
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    match align {
        Align::Left => format!("{text}{fill}"),
        Align::Right => format!("{fill}{text}"),
    }
}

// ── Pages ─────────────────────────────────────────────────────────────────────

/// Render any page as text.
pub fn render_page(report: &PageReport) -> String {
    match report {
        PageReport::Home(page) => render_home(page),
        PageReport::Search(page) => render_search(page),
        PageReport::Weekly(page) => render_weekly(page),
        PageReport::Monthly(page) => render_monthly(page),
        PageReport::Bankwise(page) => render_bankwise(page),
        PageReport::CdRatio(page) => render_cd_ratio(page),
    }
}

fn render_notices(out: &mut String, notices: &[String]) {
    for notice in notices {
        let _ = writeln!(out, "note: {notice}");
    }
}

fn render_home(page: &HomePage) -> String {
    let latest = &page.latest;
    let mut out = String::new();
    let _ = writeln!(out, "As of {} ({})\n", latest.description, latest.local_date);

    let mut metrics = TextTable::new("Latest figures", &["Metric", "Value", "Change"], 1);
    let deltas = page.deltas.as_ref();
    let fields = [
        ("Deposits LCY", latest.deposits_local_total, deltas.map(|d| d.deposits_local)),
        ("Deposits FCY", latest.deposits_foreign_total, deltas.map(|d| d.deposits_foreign)),
        ("Total Deposits", latest.deposits_total, deltas.map(|d| d.deposits_total)),
        ("Lending LCY", latest.lending_local_total, deltas.map(|d| d.lending_local)),
        ("Lending FCY", latest.lending_foreign_total, deltas.map(|d| d.lending_foreign)),
        ("Total Lending", latest.lending_total, deltas.map(|d| d.lending_total)),
    ];
    for (label, value, delta) in fields {
        metrics.push(vec![
            label.to_string(),
            format_amount(value),
            format_optional_delta(delta),
        ]);
    }
    out.push_str(&metrics.render());
    if let Some(previous) = &page.previous_description {
        let _ = writeln!(out, "Changes are against {previous}.");
    }
    render_notices(&mut out, &page.notices);

    let cmp = &page.comparison;
    let mut table = TextTable::new(
        format!(
            "\nComparison: {} to {} ({} periods)",
            cmp.from_description, cmp.to_description, cmp.periods
        ),
        &["Metric", "Start", "End", "Change", "Change %"],
        1,
    );
    for (label, m, is_ratio) in [
        ("Deposit", &cmp.deposits, false),
        ("Lending", &cmp.lending, false),
        ("CD", &cmp.credit_deposit_ratio, true),
    ] {
        let (start, end) = if is_ratio {
            (format_percent(m.start), format_percent(m.end))
        } else {
            (format_amount(m.start), format_amount(m.end))
        };
        table.push(vec![
            label.to_string(),
            start,
            end,
            format_delta(m.change),
            format_percent(m.percent),
        ]);
    }
    out.push_str(&table.render());
    out
}

fn render_search(page: &SearchPage) -> String {
    let mut table = TextTable::new(
        format!("Search results for '{}' ({} rows)", page.query, page.matches.len()),
        &[
            "FY", "Year", "Month", "Week", "English Date", "Nepali Date", "Total Deposit",
            "Total Lending", "CD Ratio",
        ],
        6,
    );
    for s in &page.matches {
        table.push(vec![
            s.fiscal_year.clone(),
            s.year.to_string(),
            s.month.clone(),
            s.week.clone(),
            format_long_date(s.report_date),
            s.local_date.clone(),
            format_amount(s.deposits_total),
            format_amount(s.lending_total),
            format_percent(s.credit_deposit_ratio),
        ]);
    }
    table.render()
}

fn render_weekly(page: &WeeklyPage) -> String {
    let headers = &["Period", "Total Deposit", "Total Lending", "Deposit Growth", "Lending Growth"];

    let mut recent = TextTable::new(
        format!("Weekly growth (last {} data points)", page.window),
        headers,
        1,
    );
    let mut history = TextTable::new("\nAll weeks", headers, 1);
    for (table, points) in [(&mut recent, &page.recent), (&mut history, &page.history)] {
        for p in points {
            table.push(vec![
                p.label.clone(),
                format_amount(p.deposits_total),
                format_amount(p.lending_total),
                format_optional_delta(p.deposits_delta),
                format_optional_delta(p.lending_delta),
            ]);
        }
    }

    let mut out = recent.render();
    out.push_str(&history.render());
    render_notices(&mut out, &page.notices);
    out
}

fn render_monthly(page: &MonthlyPage) -> String {
    let mut trend = TextTable::new("Monthly trend", &["Month", "Total Deposit", "Total Lending"], 1);
    for p in &page.trend {
        trend.push(vec![
            p.label.clone(),
            format_amount(p.deposits_total),
            format_amount(p.lending_total),
        ]);
    }

    let mut amount = TextTable::new(
        format!(
            "\nMonthly growth (amount), FY {}",
            page.fiscal_year.as_deref().unwrap_or("-")
        ),
        &["Month", "Deposit Growth", "Lending Growth"],
        1,
    );
    for p in &page.amount_growth {
        amount.push(vec![
            p.month.clone(),
            format_optional_delta(p.deposits_delta),
            format_optional_delta(p.lending_delta),
        ]);
    }

    let mut percent = TextTable::new(
        format!(
            "\nMonthly growth (percent), FY {}, baseline: {}",
            page.percent_fiscal_years.join(", "),
            page.baseline
        ),
        &["FY", "Month", "Deposit Growth", "Lending Growth"],
        2,
    );
    for p in &page.percent_growth {
        percent.push(vec![
            p.fiscal_year.clone(),
            p.month.clone(),
            format_percent(p.deposits_pct),
            format_percent(p.lending_pct),
        ]);
    }

    let mut out = trend.render();
    out.push_str(&amount.render());
    out.push_str(&percent.render());
    render_notices(&mut out, &page.notices);
    out
}

fn render_bankwise(page: &BankwisePage) -> String {
    let amount_headers = &[
        "Bank", "Deposits LCY", "Deposit FCY", "Total Deposit", "Lending LCY", "Lending FCY",
        "Total Lending", "CD Ratio",
    ];

    let (year, month) = &page.snapshot_period;
    let mut snapshot = TextTable::new(format!("As of {year} {month}"), amount_headers, 1);
    for r in &page.snapshot {
        snapshot.push(vec![
            r.bank_name.clone(),
            format_amount(r.deposits_local),
            format_amount(r.deposits_foreign),
            format_amount(r.deposits_total),
            format_amount(r.lending_local),
            format_amount(r.lending_foreign),
            format_amount(r.lending_total),
            format_percent(r.credit_deposit_ratio),
        ]);
    }

    let mut trend = TextTable::new(
        format!("\nBank comparison: {}", page.banks.join(", ")),
        &["Bank", "Month", "Total Deposit", "Total Lending"],
        2,
    );
    for p in &page.trend {
        trend.push(vec![
            p.bank_name.clone(),
            p.label.clone(),
            format_amount(p.deposits_total),
            format_amount(p.lending_total),
        ]);
    }

    let mut history = TextTable::new(
        format!("\nHistory: {}", page.history_bank.as_deref().unwrap_or("-")),
        &["FY", "Year", "Month", "Nepali Date", "Total Deposit", "Total Lending", "CD Ratio"],
        4,
    );
    for r in &page.history {
        history.push(vec![
            r.fiscal_year.clone(),
            r.year.to_string(),
            r.month.clone(),
            r.local_date.clone(),
            format_amount(r.deposits_total),
            format_amount(r.lending_total),
            format_percent(r.credit_deposit_ratio),
        ]);
    }

    let mut out = snapshot.render();
    out.push_str(&trend.render());
    out.push_str(&history.render());
    out
}

fn render_cd_ratio(page: &CdRatioPage) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "CD ratio as of {} ({}): {}\n",
        page.latest.description,
        page.latest.local_date,
        format_percent(page.latest.ratio)
    );

    let mut table = TextTable::new(
        format!("{} data, newest first", page.view),
        &["FY", "Year", "Month", "Week", "CD Ratio"],
        4,
    );
    for r in &page.table {
        table.push(vec![
            r.fiscal_year.clone(),
            r.year.to_string(),
            r.month.clone(),
            r.week.clone(),
            format_percent(r.ratio),
        ]);
    }
    out.push_str(&table.render());

    let mut series = TextTable::new(
        format!(
            "\nCD ratio over time, FY {}",
            page.fiscal_year.as_deref().unwrap_or("-")
        ),
        &["Period", "CD Ratio"],
        1,
    );
    for p in &page.series {
        series.push(vec![p.label.clone(), format_percent(p.ratio)]);
    }
    out.push_str(&series.render());
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
