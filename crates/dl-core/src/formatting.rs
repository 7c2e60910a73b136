use chrono::NaiveDate;

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use dl_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by a relative epsilon so exact decimal midpoints stored just
    // below the half round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` starts with "0.", e.g. "0.50".
        let decimal_digits = &frac_str[1..];
        format!("{}{}", grouped, decimal_digits)
    };

    // "-0.00" reads as noise in a delta column.
    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an amount (billions of rupees) with two decimals.
///
/// ```
/// use dl_core::formatting::format_amount;
///
/// assert_eq!(format_amount(6123.456), "6,123.46");
/// ```
pub fn format_amount(value: f64) -> String {
    format_number(value, 2)
}

/// Format a period-over-period change with an explicit sign.
///
/// ```
/// use dl_core::formatting::format_delta;
///
/// assert_eq!(format_delta(10.0),  "+10.00");
/// assert_eq!(format_delta(-20.5), "-20.50");
/// assert_eq!(format_delta(0.0),   "0.00");
/// ```
pub fn format_delta(value: f64) -> String {
    let body = format_number(value, 2);
    if value > 0.0 && body != "0.00" {
        format!("+{}", body)
    } else {
        body
    }
}

/// Format a value already on the percentage scale.
///
/// ```
/// use dl_core::formatting::format_percent;
///
/// assert_eq!(format_percent(84.567), "84.57%");
/// ```
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_number(value, 2))
}

/// Format an optional delta; an undefined value renders as an empty cell.
pub fn format_optional_delta(value: Option<f64>) -> String {
    value.map(format_delta).unwrap_or_default()
}

/// Long-form date, e.g. `"July 24, 2024"`.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Percent change from `previous` to `current`.
///
/// Returns `0.0` when `previous` is zero or either input is not finite, so a
/// missing baseline never surfaces as `NaN` or infinity.
///
/// # Examples
///
/// ```
/// use dl_core::formatting::percent_change;
///
/// assert!((percent_change(100.0, 110.0) - 10.0).abs() < 1e-9);
/// assert_eq!(percent_change(0.0, 50.0), 0.0);
/// ```
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
