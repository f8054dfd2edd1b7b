use chrono::{Datelike, Days, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.checked_sub_days(Days::new(1))
}

/// Parses a statement column label into a date.
///
/// Accepted forms: `Mar 2021` / `March 2021` (resolves to the month end),
/// `2021-03-31`, `2021-03` (month end) and `Mar 31, 2021`.
pub fn parse_period_label(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(label, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(label, "%B %d, %Y") {
        return Some(date);
    }

    let month_start = NaiveDate::parse_from_str(&format!("01 {}", label), "%d %B %Y")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", label), "%Y-%m-%d"))
        .ok()?;

    last_day_of_month(month_start.year(), month_start.month())
}

/// Parses a locale-formatted number such as `"1,234.5"` or `"12,34,567"`.
///
/// Grouping separators are stripped; a trailing `%` is ignored. Returns
/// `None` for blanks and anything that is not a finite number.
pub fn parse_grouped_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim().trim_end_matches('%').trim();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Converts a statement cell to a number; absent or unparseable cells are 0.
pub fn cell_value(cell: Option<&serde_json::Value>) -> f64 {
    match cell {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => parse_grouped_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Formats a number with Indian digit grouping (`12,34,567.89`), keeping at
/// most `max_fraction_digits` decimals and dropping trailing zeros.
pub fn format_grouped_number(value: f64, max_fraction_digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.*}", max_fraction_digits, value.abs());
    let (int_part, frac_part) = match rounded.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (rounded.as_str(), ""),
    };

    let grouped = group_indian(int_part);
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Rupee label used by chart tooltips.
pub fn format_rupees(value: f64) -> String {
    format!("₹{}", format_grouped_number(value, 2))
}

const COMPACT_UNITS: [(f64, &str); 5] = [
    (1.0, ""),
    (1_000.0, "K"),
    (1_000_000.0, "M"),
    (1_000_000_000.0, "B"),
    (1_000_000_000_000.0, "T"),
];

/// Compact dollar amount with at most one decimal: `$1.2B`, `-$350M`, `$950`.
///
/// A value that rounds up to the next unit is shown in that unit
/// (`999_950` is `$1M`, not `$1000K`).
pub fn format_compact_currency(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }

    let magnitude = value.abs();
    let mut unit = COMPACT_UNITS
        .iter()
        .rposition(|(size, _)| magnitude >= *size)
        .unwrap_or(0);

    let mut scaled = (magnitude / COMPACT_UNITS[unit].0 * 10.0).round() / 10.0;
    if scaled >= 1000.0 && unit + 1 < COMPACT_UNITS.len() {
        unit += 1;
        scaled = (magnitude / COMPACT_UNITS[unit].0 * 10.0).round() / 10.0;
    }

    let digits = format!("{:.1}", scaled);
    let digits = digits.strip_suffix(".0").unwrap_or(&digits);
    let sign = if value < 0.0 && scaled != 0.0 { "-" } else { "" };
    format!("{}${}{}", sign, digits, COMPACT_UNITS[unit].1)
}

/// Extracts the company symbol from a `/company/<symbol>/...` path.
pub fn symbol_from_company_path(url: &str) -> String {
    let path = url.strip_prefix("/company/").unwrap_or(url);
    path.strip_suffix('/').unwrap_or(path).to_string()
}
