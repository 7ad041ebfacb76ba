//! Display formatting for amounts, labels and dates (en-US conventions)

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Formats a converted amount with `,` grouping.
///
/// Amounts of 1 or more keep two fractional digits. Smaller amounts keep up to
/// four, trimming trailing zeros but never below two digits. Ties round away
/// from zero. Returns `None` when the value cannot be shown as a decimal.
pub fn format_amount(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    // Shortest round-trip text, so 1.125 stays an exact tie
    let exact = Decimal::from_str(&value.to_string()).ok()?.abs();
    let max_digits: u32 = if exact >= Decimal::ONE { 2 } else { 4 };
    let rounded = exact.round_dp_with_strategy(max_digits, RoundingStrategy::MidpointAwayFromZero);

    let fixed = format!("{:.*}", max_digits as usize, rounded);
    let (int_part, frac_part) = fixed.split_once('.')?;

    let mut frac = frac_part.to_string();
    while frac.len() > 2 && frac.ends_with('0') {
        frac.pop();
    }

    let sign = if value < 0.0 && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    Some(format!("{sign}{}.{frac}", group_thousands(int_part)))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_rate_label(base: &str, rate: f64, code: &str) -> String {
    format!("1 {base} = {rate:.4} {code}")
}

pub fn unavailable_label(code: &str) -> String {
    format!("Rate unavailable for {code}")
}

/// `"Rates for Mar 1, 2024"` for a `YYYY-MM-DD` date, `"Latest rates"` otherwise.
pub fn format_updated_at(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => format!("Rates for {}", d.format("%b %-d, %Y")),
        Err(_) => "Latest rates".to_string(),
    }
}
