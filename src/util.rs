// Utility helpers for coercion and formatting.
//
// This module centralizes all the "dirty" number/date handling so the
// rest of the pipeline can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use serde_json::Value;

/// Coerce an arbitrary raw scalar into a number.
///
/// - Finite numbers pass through unchanged.
/// - Strings are stripped of thousands separators (`,` and space) and
///   parsed; unparseable or non-finite results become `0.0`.
/// - Everything else (null, bool, array, object) becomes `0.0`.
///
/// This is the sole numeric-safety boundary for the whole pipeline:
/// every downstream sum and average assumes its inputs already passed
/// through here. Never panics.
pub fn to_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => {
            let f = n.as_f64().unwrap_or(0.0);
            if f.is_finite() {
                f
            } else {
                0.0
            }
        }
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && *c != ' ').collect();
            match cleaned.parse::<f64>() {
                Ok(f) if f.is_finite() => f,
                _ => 0.0,
            }
        }
        _ => 0.0,
    }
}

/// Coerce a raw scalar into a string the way a spreadsheet cell would
/// render it: strings pass through, numbers and booleans are formatted,
/// null/missing becomes empty.
pub fn to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Parse a calendar date from the formats seen in real exports.
///
/// Tries full-date formats first, then year-month forms (interpreted as
/// the first of that month). Ambiguous slash dates resolve month-first;
/// day-first only applies when the month-first reading is impossible.
/// Returns `None` for anything else.
pub fn parse_date_flexible(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    const FULL: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];
    for fmt in FULL {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    const MONTHLY: &[(&str, &str)] = &[("%Y-%m-%d", "-01"), ("%Y/%m/%d", "/01")];
    for (fmt, day) in MONTHLY {
        if let Ok(d) = NaiveDate::parse_from_str(&format!("{}{}", s, day), fmt) {
            return Some(d);
        }
    }
    None
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    // First, format to a plain fixed-decimal string like `1234567.89`.
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Use `num-format` to insert commas into the integer portion.
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values, used for
    // row counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
