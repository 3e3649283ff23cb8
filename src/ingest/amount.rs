//! Locale-tolerant amount and date normalization for raw cells

use bigdecimal::{BigDecimal, Zero};
use chrono::{Days, NaiveDate, NaiveDateTime};
use std::str::FromStr;

use crate::types::CellValue;

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Largest spreadsheet serial date (9999-12-31)
const MAX_SERIAL_DATE: f64 = 2_958_465.0;

/// Convert a raw cell into an exact decimal amount.
///
/// Numeric cells go through their shortest round-trip text so binary float
/// noise never reaches a sum. Anything unparsable yields zero.
pub fn normalize_amount(raw: &CellValue) -> BigDecimal {
    match raw {
        CellValue::Number(n) if n.is_finite() => {
            BigDecimal::from_str(&n.to_string()).unwrap_or_else(|_| BigDecimal::zero())
        }
        CellValue::Decimal(d) => d.clone(),
        CellValue::Text(s) => normalize_amount_str(s),
        _ => BigDecimal::zero(),
    }
}

/// Parse a locale-formatted amount string such as `"1 234,50"`, `"(1.234,50)"`
/// or `"kr 12,345.00"`.
///
/// When both `.` and `,` appear, the last one is the decimal separator. A
/// separator that repeats groups thousands. A single `,` is decimal. A single
/// `.` is decimal unless it looks like a thousands group, i.e. one to three
/// leading digits (not starting with 0) followed by exactly three digits, so
/// `"1.234"` is 1234 while `"0.125"` and `"12.5"` stay fractional.
pub fn normalize_amount_str(raw: &str) -> BigDecimal {
    // drops spaces, NBSP, currency text and apostrophe grouping
    let kept: String = raw
        .chars()
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '(' | ')'))
        .collect();

    let parenthesized = kept.starts_with('(') && kept.ends_with(')');
    let negative = parenthesized || kept.starts_with('-') || kept.ends_with('-');

    let body: String = kept
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '-'))
        .collect();

    let canonical = canonical_decimal(&body);
    if canonical.is_empty() {
        return BigDecimal::zero();
    }

    match BigDecimal::from_str(&canonical) {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => BigDecimal::zero(),
    }
}

fn canonical_decimal(body: &str) -> String {
    let last_dot = body.rfind('.');
    let last_comma = body.rfind(',');

    let decimal_sep = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(dot), None) if body.matches('.').count() == 1 => {
            (!is_thousands_group(&body[..dot], &body[dot + 1..])).then_some('.')
        }
        (None, Some(_)) if body.matches(',').count() == 1 => Some(','),
        _ => None,
    };

    let split_at = decimal_sep.and_then(|sep| body.rfind(sep));
    let (int_part, frac_part) = match split_at {
        Some(idx) => (&body[..idx], &body[idx + 1..]),
        None => (body, ""),
    };

    let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let frac_digits: String = frac_part.chars().filter(|c| c.is_ascii_digit()).collect();

    match (int_digits.is_empty(), frac_digits.is_empty()) {
        (true, true) => String::new(),
        (false, true) => int_digits,
        (true, false) => format!("0.{}", frac_digits),
        (false, false) => format!("{}.{}", int_digits, frac_digits),
    }
}

fn is_thousands_group(head: &str, tail: &str) -> bool {
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    tail.len() == 3
        && all_digits(tail)
        && (1..=3).contains(&head.len())
        && all_digits(head)
        && !head.starts_with('0')
}

/// Permissively parse a date cell; unparsable values become `None`
pub fn parse_date(raw: &CellValue) -> Option<NaiveDate> {
    match raw {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(s) => parse_date_str(s),
        _ => None,
    }
}

/// Parse a date string in one of the common ledger export formats
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Spreadsheet serial date: days since 1899-12-30
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DATE {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_plain_and_numeric_cells() {
        assert_eq!(normalize_amount(&CellValue::Number(50000.0)), dec("50000"));
        assert_eq!(normalize_amount(&CellValue::Number(0.1)), dec("0.1"));
        assert_eq!(normalize_amount(&CellValue::Number(-1234.56)), dec("-1234.56"));
        assert_eq!(normalize_amount(&CellValue::Decimal(dec("12.30"))), dec("12.30"));
        assert_eq!(normalize_amount(&CellValue::Number(f64::NAN)), BigDecimal::zero());
    }

    #[test]
    fn test_norwegian_formats() {
        assert_eq!(normalize_amount_str("1 234,56"), dec("1234.56"));
        assert_eq!(normalize_amount_str("1\u{a0}234\u{a0}567,80"), dec("1234567.80"));
        assert_eq!(normalize_amount_str("1.234,56"), dec("1234.56"));
        assert_eq!(normalize_amount_str("kr 600 000,00"), dec("600000.00"));
        assert_eq!(normalize_amount_str("-350 000"), dec("-350000"));
    }

    #[test]
    fn test_english_formats() {
        assert_eq!(normalize_amount_str("12,345.67"), dec("12345.67"));
        assert_eq!(normalize_amount_str("1,234,567"), dec("1234567"));
        assert_eq!(normalize_amount_str("$ 99.5"), dec("99.5"));
    }

    #[test]
    fn test_negative_notations() {
        assert_eq!(normalize_amount_str("(1 234,50)"), dec("-1234.50"));
        assert_eq!(normalize_amount_str("(500)"), dec("-500"));
        assert_eq!(normalize_amount_str("500-"), dec("-500"));
        assert_eq!(normalize_amount_str("\u{2212}42"), dec("-42"));
    }

    #[test]
    fn test_invalid_input_is_zero() {
        assert_eq!(normalize_amount_str(""), BigDecimal::zero());
        assert_eq!(normalize_amount_str("n/a"), BigDecimal::zero());
        assert_eq!(normalize_amount_str("-"), BigDecimal::zero());
        assert_eq!(normalize_amount(&CellValue::Empty), BigDecimal::zero());
        assert_eq!(normalize_amount(&CellValue::Bool(true)), BigDecimal::zero());
    }

    #[test]
    fn test_single_separator_magnitude() {
        // a dot followed by three digits groups thousands
        assert_eq!(normalize_amount_str("1.234"), dec("1234"));
        assert_eq!(normalize_amount_str("12.345"), dec("12345"));
        assert_eq!(normalize_amount_str("-123.456"), dec("-123456"));
        assert_eq!(normalize_amount_str("1.234"), normalize_amount_str("1.234,00"));
        assert_eq!(normalize_amount_str("1.234.567"), dec("1234567"));

        // anything else keeps the dot as decimal point
        assert_eq!(normalize_amount_str("0.125"), dec("0.125"));
        assert_eq!(normalize_amount_str("12.5"), dec("12.5"));
        assert_eq!(normalize_amount_str("1234.567"), dec("1234.567"));
        assert_eq!(normalize_amount_str("12.3456"), dec("12.3456"));

        // a single comma is always the decimal separator
        assert_eq!(normalize_amount_str("1,5"), dec("1.5"));
        assert_eq!(normalize_amount_str("1,50"), dec("1.50"));
    }

    #[test]
    fn test_leading_decimal() {
        assert_eq!(normalize_amount_str(",5"), dec("0.5"));
    }

    #[test]
    fn test_parse_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(parse_date_str("2024-01-31"), Some(expected));
        assert_eq!(parse_date_str("31.01.2024"), Some(expected));
        assert_eq!(parse_date_str("31/01/2024"), Some(expected));
        assert_eq!(parse_date_str("31.01.24"), Some(expected));
        assert_eq!(parse_date_str("2024-01-31 00:00:00"), Some(expected));
        assert_eq!(parse_date(&CellValue::Number(45322.0)), Some(expected));
        assert_eq!(parse_date(&CellValue::Date(expected)), Some(expected));
        assert_eq!(parse_date_str("januar"), None);
        assert_eq!(parse_date(&CellValue::Number(-3.0)), None);
    }
}
