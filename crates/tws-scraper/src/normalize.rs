//! Currency and date normalization shared by the site extractors.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Primary date format, e.g. `5 March 2023`.
pub const PRIMARY_DATE_FORMAT: &str = "%d %B %Y";

/// Tried in order when the primary format fails.
pub const FALLBACK_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d %b %Y"];

pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amount {
    pub original: f64,
    pub converted: f64,
}

/// Parses a money string such as `£1,250,000 GBP` and converts it with `rate`.
///
/// Only the first whitespace separated token is kept (non-breaking spaces
/// count as whitespace), currency symbols and thousands separators are
/// dropped. Returns `None` when what is left is not a finite number.
pub fn parse_amount(text: &str, rate: f64) -> Option<Amount> {
    let token = text
        .split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .find(|t| !t.is_empty())?;
    let cleaned: String = token
        .chars()
        .filter(|c| !matches!(c, '£' | '€' | '$' | ','))
        .collect();

    let original: f64 = cleaned.parse().ok()?;
    if !original.is_finite() {
        return None;
    }

    Some(Amount {
        original,
        converted: round2(original * rate),
    })
}

/// Two decimals, exact halves to even, computed on the exact binary value so
/// `0.015` (stored just below) rounds down.
fn round2(n: f64) -> f64 {
    Decimal::from_f64_retain(n)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(n)
}

/// Parses a date in any of the known formats.
///
/// Anything after the first comma is ignored for the primary format, anything
/// from the first `(` for the fallbacks, so `1 May 2023, 10:00am` and
/// `01/05/2023 (by 5:00pm)` both parse.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let head = text.split(',').next().unwrap_or_default().trim();
    if let Some(date) = parse_with(head, PRIMARY_DATE_FORMAT) {
        return Some(date);
    }

    let head = text.trim().split('(').next().unwrap_or_default().trim();
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| parse_with(head, fmt))
}

/// Like `NaiveDate::parse_from_str`, but the year must be written with
/// exactly four digits: `1 May 23` is not a date.
fn parse_with(text: &str, fmt: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(text, fmt).ok()?;
    if !(1..=9999).contains(&date.year()) {
        return None;
    }
    let year = format!("{:04}", date.year());
    text.split(|c: char| !c.is_ascii_digit())
        .any(|run| run == year)
        .then_some(date)
}

/// Returns the date as `YYYY-MM-DD`, or `text` unchanged when no known
/// format matches. Callers must not assume the result is canonical.
pub fn normalize_date(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    match parse_date(text) {
        Some(date) => Some(date.format(CANONICAL_DATE_FORMAT).to_string()),
        None => {
            log::warn!("Could not parse date: '{text}' with any known format");
            Some(text.to_string())
        }
    }
}
