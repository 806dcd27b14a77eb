use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::model::BillStatus;

const MONTHS_FR: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Jui", "Jui", "Aoû", "Sep", "Oct", "Nov", "Déc",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid date `{0}`")]
    InvalidDate(String),
}

/// Parse the ISO-like dates stored on bills (`2004-04-04`, RFC 3339 or a bare datetime).
pub fn parse_bill_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(datetime.date_naive());
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|datetime| datetime.date())
}

/// Render a bill date as `4 Avr. 04`.
pub fn format_date(raw: &str) -> Result<String, FormatError> {
    let date = parse_bill_date(raw).ok_or_else(|| FormatError::InvalidDate(raw.to_string()))?;
    let month = MONTHS_FR
        .get(date.month0() as usize)
        .copied()
        .ok_or_else(|| FormatError::InvalidDate(raw.to_string()))?;
    let year = format!("{:04}", date.year());
    let short_year = year.get(2..4).unwrap_or(&year);
    Ok(format!("{} {}. {}", date.day(), month, short_year))
}

pub fn format_status(status: &BillStatus) -> String {
    status.label_fr().to_string()
}

/// Lenient integer parse for form inputs: leading whitespace and sign, then as many
/// digits as present. `"12.5"` gives 12, `"abc"` gives `None`.
pub fn parse_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
