use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("date cell is empty")]
    Empty,
    #[error("unparseable date: {0:?}")]
    Invalid(String),
}

/// Which of the two leading fields of a `a/b/yyyy` date is the day.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DateOrder {
    DayFirst,
    MonthFirst,
}

const BUDDHIST_ERA_THRESHOLD: i32 = 2400;
const BUDDHIST_ERA_OFFSET: i32 = 543;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,4})[/.\-](\d{1,2})[/.\-](\d{2,4})$").expect("invalid date regex")
    })
}

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(\d{1,4}[/.\-]\d{1,2}[/.\-]\d{2,4})(?:\s+(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([AP]M))?)?$",
        )
        .expect("invalid datetime regex")
    })
}

fn date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d{1,4}[/.\-]\d{1,2}[/.\-]\d{2,4}").expect("invalid date token regex")
    })
}

/// Converts a Buddhist-era year to Gregorian; other years pass through.
pub fn gregorian_year(year: i32) -> i32 {
    if year >= BUDDHIST_ERA_THRESHOLD {
        year - BUDDHIST_ERA_OFFSET
    } else {
        year
    }
}

/// Parses a year header cell ("2566", "2023", "2566.0", "ปี 2566").
///
/// Returns the Gregorian year when it falls in 1900..=2100.
pub fn parse_year_cell(raw: &str) -> Option<i32> {
    let text = raw.trim();
    let text = text
        .strip_prefix("ปี")
        .or_else(|| text.strip_prefix("พ.ศ."))
        .or_else(|| text.strip_prefix("ค.ศ."))
        .unwrap_or(text)
        .trim();
    let text = match text.split_once('.') {
        Some((whole, fraction)) if fraction.chars().all(|ch| ch == '0') => whole,
        _ => text,
    };
    if text.len() != 4 || !text.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    let year = gregorian_year(text.parse().ok()?);
    (1900..=2100).contains(&year).then_some(year)
}

/// Parses `DD/MM/YYYY`-shaped dates (also `-` and `.` separators, and
/// `YYYY-MM-DD`) into `YYYY-MM-DD`, correcting Buddhist-era years.
pub fn parse_date(raw: &str) -> Result<String, DateError> {
    parse_date_with_order(raw, DateOrder::DayFirst)
}

pub fn parse_date_with_order(raw: &str, order: DateOrder) -> Result<String, DateError> {
    let date = parse_naive_date(raw, order)?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Parses a date with an optional `HH:MM[:SS] [AM|PM]` suffix.
///
/// A meridiem on an hour of 13 or more is dropped and the time read as
/// 24-hour. Without a time part the date alone is returned.
pub fn parse_datetime(raw: &str, order: DateOrder) -> Result<String, DateError> {
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return Err(DateError::Empty);
    }
    let captures = datetime_re()
        .captures(&text)
        .ok_or_else(|| DateError::Invalid(raw.to_string()))?;

    let date = parse_naive_date(&captures[1], order)?;
    let Some(hour) = captures.get(2) else {
        return Ok(date.format("%Y-%m-%d").to_string());
    };

    let mut hour: u32 = hour
        .as_str()
        .parse()
        .map_err(|_| DateError::Invalid(raw.to_string()))?;
    let minute: u32 = captures[3]
        .parse()
        .map_err(|_| DateError::Invalid(raw.to_string()))?;
    let second: u32 = match captures.get(4) {
        Some(value) => value
            .as_str()
            .parse()
            .map_err(|_| DateError::Invalid(raw.to_string()))?,
        None => 0,
    };

    if let Some(meridiem) = captures.get(5)
        && hour < 13
    {
        let is_pm = meridiem.as_str().eq_ignore_ascii_case("pm");
        hour = match (is_pm, hour) {
            (true, 12) => 12,
            (true, value) => value + 12,
            (false, 12) => 0,
            (false, value) => value,
        };
    }

    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| DateError::Invalid(raw.to_string()))?;
    Ok(format!(
        "{} {}",
        date.format("%Y-%m-%d"),
        time.format("%H:%M:%S")
    ))
}

/// Converts an Excel day serial (1900 date system) to `YYYY-MM-DD`. Only the
/// whole-day part counts. A serial that lands in the Buddhist era is
/// corrected like any other date.
pub fn excel_serial_date(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial <= 0.0 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?
        .checked_add_days(Days::new(serial.trunc() as u64))?;
    let date = date.with_year(gregorian_year(date.year()))?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Reads a spreadsheet date cell: an ISO or day-first date, with any time
/// part dropped, or a bare Excel day serial.
pub fn parse_sheet_date(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().next()?;
    let text = text.split_once('T').map_or(text, |(date, _)| date);
    if let Ok(serial) = text.parse::<f64>() {
        return excel_serial_date(serial);
    }
    parse_date(text).ok()
}

/// Finds the first date-shaped token inside free text and parses it.
pub fn find_date(text: &str, order: DateOrder) -> Option<String> {
    let token = date_token_re().find(text)?;
    parse_date_with_order(token.as_str(), order).ok()
}

fn parse_naive_date(raw: &str, order: DateOrder) -> Result<NaiveDate, DateError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(DateError::Empty);
    }
    let invalid = || DateError::Invalid(raw.to_string());
    let captures = date_re().captures(text).ok_or_else(invalid)?;

    let first = &captures[1];
    let second: u32 = captures[2].parse().map_err(|_| invalid())?;
    let third = &captures[3];

    let (year, month, day) = if first.len() == 4 {
        if third.len() > 2 {
            return Err(invalid());
        }
        let year: i32 = first.parse().map_err(|_| invalid())?;
        let day: u32 = third.parse().map_err(|_| invalid())?;
        (year, second, day)
    } else {
        if first.len() > 2 || third.len() == 3 {
            return Err(invalid());
        }
        let leading: u32 = first.parse().map_err(|_| invalid())?;
        let year: i32 = third.parse().map_err(|_| invalid())?;
        let year = if third.len() == 2 {
            if year < 50 { 2000 + year } else { 1900 + year }
        } else {
            year
        };
        match order {
            DateOrder::DayFirst => (year, second, leading),
            DateOrder::MonthFirst => (year, leading, second),
        }
    };

    NaiveDate::from_ymd_opt(gregorian_year(year), month, day).ok_or_else(invalid)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
