//! Retention: which dated rows are stale

use crate::types::CellValue;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

/// Year first, every later part optional: `2024`, `2024-03`, `20240305`,
/// `2024/3/5 7:05`, `2024-03-05T07:05:09.123`. Missing parts default to the
/// start of their range.
static YEAR_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9]{4})[-/]?([0-9]{1,2})?[-/]?([0-9]{0,2})[Tt\s]*([0-9]{1,2})?:?([0-9]{1,2})?:?([0-9]{1,2})?[.:]?([0-9]+)?$",
    )
    .expect("year-first date pattern is valid")
});

/// Date-times carrying a UTC offset (`Z`, `+02`, `+0200` or `+02:00`)
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y/%m/%d %H:%M%#z",
    "%Y/%m/%d %H:%M:%S%#z",
];

/// Month-first and spelled-out forms
const LOCAL_DATE_TIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%d %B %Y %H:%M",
];

const LOCAL_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%B %d, %Y", "%B %d %Y", "%d %B %Y"];

/// Parse the text of a date cell.
///
/// Text without an offset is read as local time. Only textual cells are
/// considered; numbers, booleans and empty cells yield `None`.
pub fn parse_cell_date(cell: &CellValue) -> Option<DateTime<Local>> {
    let text = cell.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(naive) = parse_year_first(text) {
        return Local.from_local_datetime(&naive).earliest();
    }

    let with_offset = DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
        });
    if let Some(dt) = with_offset {
        return Some(dt.with_timezone(&Local));
    }

    let naive = LOCAL_DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            LOCAL_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Local.from_local_datetime(&naive).earliest()
}

fn parse_year_first(text: &str) -> Option<NaiveDateTime> {
    let caps = YEAR_FIRST.captures(text)?;
    let part = |i: usize, default: u32| -> Option<u32> {
        match caps.get(i).map(|m| m.as_str()) {
            None | Some("") => Some(default),
            Some(digits) => digits.parse().ok(),
        }
    };
    let millis = match caps.get(7) {
        Some(m) => m.as_str().get(..3).unwrap_or(m.as_str()).parse().ok()?,
        None => 0,
    };

    let year = caps.get(1)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, part(2, 1)?, part(3, 1)?)?;
    let time = NaiveTime::from_hms_milli_opt(part(4, 0)?, part(5, 0)?, part(6, 0)?, millis)?;
    Some(date.and_time(time))
}

/// Offsets (0-based, within the scanned data rows) of rows to delete.
///
/// A row is stale when its first cell is missing, does not parse as a date,
/// or is strictly before `cutoff`. Offsets are returned ascending.
pub fn stale_rows(rows: &[Vec<CellValue>], cutoff: DateTime<Local>) -> Vec<u32> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            row.first()
                .and_then(parse_cell_date)
                .map_or(true, |date| date < cutoff)
        })
        .map(|(i, _)| i as u32)
        .collect()
}
