//! Doctor availability patterns and appointment date handling
//!
//! Availability is written the way the clinic stores it: `Mon-Fri 9AM-5PM`,
//! `Mon, Wed, Fri 8AM-4PM`, `Fri-Mon 10AM-2PM`. Only the weekday portion is
//! interpreted; time windows are carried verbatim.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Canonical display format for appointment dates (`Mon, January 05, 2026`)
pub const DISPLAY_FORMAT: &str = "%a, %B %d, %Y";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", DISPLAY_FORMAT, "%A, %B %d, %Y", "%B %d, %Y", "%d %B %Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// How far ahead `next_available` searches
const SEARCH_HORIZON_DAYS: i64 = 14;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Availability pattern is empty")]
    EmptyPattern,
    #[error("Unknown weekday '{0}' in availability pattern")]
    UnknownDay(String),
    #[error("Cannot parse date '{0}'")]
    UnparseableDate(String),
}

/// Weekdays on which a doctor sees patients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityPattern {
    days: [bool; 7],
    raw: String,
}

impl AvailabilityPattern {
    pub fn parse(pattern: &str) -> Result<Self, ScheduleError> {
        // Weekday tokens come before the first token that starts with a digit
        let day_part: Vec<&str> = pattern
            .split_whitespace()
            .take_while(|token| !token.starts_with(|c: char| c.is_ascii_digit()))
            .collect();
        let day_part = day_part.join(" ");

        let mut days = [false; 7];
        let mut any = false;
        for item in day_part.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = item.split_once('-') {
                let start = parse_weekday(start)?;
                let end = parse_weekday(end)?;
                let mut day = start;
                loop {
                    days[day.num_days_from_monday() as usize] = true;
                    if day == end {
                        break;
                    }
                    day = day.succ();
                }
            } else {
                days[parse_weekday(item)?.num_days_from_monday() as usize] = true;
            }
            any = true;
        }

        if !any {
            return Err(ScheduleError::EmptyPattern);
        }
        Ok(Self {
            days,
            raw: pattern.trim().to_string(),
        })
    }

    pub fn includes(&self, day: Weekday) -> bool {
        self.days[day.num_days_from_monday() as usize]
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.includes(date.weekday())
    }

    /// First matching date on or after `from`, within two weeks
    pub fn next_available(&self, from: NaiveDate) -> Option<NaiveDate> {
        (0..SEARCH_HORIZON_DAYS)
            .map(|offset| from + Duration::days(offset))
            .find(|date| self.contains(*date))
    }
}

impl fmt::Display for AvailabilityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_weekday(token: &str) -> Result<Weekday, ScheduleError> {
    let lower = token.trim().trim_end_matches('.').to_ascii_lowercase();
    let day = match lower.get(..3) {
        Some("mon") => Weekday::Mon,
        Some("tue") => Weekday::Tue,
        Some("wed") => Weekday::Wed,
        Some("thu") => Weekday::Thu,
        Some("fri") => Weekday::Fri,
        Some("sat") => Weekday::Sat,
        Some("sun") => Weekday::Sun,
        _ => return Err(ScheduleError::UnknownDay(token.trim().to_string())),
    };
    Ok(day)
}

/// Parse an appointment date in any of the formats the assistant produces
pub fn parse_appointment_date(input: &str) -> Result<NaiveDate, ScheduleError> {
    let input = input.trim();
    // The display format's weekday is redundant; trust the calendar date
    let without_weekday = input
        .split_once(", ")
        .filter(|(head, _)| parse_weekday(head).is_ok())
        .map_or(input, |(_, rest)| rest);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(input, fmt)
                .or_else(|_| NaiveDate::parse_from_str(without_weekday, fmt))
                .ok()
        })
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| ScheduleError::UnparseableDate(input.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

const WEEKDAY_NAMES: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

fn offset_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:in\s+)?(\d+)\s*(day|week)s?(?:\s*(ago|from now|later))?")
            .unwrap_or_else(|e| unreachable!("static regex is valid: {e}"))
    })
}

/// Resolve a natural-language date hint relative to `today`.
///
/// Returns `None` when the hint is not one of the supported shapes; callers
/// may fall back to asking the model.
pub fn resolve_hint(hint: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Ok(date) = parse_appointment_date(hint) {
        return Some(date);
    }

    let hint = hint.trim().to_lowercase();

    if hint.contains("day after tomorrow") {
        return Some(today + Duration::days(2));
    }
    match hint.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        _ => {}
    }

    if let Some((_, target)) = WEEKDAY_NAMES.iter().find(|(name, _)| hint.contains(name)) {
        let current = i64::from(today.weekday().num_days_from_monday());
        let target = i64::from(target.num_days_from_monday());
        if hint.contains("last") {
            let back = match (current - target).rem_euclid(7) {
                0 => 7,
                n => n,
            };
            return Some(today - Duration::days(back));
        }
        let ahead = match (target - current).rem_euclid(7) {
            0 => 7,
            n => n,
        };
        return Some(today + Duration::days(ahead));
    }

    if let Some(date) = resolve_week(&hint, today) {
        return Some(date);
    }
    if let Some(date) = resolve_month(&hint, today) {
        return Some(date);
    }

    let caps = offset_regex().captures(&hint)?;
    let amount: i64 = caps.get(1)?.as_str().parse().ok()?;
    let days = match caps.get(2)?.as_str() {
        "week" => amount * 7,
        _ => amount,
    };
    let has_in = hint.contains("in ");
    match caps.get(3).map(|m| m.as_str()) {
        Some("ago") => Some(today - Duration::days(days)),
        Some(_) => Some(today + Duration::days(days)),
        None if has_in => Some(today + Duration::days(days)),
        None => None,
    }
}

fn position_in_span(hint: &str, start: NaiveDate, last_offset: i64) -> NaiveDate {
    if hint.contains("first day") || hint.contains("beginning") {
        start
    } else if hint.contains("last day") || hint.contains("end") {
        start + Duration::days(last_offset)
    } else if hint.contains("middle") || hint.contains("mid") {
        start + Duration::days(3)
    } else {
        start
    }
}

fn resolve_week(hint: &str, today: NaiveDate) -> Option<NaiveDate> {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let start = if hint.contains("next week") {
        monday + Duration::days(7)
    } else if hint.contains("last week") {
        monday - Duration::days(7)
    } else if hint.contains("this week") {
        monday
    } else {
        return None;
    };
    Some(position_in_span(hint, start, 6))
}

fn resolve_month(hint: &str, today: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = (today.year(), today.month());
    let first = if hint.contains("next month") {
        if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        }
    } else if hint.contains("last month") {
        if month == 1 {
            NaiveDate::from_ymd_opt(year - 1, 12, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month - 1, 1)?
        }
    } else {
        return None;
    };

    if hint.contains("last day") || hint.contains("end") {
        let following = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
        };
        following.pred_opt()
    } else {
        Some(first)
    }
}
