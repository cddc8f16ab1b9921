//! Family calendar date handling
//!
//! The add/edit event forms collect a date as separate month, day and year
//! selections and an optional time as a 12-hour clock with an AM/PM choice.
//! Events are stored with a `YYYY-MM-DD` date and `HH:MM:SS` 24-hour times.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::model::CalendarEvent;

pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Years offered by the year selector.
pub const YEARS: RangeInclusive<i32> = 1900..=2050;

/// Minutes offered by the minute selector.
pub const MINUTE_OPTIONS: [&str; 4] = ["00", "15", "30", "45"];

/// 1-based month number for an English month name, case-insensitive.
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.trim();
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

/// Name of a 1-based month number.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTHS.get(month.checked_sub(1)? as usize).copied()
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Meridiem {
    #[default]
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl Meridiem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Meridiem {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AM" => Ok(Meridiem::Am),
            "PM" => Ok(Meridiem::Pm),
            _ => Err(()),
        }
    }
}

/// Raw selections from the event form. Every field may be left empty.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct EventSelection {
    pub month: Option<String>,
    pub day: Option<u32>,
    pub year: Option<i32>,
    pub hour: Option<u32>,
    pub minute: Option<String>,
    pub meridiem: Option<Meridiem>,
    pub end_hour: Option<u32>,
    pub end_minute: Option<String>,
    pub end_meridiem: Option<Meridiem>,
}

/// Normalized date and times ready to store.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date: String,
    pub time: Option<String>,
    pub end_time: Option<String>,
}

/// Assemble the stored date and times from form selections.
///
/// Returns `None` when month, day or year is missing or the day does not
/// exist in that month. A time is only produced when both its hour and
/// minute are filled; the end time does not depend on the start time and
/// is not compared with it.
pub fn assemble_event(selection: &EventSelection) -> Option<EventDateTime> {
    let month = month_number(selection.month.as_deref()?)?;
    let date = NaiveDate::from_ymd_opt(selection.year?, month, selection.day?)?;

    let time = clock_time(selection.hour, selection.minute.as_deref(), selection.meridiem);
    let end_time = clock_time(
        selection.end_hour,
        selection.end_minute.as_deref(),
        selection.end_meridiem,
    );

    Some(EventDateTime {
        date: date.format("%Y-%m-%d").to_string(),
        time,
        end_time,
    })
}

fn clock_time(hour: Option<u32>, minute: Option<&str>, meridiem: Option<Meridiem>) -> Option<String> {
    to_24h_time(hour?, minute?, meridiem.unwrap_or_default())
}

/// Convert a 12-hour selection to `HH:MM:SS`.
///
/// 12 AM is hour 0 and 12 PM stays 12. Hours outside 1-12 and minutes
/// outside 0-59 give `None`.
pub fn to_24h_time(hour: u32, minute: &str, meridiem: Meridiem) -> Option<String> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let minute: u32 = minute.trim().parse().ok()?;
    let hour = match (meridiem, hour) {
        (Meridiem::Am, 12) => 0,
        (Meridiem::Am, h) => h,
        (Meridiem::Pm, 12) => 12,
        (Meridiem::Pm, h) => h + 12,
    };
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(time.format("%H:%M:%S").to_string())
}

/// A stored time split back into form selections.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ClockSelection {
    pub hour: u32,
    pub minute: String,
    pub meridiem: Meridiem,
}

/// Split `HH:MM[:SS]` into 12-hour selections for the edit form.
pub fn split_time(time: &str) -> Option<ClockSelection> {
    let parsed = parse_time(time)?;
    let (is_pm, hour) = parsed.hour12();
    Some(ClockSelection {
        hour,
        minute: format!("{:02}", parsed.minute()),
        meridiem: if is_pm { Meridiem::Pm } else { Meridiem::Am },
    })
}

fn parse_time(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()
}

/// `"15:00:00"` becomes `"3:00 PM"`.
pub fn format_time(time: &str) -> Option<String> {
    let clock = split_time(time)?;
    Some(format!("{}:{} {}", clock.hour, clock.minute, clock.meridiem))
}

/// Start time alone, or `"start - end"` when an end time is set.
pub fn format_time_range(start: Option<&str>, end: Option<&str>) -> Option<String> {
    let start = format_time(start?)?;
    match end.and_then(format_time) {
        Some(end) => Some(format!("{} - {}", start, end)),
        None => Some(start),
    }
}

/// `"2024-01-05"` becomes `"January 5, 2024"`.
pub fn format_date(date: &str) -> Option<String> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let name = month_name(date.month())?;
    Some(format!("{} {}, {}", name, date.day(), date.year()))
}

pub fn days_in_month(month: u32, year: i32) -> Option<u32> {
    let (first, last) = month_bounds(month, year)?;
    Some(last.day() - first.day() + 1)
}

/// First and last day of a month, used to query that month's events.
pub fn month_bounds(month: u32, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = next_month(month, year);
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some((first, last))
}

/// The month before, as `(year, month)`.
pub fn previous_month(month: u32, year: i32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// The month after, as `(year, month)`.
pub fn next_month(month: u32, year: i32) -> (i32, u32) {
    if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Events falling on `date`, keeping their order.
pub fn events_on<'a>(events: &'a [CalendarEvent], date: NaiveDate) -> Vec<&'a CalendarEvent> {
    let key = date.format("%Y-%m-%d").to_string();
    events.iter().filter(|e| e.event_date == key).collect()
}
