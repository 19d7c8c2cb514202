//! TIMEX → English.

use chrono::{Datelike, NaiveDate, TimeDelta};

use super::Timex;

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTH_NAMES: [&str; 12] = [
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

/// Describe `timex` relative to `reference`.
pub(super) fn describe(timex: &Timex, reference: NaiveDate) -> String {
    if let Some(date) = timex.to_date() {
        return describe_date(date, reference);
    }

    let month = timex.month.and_then(month_name);
    match (timex.year, month, timex.day_of_month) {
        (None, Some(m), Some(d)) => return format!("{d}{} {m}", ordinal_suffix(d)),
        (Some(y), Some(m), None) => return format!("{m} {y}"),
        (None, Some(m), None) => return m.to_string(),
        _ => {}
    }

    let weekday = timex.day_of_week.and_then(weekday_name);
    match (timex.year, timex.week_of_year, weekday) {
        (_, None, Some(w)) => w.to_string(),
        (Some(y), Some(week), None) => format!("week {week} of {y}"),
        (Some(y), Some(week), Some(w)) => format!("{w} of week {week}, {y}"),
        _ => timex.to_string(),
    }
}

fn describe_date(date: NaiveDate, reference: NaiveDate) -> String {
    match date.signed_duration_since(reference).num_days() {
        0 => return "today".to_string(),
        1 => return "tomorrow".to_string(),
        -1 => return "yesterday".to_string(),
        _ => {}
    }

    let weekday = WEEKDAY_NAMES[date.weekday().num_days_from_monday() as usize];
    let weeks_apart = start_of_week(date)
        .signed_duration_since(start_of_week(reference))
        .num_days()
        / 7;
    match weeks_apart {
        0 => format!("this {weekday}"),
        1 => format!("next {weekday}"),
        -1 => format!("last {weekday}"),
        _ => format!(
            "{weekday} {}{} {} {}",
            date.day(),
            ordinal_suffix(date.day()),
            MONTH_NAMES[date.month0() as usize],
            date.year()
        ),
    }
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(date.weekday().num_days_from_monday() as i64)
}

fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

fn weekday_name(day: u32) -> Option<&'static str> {
    WEEKDAY_NAMES.get(day.checked_sub(1)? as usize).copied()
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
