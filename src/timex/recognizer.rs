//! Free text → TIMEX recognition.
//!
//! Rules run in order; the first match wins. Anything that matches no rule
//! is unrecognized, which prompts treat as invalid input.

use chrono::{Datelike, NaiveDate, TimeDelta};
use regex::Regex;

use super::Timex;

const MONTH_PATTERN: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Compiled recognition rules.
pub struct TimexRecognizer {
    iso: Regex,
    us_full: Regex,
    us_short: Regex,
    in_days: Regex,
    weekday: Regex,
    month_day: Regex,
    day_month: Regex,
}

impl TimexRecognizer {
    pub fn new() -> Self {
        Self {
            iso: Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap(),
            us_full: Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap(),
            us_short: Regex::new(r"^(\d{1,2})/(\d{1,2})$").unwrap(),
            in_days: Regex::new(r"^in (\d{1,3}) days?$").unwrap(),
            weekday: Regex::new(
                r"^(?:(next|this|last) )?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$",
            )
            .unwrap(),
            month_day: Regex::new(&format!(
                r"^{MONTH_PATTERN}\.? (\d{{1,2}})(?:st|nd|rd|th)?(?:,? (\d{{4}}))?$"
            ))
            .unwrap(),
            day_month: Regex::new(&format!(
                r"^(?:the )?(\d{{1,2}})(?:st|nd|rd|th)? (?:of )?{MONTH_PATTERN}\.?(?:,? (\d{{4}}))?$"
            ))
            .unwrap(),
        }
    }

    /// Recognize `text` relative to `reference`.
    pub fn recognize(&self, text: &str, reference: NaiveDate) -> Option<Timex> {
        let lowered = text
            .trim()
            .trim_end_matches(['.', '!', '?'])
            .to_lowercase();
        let input = lowered.strip_prefix("on ").unwrap_or(&lowered).trim();
        if input.is_empty() {
            return None;
        }

        if let Some(caps) = self.iso.captures(input) {
            return definite(num(&caps[1])?, num(&caps[2])?, num(&caps[3])?);
        }
        if let Some(caps) = self.us_full.captures(input) {
            return definite(num(&caps[3])?, num(&caps[1])?, num(&caps[2])?);
        }
        if let Some(caps) = self.us_short.captures(input) {
            return month_and_day(num(&caps[1])?, num(&caps[2])?);
        }
        if let Some(offset) = relative_day(input) {
            return shifted(reference, offset);
        }
        if let Some(caps) = self.in_days.captures(input) {
            return shifted(reference, num::<i64>(&caps[1])?);
        }
        if let Some(timex) = relative_period(input, reference) {
            return Some(timex);
        }
        if let Some(caps) = self.weekday.captures(input) {
            let day = WEEKDAYS.iter().position(|d| *d == &caps[2])? as i64;
            let week_offset = match caps.get(1).map(|m| m.as_str()) {
                Some("next") => 1,
                Some("this") => 0,
                Some("last") => -1,
                _ => {
                    return Some(Timex {
                        day_of_week: Some(day as u32 + 1),
                        ..Default::default()
                    });
                }
            };
            return shifted(start_of_week(reference), week_offset * 7 + day);
        }
        if let Some(caps) = self.month_day.captures(input) {
            let month = month_number(&caps[1])?;
            let day = num(&caps[2])?;
            return with_optional_year(caps.get(3).map(|m| m.as_str()), month, day);
        }
        if let Some(caps) = self.day_month.captures(input) {
            let month = month_number(&caps[2])?;
            let day = num(&caps[1])?;
            return with_optional_year(caps.get(3).map(|m| m.as_str()), month, day);
        }
        None
    }
}

impl Default for TimexRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

fn num<T: std::str::FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

fn definite(year: i32, month: u32, day: u32) -> Option<Timex> {
    NaiveDate::from_ymd_opt(year, month, day).map(Timex::from_date)
}

fn month_and_day(month: u32, day: u32) -> Option<Timex> {
    // 2000 is a leap year, so Feb 29 is accepted.
    NaiveDate::from_ymd_opt(2000, month, day)?;
    Some(Timex {
        month: Some(month),
        day_of_month: Some(day),
        ..Default::default()
    })
}

fn with_optional_year(year: Option<&str>, month: u32, day: u32) -> Option<Timex> {
    match year {
        Some(y) => definite(num(y)?, month, day),
        None => month_and_day(month, day),
    }
}

fn shifted(date: NaiveDate, days: i64) -> Option<Timex> {
    date.checked_add_signed(TimeDelta::days(days))
        .map(Timex::from_date)
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(date.weekday().num_days_from_monday() as i64)
}

fn relative_day(input: &str) -> Option<i64> {
    match input {
        "today" => Some(0),
        "tomorrow" => Some(1),
        "yesterday" => Some(-1),
        "day after tomorrow" | "the day after tomorrow" => Some(2),
        _ => None,
    }
}

fn relative_period(input: &str, reference: NaiveDate) -> Option<Timex> {
    let week = |offset: i64| {
        let week = (reference + TimeDelta::days(offset * 7)).iso_week();
        Timex {
            year: Some(week.year()),
            week_of_year: Some(week.week()),
            ..Default::default()
        }
    };
    let month = |offset: i32| {
        let index = reference.year() * 12 + reference.month0() as i32 + offset;
        Timex {
            year: Some(index.div_euclid(12)),
            month: Some(index.rem_euclid(12) as u32 + 1),
            ..Default::default()
        }
    };
    match input {
        "this week" => Some(week(0)),
        "next week" => Some(week(1)),
        "last week" => Some(week(-1)),
        "this month" => Some(month(0)),
        "next month" => Some(month(1)),
        "last month" => Some(month(-1)),
        _ => None,
    }
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?;
    let index = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ]
    .iter()
    .position(|m| *m == prefix)?;
    Some(index as u32 + 1)
}
