//! Temporal expressions — recognition, definite/ambiguous classification,
//! and natural-language rendering.
//!
//! Values are exchanged as TIMEX strings:
//! - `2026-10-20` a definite date
//! - `XXXX-10-20` month and day, any year
//! - `2026-W43` an ISO week
//! - `XXXX-WXX-5` a weekday (1 = Monday)
//! - `2026-11` a month
//!
//! Anything after a `T` (time of day) is ignored.

mod natural;
mod recognizer;

use std::fmt;

use chrono::{Datelike, NaiveDate};

pub use recognizer::TimexRecognizer;

/// Classifies and renders temporal expressions.
pub trait TemporalResolver: Send + Sync {
    /// Turn free text into a TIMEX string, if it denotes a date at all.
    fn recognize(&self, text: &str, reference: NaiveDate) -> Option<String>;

    /// Whether `timex` pins down a single calendar day.
    fn is_definite(&self, timex: &str) -> bool;

    /// Render `timex` for a human, relative to `reference`.
    fn to_natural_language(&self, timex: &str, reference: NaiveDate) -> String;
}

/// Default resolver backed by [`TimexRecognizer`].
pub struct TimexResolver {
    recognizer: TimexRecognizer,
}

impl TimexResolver {
    pub fn new() -> Self {
        Self {
            recognizer: TimexRecognizer::new(),
        }
    }
}

impl Default for TimexResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporalResolver for TimexResolver {
    fn recognize(&self, text: &str, reference: NaiveDate) -> Option<String> {
        self.recognizer
            .recognize(text, reference)
            .map(|timex| timex.to_string())
    }

    fn is_definite(&self, timex: &str) -> bool {
        Timex::parse(timex).is_some_and(|t| t.is_definite())
    }

    fn to_natural_language(&self, timex: &str, reference: NaiveDate) -> String {
        match Timex::parse(timex) {
            Some(parsed) => natural::describe(&parsed, reference),
            None => timex.to_string(),
        }
    }
}

/// Parsed date part of a TIMEX string. `None` components are unspecified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timex {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day_of_month: Option<u32>,
    pub week_of_year: Option<u32>,
    /// ISO weekday, 1 = Monday.
    pub day_of_week: Option<u32>,
}

impl Timex {
    /// A fully specified date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: Some(date.month()),
            day_of_month: Some(date.day()),
            ..Default::default()
        }
    }

    /// Parse a TIMEX string. Returns `None` for malformed input.
    pub fn parse(value: &str) -> Option<Self> {
        let date_part = value.split('T').next()?.trim();
        if date_part.is_empty() {
            return None;
        }

        let mut parts = date_part.split('-');
        let mut timex = Timex {
            year: component(parts.next()?, 4)?.map(|y| y as i32),
            ..Default::default()
        };

        match parts.next() {
            None => {}
            Some(week) if week.starts_with('W') => {
                timex.week_of_year = component(&week[1..], 2)?;
                if let Some(day) = parts.next() {
                    timex.day_of_week = Some(component(day, 1)??);
                }
            }
            Some(month) => {
                timex.month = component(month, 2)?;
                if let Some(day) = parts.next() {
                    timex.day_of_month = component(day, 2)?;
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        if let Some(m) = timex.month
            && !(1..=12).contains(&m)
        {
            return None;
        }
        if let Some(d) = timex.day_of_month
            && !(1..=31).contains(&d)
        {
            return None;
        }
        if let Some(w) = timex.week_of_year
            && !(1..=53).contains(&w)
        {
            return None;
        }
        if let Some(d) = timex.day_of_week
            && !(1..=7).contains(&d)
        {
            return None;
        }
        Some(timex)
    }

    /// Year, month, and day are all known and form a real date.
    pub fn is_definite(&self) -> bool {
        self.to_date().is_some()
    }

    /// The calendar date, when definite.
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day_of_month?)
    }
}

impl fmt::Display for Timex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(y) => write!(f, "{y:04}")?,
            None => write!(f, "XXXX")?,
        }
        if self.week_of_year.is_some() || self.day_of_week.is_some() {
            write_two(f, "-W", self.week_of_year)?;
            if let Some(d) = self.day_of_week {
                write!(f, "-{d}")?;
            }
        } else if self.month.is_some() || self.day_of_month.is_some() {
            write_two(f, "-", self.month)?;
            if self.day_of_month.is_some() {
                write_two(f, "-", self.day_of_month)?;
            }
        }
        Ok(())
    }
}

fn write_two(f: &mut fmt::Formatter<'_>, prefix: &str, value: Option<u32>) -> fmt::Result {
    match value {
        Some(v) => write!(f, "{prefix}{v:02}"),
        None => write!(f, "{prefix}XX"),
    }
}

/// `Some(None)` for an `X` placeholder, `Some(Some(n))` for digits, `None`
/// for anything else.
fn component(raw: &str, width: usize) -> Option<Option<u32>> {
    if raw.len() != width {
        return None;
    }
    if raw.chars().all(|c| c == 'X') {
        return Some(None);
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse().ok().map(Some);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> NaiveDate {
        // A Friday.
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn parse_definite_date() {
        let t = Timex::parse("2026-10-20").unwrap();
        assert!(t.is_definite());
        assert_eq!(t.to_string(), "2026-10-20");
    }

    #[test]
    fn parse_ignores_time_part() {
        let t = Timex::parse("2026-10-20T09").unwrap();
        assert!(t.is_definite());
    }

    #[test]
    fn ambiguous_shapes_are_not_definite() {
        for value in ["XXXX-10-20", "2026-W43", "XXXX-WXX-5", "2026-11", "2026"] {
            let t = Timex::parse(value).unwrap_or_else(|| panic!("{value} should parse"));
            assert!(!t.is_definite(), "{value} should be ambiguous");
            assert_eq!(t.to_string(), value, "display should round-trip {value}");
        }
    }

    #[test]
    fn malformed_values_are_rejected() {
        for value in ["", "tomorrow", "2026-13-01", "2026-10-40", "26-10-20", "2026-W60", "2026-10-20-1"] {
            assert!(Timex::parse(value).is_none(), "{value} should not parse");
        }
    }

    #[test]
    fn impossible_day_is_not_definite() {
        let t = Timex::parse("2026-02-30").unwrap();
        assert!(!t.is_definite());
    }

    #[test]
    fn resolver_round_trip_through_trait() {
        let resolver = TimexResolver::new();
        let timex = resolver.recognize("tomorrow", reference()).unwrap();
        assert_eq!(timex, "2026-10-17");
        assert!(resolver.is_definite(&timex));
        assert_eq!(resolver.to_natural_language(&timex, reference()), "tomorrow");
    }

    #[test]
    fn resolver_passes_through_unparsable_timex() {
        let resolver = TimexResolver::new();
        assert!(!resolver.is_definite("garbage"));
        assert_eq!(resolver.to_natural_language("garbage", reference()), "garbage");
    }
}
