//! Booking data and per-dialog option records.

use serde::{Deserialize, Serialize};

/// Mode of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Bus,
    Flight,
}

impl BookingType {
    /// Pick the mode out of a free-text answer ("book a flight" → flight).
    /// Returns `None` when neither or both are mentioned.
    pub fn from_text(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        let mut found = None;
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            let kind = match word {
                "bus" | "buses" | "coach" => Self::Bus,
                "flight" | "flights" | "fly" | "plane" => Self::Flight,
                _ => continue,
            };
            match found {
                Some(existing) if existing != kind => return None,
                _ => found = Some(kind),
            }
        }
        found
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bus => "bus",
            Self::Flight => "flight",
        }
    }

    /// What a place is called for this mode of travel.
    pub fn place_noun(&self) -> &'static str {
        match self {
            Self::Bus => "station",
            Self::Flight => "city",
        }
    }
}

impl std::fmt::Display for BookingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The record the booking flow fills in, one field per step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_type: Option<BookingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// TIMEX date expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_date: Option<String>,
}

/// Options for the date resolution sub-dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateResolverOptions {
    /// Candidate date supplied by the caller, possibly ambiguous.
    pub date: Option<String>,
}

/// Options for the top-level flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainOptions {
    /// Replaces the greeting when the flow restarts itself.
    pub restart_msg: Option<String>,
}
