//! Language understanding for the top-level flow.
//!
//! The bot only needs an intent label and a handful of entity spans per
//! utterance. `CluRecognizer` gets them from a conversational language
//! understanding deployment; tests plug in their own [`IntentRecognizer`].

pub mod clu;

pub use clu::CluRecognizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NluError;

/// Maps raw user text to an intent and entities.
#[async_trait]
pub trait IntentRecognizer: Send + Sync {
    /// Whether the recognizer can be called at all. When `false` the
    /// top-level flow skips recognition and goes straight to booking.
    fn is_configured(&self) -> bool;

    /// Recognize a single utterance.
    async fn recognize(&self, text: &str) -> Result<RecognizedIntent, NluError>;
}

/// Intents the top-level flow acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    BookFlight,
    BookBus,
    Thanks,
    None,
    Other(String),
}

impl Intent {
    pub fn from_label(label: &str) -> Self {
        match label {
            "BookFlight" => Self::BookFlight,
            "BookBus" => Self::BookBus,
            "Thanks" => Self::Thanks,
            "" | "None" => Self::None,
            other => Self::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BookFlight => write!(f, "BookFlight"),
            Self::BookBus => write!(f, "BookBus"),
            Self::Thanks => write!(f, "Thanks"),
            Self::None => write!(f, "None"),
            Self::Other(label) => write!(f, "{label}"),
        }
    }
}

/// Entity categories the booking model emits.
pub mod roles {
    pub const FROM: &str = "from";
    pub const TO: &str = "to";
    pub const STATION: &str = "station";
    pub const AIRPORT: &str = "airport";
    pub const TRAVEL_DATE: &str = "travelDate";
}

/// One extracted entity span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    pub category: String,
    pub text: String,
    /// Character offset into the utterance.
    pub offset: usize,
    pub length: usize,
    /// First date-time resolution, for date entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timex: Option<String>,
}

impl RecognizedEntity {
    pub fn new(category: impl Into<String>, text: impl Into<String>, offset: usize) -> Self {
        let text = text.into();
        Self {
            category: category.into(),
            length: text.chars().count(),
            text,
            offset,
            timex: None,
        }
    }

    pub fn with_timex(mut self, timex: impl Into<String>) -> Self {
        self.timex = Some(timex.into());
        self
    }

    fn overlaps(&self, other: &RecognizedEntity) -> bool {
        self.offset < other.offset + other.length && other.offset < self.offset + self.length
    }
}

/// A location role with any list matches that share its span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationEntities {
    pub text: Option<String>,
    pub station: Option<String>,
    pub airport: Option<String>,
}

impl LocationEntities {
    /// Recognized as a place but not one we can book.
    pub fn is_unsupported(&self) -> bool {
        self.text.is_some() && self.station.is_none() && self.airport.is_none()
    }

    /// Best value to pre-fill a booking field with.
    pub fn resolved(&self) -> Option<String> {
        self.text.clone().or_else(|| self.station.clone())
    }
}

/// Recognizer output for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedIntent {
    pub top_intent: Intent,
    pub entities: Vec<RecognizedEntity>,
}

impl RecognizedIntent {
    pub fn new(top_intent: Intent) -> Self {
        Self {
            top_intent,
            entities: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: RecognizedEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn from_entities(&self) -> LocationEntities {
        self.location(roles::FROM)
    }

    pub fn to_entities(&self) -> LocationEntities {
        self.location(roles::TO)
    }

    /// Travel date as a TIMEX date (time of day dropped).
    pub fn travel_date(&self) -> Option<String> {
        self.entities
            .iter()
            .find(|e| e.category == roles::TRAVEL_DATE)
            .and_then(|e| e.timex.as_deref())
            .and_then(|timex| timex.split('T').next())
            .filter(|date| !date.is_empty())
            .map(str::to_string)
    }

    fn location(&self, role: &str) -> LocationEntities {
        let Some(anchor) = self.entities.iter().find(|e| e.category == role) else {
            return LocationEntities::default();
        };
        let overlapping = |category: &str| {
            self.entities
                .iter()
                .find(|e| e.category == category && e.overlaps(anchor))
                .map(|e| e.text.clone())
        };
        LocationEntities {
            text: Some(anchor.text.clone()),
            station: overlapping(roles::STATION),
            airport: overlapping(roles::AIRPORT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight_to_paris() -> RecognizedIntent {
        // "fly from Atlantis to Paris on 2026-11-03T10"
        RecognizedIntent::new(Intent::BookFlight)
            .with_entity(RecognizedEntity::new(roles::FROM, "Atlantis", 9))
            .with_entity(RecognizedEntity::new(roles::TO, "Paris", 21))
            .with_entity(RecognizedEntity::new(roles::AIRPORT, "Paris", 21))
            .with_entity(
                RecognizedEntity::new(roles::TRAVEL_DATE, "2026-11-03T10", 30)
                    .with_timex("2026-11-03T10"),
            )
    }

    #[test]
    fn intent_labels() {
        assert_eq!(Intent::from_label("BookFlight"), Intent::BookFlight);
        assert_eq!(Intent::from_label("None"), Intent::None);
        assert_eq!(
            Intent::from_label("GetWeather"),
            Intent::Other("GetWeather".into())
        );
        assert_eq!(Intent::Other("GetWeather".into()).to_string(), "GetWeather");
    }

    #[test]
    fn locations_pick_up_overlapping_list_matches() {
        let result = flight_to_paris();
        let to = result.to_entities();
        assert_eq!(to.text.as_deref(), Some("Paris"));
        assert_eq!(to.airport.as_deref(), Some("Paris"));
        assert!(!to.is_unsupported());

        let from = result.from_entities();
        assert_eq!(from.text.as_deref(), Some("Atlantis"));
        assert!(from.is_unsupported());
    }

    #[test]
    fn missing_role_is_empty() {
        let result = RecognizedIntent::new(Intent::BookBus);
        assert_eq!(result.to_entities(), LocationEntities::default());
        assert!(!result.to_entities().is_unsupported());
        assert_eq!(result.travel_date(), None);
    }

    #[test]
    fn travel_date_drops_time_of_day() {
        assert_eq!(flight_to_paris().travel_date().as_deref(), Some("2026-11-03"));
    }
}
