//! Turn context — one inbound turn and the replies it produces.

use chrono::{DateTime, NaiveDate, Utc};

use crate::channels::OutgoingResponse;

/// Everything a dialog step can see about the current turn.
///
/// Replies are buffered here and handed to the channel once the turn has
/// been fully processed.
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// Conversation this turn belongs to.
    pub conversation_id: String,
    /// Raw user text; `None` for non-text activity such as a conversation start.
    pub text: Option<String>,
    /// Reference instant for relative dates.
    pub now: DateTime<Utc>,
    responses: Vec<OutgoingResponse>,
}

impl TurnContext {
    /// Create a turn context stamped with the current time.
    pub fn new(conversation_id: impl Into<String>, text: Option<String>) -> Self {
        Self::at(conversation_id, text, Utc::now())
    }

    /// Create a turn context with an explicit reference instant.
    pub fn at(conversation_id: impl Into<String>, text: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text,
            now,
            responses: Vec::new(),
        }
    }

    /// The user's text, or an empty string for non-text turns.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Calendar date used when resolving relative expressions.
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Queue a reply for this turn.
    pub fn send(&mut self, response: OutgoingResponse) {
        self.responses.push(response);
    }

    /// Replies queued so far.
    pub fn responses(&self) -> &[OutgoingResponse] {
        &self.responses
    }

    /// Consume the context, returning the queued replies.
    pub fn into_responses(self) -> Vec<OutgoingResponse> {
        self.responses
    }
}
