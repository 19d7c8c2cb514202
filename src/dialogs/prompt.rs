//! Prompts — ask, wait one turn, recognize, validate, maybe ask again.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::channels::OutgoingResponse;
use crate::timex::TemporalResolver;

use super::DialogValue;

/// How raw input is turned into a typed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Any non-blank text.
    Text,
    /// Yes or no.
    Confirm,
    /// A date, recognized by the temporal resolver.
    DateTime,
}

impl PromptKind {
    /// Parse `text` into a candidate value. `None` means unparsable.
    pub fn recognize(
        &self,
        text: &str,
        temporal: &dyn TemporalResolver,
        today: NaiveDate,
    ) -> Option<DialogValue> {
        match self {
            Self::Text => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| DialogValue::Text(trimmed.to_string()))
            }
            Self::Confirm => parse_confirmation(text).map(DialogValue::Confirmed),
            Self::DateTime => temporal.recognize(text, today).map(DialogValue::Timex),
        }
    }
}

/// Accepts or rejects a recognized candidate.
pub trait PromptValidator: Send + Sync {
    fn validate(&self, candidate: &DialogValue) -> bool;
}

impl<F> PromptValidator for F
where
    F: Fn(&DialogValue) -> bool + Send + Sync,
{
    fn validate(&self, candidate: &DialogValue) -> bool {
        self(candidate)
    }
}

/// A pending question. Held by the frame that issued it until a turn
/// produces an acceptable answer.
#[derive(Clone)]
pub struct PromptRequest {
    pub kind: PromptKind,
    pub prompt: OutgoingResponse,
    pub retry: Option<OutgoingResponse>,
    validator: Option<Arc<dyn PromptValidator>>,
}

impl PromptRequest {
    pub fn new(kind: PromptKind, prompt: OutgoingResponse) -> Self {
        Self {
            kind,
            prompt,
            retry: None,
            validator: None,
        }
    }

    pub fn text(prompt: OutgoingResponse) -> Self {
        Self::new(PromptKind::Text, prompt)
    }

    pub fn confirm(prompt: OutgoingResponse) -> Self {
        Self::new(PromptKind::Confirm, prompt)
    }

    pub fn date_time(prompt: OutgoingResponse) -> Self {
        Self::new(PromptKind::DateTime, prompt)
    }

    pub fn with_retry(mut self, retry: OutgoingResponse) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_validator(mut self, validator: impl PromptValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Message re-sent after a rejected answer.
    pub fn retry_message(&self) -> &OutgoingResponse {
        self.retry.as_ref().unwrap_or(&self.prompt)
    }

    /// Recognize and validate one answer.
    pub fn evaluate(
        &self,
        text: &str,
        temporal: &dyn TemporalResolver,
        today: NaiveDate,
    ) -> Option<DialogValue> {
        let candidate = self.kind.recognize(text, temporal, today)?;
        match &self.validator {
            Some(validator) if !validator.validate(&candidate) => None,
            _ => Some(candidate),
        }
    }
}

impl fmt::Debug for PromptRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptRequest")
            .field("kind", &self.kind)
            .field("prompt", &self.prompt.content)
            .field("retry", &self.retry.as_ref().map(|r| &r.content))
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Yes/no recognition.
pub fn parse_confirmation(text: &str) -> Option<bool> {
    let lowered = text.trim().trim_end_matches(['.', '!']).to_lowercase();
    match lowered.as_str() {
        "yes" | "y" | "yeah" | "yep" | "yup" | "sure" | "ok" | "okay" | "correct" | "right"
        | "that's right" | "yes please" | "1" => Some(true),
        "no" | "n" | "nope" | "nah" | "incorrect" | "wrong" | "no thanks" | "2" => Some(false),
        _ => None,
    }
}
