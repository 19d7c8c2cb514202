//! Booking flow — fills in [`BookingDetails`] one field per step.
//!
//! Every step first stores the previous step's result and then either asks
//! for its own field or, when the caller already supplied it, passes the
//! existing value straight through. A partially pre-filled draft therefore
//! only prompts for what is missing, always in the same order.

use std::sync::Arc;

use async_trait::async_trait;

use crate::channels::OutgoingResponse;
use crate::error::DialogError;
use crate::timex::TemporalResolver;

use super::model::{BookingDetails, BookingType, DateResolverOptions};
use super::prompt::PromptRequest;
use super::waterfall::{Dialog, StepContext, StepResult};
use super::{DialogId, DialogOptions, DialogValue};

const TYPE_PROMPT: &str = "Are you booking a bus or a flight?";
const TYPE_RETRY: &str = "Please answer bus or flight.";

pub struct BookingDialog {
    temporal: Arc<dyn TemporalResolver>,
}

impl BookingDialog {
    pub fn new(temporal: Arc<dyn TemporalResolver>) -> Self {
        Self { temporal }
    }

    fn booking_type_step(details: &BookingDetails) -> StepResult {
        match details.booking_type {
            Some(kind) => StepResult::Advance(Some(DialogValue::Text(kind.as_str().to_string()))),
            None => StepResult::Suspend(
                PromptRequest::text(OutgoingResponse::expecting(TYPE_PROMPT))
                    .with_retry(OutgoingResponse::expecting(TYPE_RETRY))
                    .with_validator(|candidate: &DialogValue| {
                        candidate
                            .as_text()
                            .and_then(BookingType::from_text)
                            .is_some()
                    }),
            ),
        }
    }

    fn place_step(existing: Option<&String>, question: String) -> StepResult {
        match existing {
            Some(place) => StepResult::Advance(Some(DialogValue::Text(place.clone()))),
            None => StepResult::Suspend(PromptRequest::text(OutgoingResponse::expecting(question))),
        }
    }

    fn travel_date_step(&self, details: &BookingDetails) -> StepResult {
        match details.travel_date.as_deref() {
            Some(date) if self.temporal.is_definite(date) => {
                StepResult::Advance(Some(DialogValue::Timex(date.to_string())))
            }
            date => StepResult::Delegate(
                DialogId::DateResolver,
                DialogOptions::DateResolver(DateResolverOptions {
                    date: date.map(str::to_string),
                }),
            ),
        }
    }

    fn confirm_step(details: &BookingDetails) -> StepResult {
        let text = format!(
            "Please confirm, I have you traveling by {} to: {} from: {} on: {}. Is this correct?",
            details.booking_type.map(|t| t.as_str()).unwrap_or_default(),
            details.destination.as_deref().unwrap_or_default(),
            details.origin.as_deref().unwrap_or_default(),
            details.travel_date.as_deref().unwrap_or_default(),
        );
        StepResult::Suspend(PromptRequest::confirm(OutgoingResponse::expecting(text)))
    }
}

#[async_trait]
impl Dialog for BookingDialog {
    fn id(&self) -> DialogId {
        DialogId::Booking
    }

    fn step_count(&self) -> usize {
        6
    }

    fn children(&self) -> &[DialogId] {
        &[DialogId::DateResolver]
    }

    async fn run_step(&self, ctx: &mut StepContext<'_>) -> Result<StepResult, DialogError> {
        let dialog = ctx.dialog;
        match ctx.index {
            0 => Ok(Self::booking_type_step(ctx.options.booking_mut(dialog)?)),
            1 => {
                let kind = BookingType::from_text(&ctx.take_text()?).ok_or_else(|| ctx.unexpected())?;
                let details = ctx.options.booking_mut(dialog)?;
                details.booking_type = Some(kind);
                let question = format!("To what {} would you like to travel?", kind.place_noun());
                Ok(Self::place_step(details.destination.as_ref(), question))
            }
            2 => {
                let destination = ctx.take_text()?;
                let details = ctx.options.booking_mut(dialog)?;
                details.destination = Some(destination);
                let noun = details
                    .booking_type
                    .map(|t| t.place_noun())
                    .unwrap_or("city");
                let question = format!("From what {noun} will you be travelling?");
                Ok(Self::place_step(details.origin.as_ref(), question))
            }
            3 => {
                let origin = ctx.take_text()?;
                let details = ctx.options.booking_mut(dialog)?;
                details.origin = Some(origin);
                Ok(self.travel_date_step(details))
            }
            4 => {
                let date = ctx.take_timex()?;
                let details = ctx.options.booking_mut(dialog)?;
                details.travel_date = Some(date);
                Ok(Self::confirm_step(details))
            }
            5 => {
                let confirmed = matches!(ctx.input, Some(DialogValue::Confirmed(true)));
                let details = ctx.options.booking_mut(dialog)?;
                if confirmed {
                    tracing::info!(
                        conversation_id = %ctx.turn.conversation_id,
                        booking_type = ?details.booking_type,
                        "Booking confirmed"
                    );
                    Ok(StepResult::Complete(Some(DialogValue::Booking(details.clone()))))
                } else {
                    Ok(StepResult::Complete(None))
                }
            }
            _ => Err(ctx.unexpected()),
        }
    }
}
