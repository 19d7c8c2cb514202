//! Top-level flow: greet, recognize, book, announce, start over.

use std::sync::Arc;

use async_trait::async_trait;

use crate::channels::OutgoingResponse;
use crate::error::DialogError;
use crate::nlu::{Intent, IntentRecognizer, RecognizedIntent};
use crate::timex::TemporalResolver;

use super::model::{BookingDetails, BookingType, MainOptions};
use super::prompt::PromptRequest;
use super::waterfall::{Dialog, StepContext, StepResult};
use super::{DialogId, DialogOptions, DialogValue};

const GREETING: &str = "Hello there! How can I help you today?";
const RESTART: &str = "What else can I do for you?";
const NLU_NOT_CONFIGURED: &str = "NOTE: CLU is not configured. To enable all capabilities, set CLU_API_KEY, CLU_API_HOST_NAME, CLU_PROJECT_NAME and CLU_DEPLOYMENT_NAME.";
const THANKS_REPLY: &str = "You're welcome! Let me know if there's anything else I can assist you with.";

pub struct MainDialog {
    recognizer: Arc<dyn IntentRecognizer>,
    temporal: Arc<dyn TemporalResolver>,
}

impl MainDialog {
    pub fn new(recognizer: Arc<dyn IntentRecognizer>, temporal: Arc<dyn TemporalResolver>) -> Self {
        Self {
            recognizer,
            temporal,
        }
    }

    fn intro(&self, ctx: &mut StepContext<'_>) -> Result<StepResult, DialogError> {
        if !self.recognizer.is_configured() {
            ctx.send(OutgoingResponse::text(NLU_NOT_CONFIGURED));
            return Ok(StepResult::Advance(None));
        }
        let options = ctx.options.main_mut(ctx.dialog)?;
        let greeting = options.restart_msg.as_deref().unwrap_or(GREETING);
        Ok(StepResult::Suspend(PromptRequest::text(
            OutgoingResponse::expecting(greeting),
        )))
    }

    async fn act(&self, ctx: &mut StepContext<'_>) -> Result<StepResult, DialogError> {
        if !self.recognizer.is_configured() {
            return Ok(delegate_booking(BookingDetails::default()));
        }

        let text = ctx.take_text()?;
        let recognized = self.recognizer.recognize(&text).await?;
        tracing::debug!(
            conversation_id = %ctx.turn.conversation_id,
            intent = %recognized.top_intent,
            "Intent recognized"
        );

        let booking_type = match &recognized.top_intent {
            Intent::BookFlight => BookingType::Flight,
            Intent::BookBus => BookingType::Bus,
            Intent::Thanks => {
                ctx.send(OutgoingResponse::ignoring(THANKS_REPLY));
                return Ok(StepResult::Advance(None));
            }
            other => {
                ctx.send(OutgoingResponse::ignoring(format!(
                    "Sorry, I didn't get that. Please try asking in a different way (intent was {other})."
                )));
                return Ok(StepResult::Advance(None));
            }
        };

        if let Some(warning) = unsupported_locations(&recognized) {
            ctx.send(OutgoingResponse::ignoring(warning));
        }

        Ok(delegate_booking(BookingDetails {
            booking_type: Some(booking_type),
            destination: recognized.to_entities().resolved(),
            origin: recognized.from_entities().resolved(),
            travel_date: recognized.travel_date(),
        }))
    }

    fn finish(&self, ctx: &mut StepContext<'_>) -> StepResult {
        if let Some(DialogValue::Booking(details)) = ctx.input.take() {
            let date = details
                .travel_date
                .as_deref()
                .map(|timex| self.temporal.to_natural_language(timex, ctx.turn.today()))
                .unwrap_or_default();
            ctx.send(OutgoingResponse::ignoring(format!(
                "I have you booked for a {} to {} from {} on {}.",
                details.booking_type.map(|t| t.as_str()).unwrap_or_default(),
                details.destination.as_deref().unwrap_or_default(),
                details.origin.as_deref().unwrap_or_default(),
                date,
            )));
        }
        StepResult::Replace(
            DialogId::Main,
            DialogOptions::Main(MainOptions {
                restart_msg: Some(RESTART.to_string()),
            }),
        )
    }
}

fn delegate_booking(details: BookingDetails) -> StepResult {
    StepResult::Delegate(DialogId::Booking, DialogOptions::Booking(details))
}

/// Locations the model recognized that match no known station or airport.
fn unsupported_locations(recognized: &RecognizedIntent) -> Option<String> {
    let unsupported: Vec<String> = [recognized.from_entities(), recognized.to_entities()]
        .into_iter()
        .filter(|location| location.is_unsupported())
        .filter_map(|location| location.text)
        .collect();
    if unsupported.is_empty() {
        return None;
    }
    tracing::warn!(locations = ?unsupported, "Unsupported locations requested");
    Some(format!(
        "Sorry, but the following locations are not supported: {}",
        unsupported.join(", ")
    ))
}

#[async_trait]
impl Dialog for MainDialog {
    fn id(&self) -> DialogId {
        DialogId::Main
    }

    fn step_count(&self) -> usize {
        3
    }

    fn children(&self) -> &[DialogId] {
        &[DialogId::Booking]
    }

    async fn run_step(&self, ctx: &mut StepContext<'_>) -> Result<StepResult, DialogError> {
        match ctx.index {
            0 => self.intro(ctx),
            1 => self.act(ctx).await,
            2 => Ok(self.finish(ctx)),
            _ => Err(ctx.unexpected()),
        }
    }
}
