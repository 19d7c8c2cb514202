//! Waterfall dialogs — ordered steps over one frame-local options record.

use async_trait::async_trait;

use crate::channels::OutgoingResponse;
use crate::context::TurnContext;
use crate::error::DialogError;

use super::prompt::PromptRequest;
use super::{DialogId, DialogOptions, DialogValue};

/// What a step wants the stack to do next.
#[derive(Debug)]
pub enum StepResult {
    /// Send the prompt and wait for the next turn. The cursor stays put.
    Suspend(PromptRequest),
    /// Push a child dialog; its result resumes the next step.
    Delegate(DialogId, DialogOptions),
    /// Run the next step with this value as its input.
    Advance(Option<DialogValue>),
    /// Pop this frame and hand the result to the parent.
    Complete(Option<DialogValue>),
    /// Unwind the whole stack.
    Cancel,
    /// Pop this frame and begin another dialog in its place.
    Replace(DialogId, DialogOptions),
}

/// Per-step view of the frame and the turn.
pub struct StepContext<'a> {
    pub dialog: DialogId,
    /// Index of the step being run.
    pub index: usize,
    pub options: &'a mut DialogOptions,
    /// Result of the previous step, prompt, or child dialog.
    pub input: Option<DialogValue>,
    pub turn: &'a mut TurnContext,
}

impl StepContext<'_> {
    /// Queue a reply for this turn.
    pub fn send(&mut self, response: OutgoingResponse) {
        self.turn.send(response);
    }

    /// Take the step input, requiring it to be text.
    pub fn take_text(&mut self) -> Result<String, DialogError> {
        match self.input.take() {
            Some(DialogValue::Text(text)) => Ok(text),
            _ => Err(self.unexpected()),
        }
    }

    /// Take the step input, requiring it to be a date expression.
    pub fn take_timex(&mut self) -> Result<String, DialogError> {
        match self.input.take() {
            Some(DialogValue::Timex(timex)) => Ok(timex),
            _ => Err(self.unexpected()),
        }
    }

    pub fn unexpected(&self) -> DialogError {
        DialogError::UnexpectedInput {
            dialog: self.dialog,
            step: self.index,
        }
    }
}

/// A dialog definition. Frames hold the state; the definition is shared.
#[async_trait]
pub trait Dialog: Send + Sync {
    fn id(&self) -> DialogId;

    /// Number of steps in the waterfall.
    fn step_count(&self) -> usize;

    /// Dialogs this one may delegate to. Checked when the set is built.
    fn children(&self) -> &[DialogId] {
        &[]
    }

    /// Run step `ctx.index`.
    async fn run_step(&self, ctx: &mut StepContext<'_>) -> Result<StepResult, DialogError>;
}
