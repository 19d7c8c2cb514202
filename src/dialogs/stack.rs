//! Dialog stack — the per-conversation orchestrator.
//!
//! Every operation ends up in [`DialogStack::drive`], a trampoline that keeps
//! applying step results until a frame suspends on a prompt or the stack
//! empties. A child that completes without ever suspending pops and resumes
//! its parent in the same loop, so chains of instantly-completing dialogs
//! resolve within one turn and without recursion.

use serde::{Deserialize, Serialize};

use crate::context::TurnContext;
use crate::error::DialogError;

use super::prompt::PromptRequest;
use super::registry::DialogSet;
use super::waterfall::{StepContext, StepResult};
use super::{DialogId, DialogOptions, DialogValue};

/// Outcome of routing one turn into the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogTurnStatus {
    /// No active dialog; the caller should begin one.
    Empty,
    /// A frame is waiting on the next turn.
    Waiting,
    /// The root dialog finished.
    Complete,
    /// The stack was unwound.
    Cancelled,
}

impl std::fmt::Display for DialogTurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Empty => "empty",
            Self::Waiting => "waiting",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogTurnResult {
    pub status: DialogTurnStatus,
    /// Result of the root dialog, on `Complete`.
    pub result: Option<DialogValue>,
}

impl DialogTurnResult {
    pub fn empty() -> Self {
        Self::with_status(DialogTurnStatus::Empty)
    }

    pub fn waiting() -> Self {
        Self::with_status(DialogTurnStatus::Waiting)
    }

    pub fn cancelled() -> Self {
        Self::with_status(DialogTurnStatus::Cancelled)
    }

    pub fn complete(result: Option<DialogValue>) -> Self {
        Self {
            status: DialogTurnStatus::Complete,
            result,
        }
    }

    fn with_status(status: DialogTurnStatus) -> Self {
        Self {
            status,
            result: None,
        }
    }
}

/// One activation of a dialog.
#[derive(Debug, Clone)]
pub struct Frame {
    pub dialog: DialogId,
    /// Index of the step currently running or waiting.
    pub cursor: usize,
    pub options: DialogOptions,
    /// Question this frame is waiting on, if suspended.
    pub prompt: Option<PromptRequest>,
    /// Rejected answers to the current prompt.
    pub retries: u32,
}

impl Frame {
    fn new(dialog: DialogId, options: DialogOptions) -> Self {
        Self {
            dialog,
            cursor: 0,
            options,
            prompt: None,
            retries: 0,
        }
    }
}

enum Next {
    /// Run the step at the top frame's cursor with this input.
    Run(Option<DialogValue>),
    /// Apply a step result to the top frame.
    Apply(StepResult),
}

/// Stack of active frames for one conversation. Innermost frame is last.
#[derive(Debug, Default)]
pub struct DialogStack {
    frames: Vec<Frame>,
}

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The frame that receives the next turn.
    pub fn active(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Route the turn's text to the top frame's pending prompt.
    ///
    /// An accepted answer resumes the waterfall at the next step. A rejected
    /// one re-sends the retry message and leaves the cursor where it is.
    pub async fn continue_dialog(
        &mut self,
        set: &DialogSet,
        turn: &mut TurnContext,
    ) -> Result<DialogTurnResult, DialogError> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(DialogTurnResult::empty());
        };
        let Some(prompt) = frame.prompt.as_ref() else {
            return Err(DialogError::NotAwaitingInput(frame.dialog));
        };

        match prompt.evaluate(turn.text(), set.temporal(), turn.today()) {
            Some(value) => {
                frame.prompt = None;
                frame.retries = 0;
                self.drive(set, turn, Next::Apply(StepResult::Advance(Some(value))))
                    .await
            }
            None => {
                frame.retries = frame.retries.saturating_add(1);
                tracing::warn!(
                    conversation_id = %turn.conversation_id,
                    dialog = %frame.dialog,
                    step = frame.cursor,
                    retries = frame.retries,
                    "Prompt answer rejected, re-prompting"
                );
                turn.send(prompt.retry_message().clone());
                Ok(DialogTurnResult::waiting())
            }
        }
    }

    /// Push `dialog` and run it until it suspends or completes.
    pub async fn begin(
        &mut self,
        set: &DialogSet,
        dialog: DialogId,
        options: DialogOptions,
        turn: &mut TurnContext,
    ) -> Result<DialogTurnResult, DialogError> {
        self.push(set, dialog, options)?;
        self.drive(set, turn, Next::Run(None)).await
    }

    /// Pop the top frame, resuming its parent with `result`.
    pub async fn end(
        &mut self,
        set: &DialogSet,
        result: Option<DialogValue>,
        turn: &mut TurnContext,
    ) -> Result<DialogTurnResult, DialogError> {
        if self.frames.is_empty() {
            return Ok(DialogTurnResult::empty());
        }
        self.drive(set, turn, Next::Apply(StepResult::Complete(result)))
            .await
    }

    /// Drop every frame. No step runs.
    pub fn cancel_all(&mut self) -> DialogTurnResult {
        if !self.frames.is_empty() {
            tracing::debug!(depth = self.frames.len(), "Cancelling all dialogs");
        }
        self.frames.clear();
        DialogTurnResult::cancelled()
    }

    fn push(
        &mut self,
        set: &DialogSet,
        dialog: DialogId,
        options: DialogOptions,
    ) -> Result<(), DialogError> {
        if !set.contains(dialog) {
            return Err(DialogError::UnknownDialog(dialog));
        }
        tracing::debug!(%dialog, depth = self.frames.len() + 1, "Dialog pushed");
        self.frames.push(Frame::new(dialog, options));
        Ok(())
    }

    async fn drive(
        &mut self,
        set: &DialogSet,
        turn: &mut TurnContext,
        mut next: Next,
    ) -> Result<DialogTurnResult, DialogError> {
        loop {
            let result = match next {
                Next::Apply(result) => result,
                Next::Run(input) => {
                    let Some(frame) = self.frames.last_mut() else {
                        return Ok(DialogTurnResult::empty());
                    };
                    let dialog = set.get(frame.dialog)?;
                    if frame.cursor >= dialog.step_count() {
                        StepResult::Complete(input)
                    } else {
                        tracing::debug!(
                            conversation_id = %turn.conversation_id,
                            dialog = %frame.dialog,
                            step = frame.cursor,
                            "Running step"
                        );
                        let mut ctx = StepContext {
                            dialog: frame.dialog,
                            index: frame.cursor,
                            options: &mut frame.options,
                            input,
                            turn: &mut *turn,
                        };
                        dialog.run_step(&mut ctx).await?
                    }
                }
            };

            next = match result {
                StepResult::Suspend(prompt) => {
                    let Some(frame) = self.frames.last_mut() else {
                        return Ok(DialogTurnResult::empty());
                    };
                    turn.send(prompt.prompt.clone());
                    frame.prompt = Some(prompt);
                    frame.retries = 0;
                    return Ok(DialogTurnResult::waiting());
                }
                StepResult::Advance(value) => {
                    let Some(frame) = self.frames.last_mut() else {
                        return Ok(DialogTurnResult::empty());
                    };
                    frame.cursor += 1;
                    Next::Run(value)
                }
                StepResult::Complete(value) => {
                    if let Some(done) = self.frames.pop() {
                        tracing::debug!(dialog = %done.dialog, depth = self.frames.len(), "Dialog completed");
                    }
                    match self.frames.last_mut() {
                        Some(parent) => {
                            parent.cursor += 1;
                            Next::Run(value)
                        }
                        None => return Ok(DialogTurnResult::complete(value)),
                    }
                }
                StepResult::Delegate(child, options) => {
                    self.push(set, child, options)?;
                    Next::Run(None)
                }
                StepResult::Replace(dialog, options) => {
                    if let Some(done) = self.frames.pop() {
                        tracing::debug!(from = %done.dialog, to = %dialog, "Dialog replaced");
                    }
                    self.push(set, dialog, options)?;
                    Next::Run(None)
                }
                StepResult::Cancel => return Ok(self.cancel_all()),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::channels::OutgoingResponse;
    use crate::dialogs::{BookingDetails, DateResolverOptions, Dialog, DialogSetBuilder, MainOptions};
    use crate::timex::TimexResolver;

    type Step = Box<dyn Fn(&mut StepContext<'_>) -> StepResult + Send + Sync>;

    fn step(f: impl Fn(&mut StepContext<'_>) -> StepResult + Send + Sync + 'static) -> Step {
        Box::new(f)
    }

    struct ScriptedDialog {
        id: DialogId,
        steps: Vec<Step>,
    }

    impl ScriptedDialog {
        fn new(id: DialogId, steps: Vec<Step>) -> Box<Self> {
            Box::new(Self { id, steps })
        }
    }

    #[async_trait]
    impl Dialog for ScriptedDialog {
        fn id(&self) -> DialogId {
            self.id
        }

        fn step_count(&self) -> usize {
            self.steps.len()
        }

        async fn run_step(&self, ctx: &mut StepContext<'_>) -> Result<StepResult, DialogError> {
            Ok((self.steps[ctx.index])(ctx))
        }
    }

    fn set(dialogs: Vec<Box<ScriptedDialog>>) -> DialogSet {
        let mut builder = DialogSetBuilder::new(Arc::new(TimexResolver::new()));
        for dialog in dialogs {
            builder = builder.add(dialog);
        }
        builder.build().unwrap()
    }

    fn turn(text: &str) -> TurnContext {
        TurnContext::new("test", Some(text.to_string()))
    }

    fn contents(turn: &TurnContext) -> Vec<&str> {
        turn.responses().iter().map(|r| r.content.as_str()).collect()
    }

    #[tokio::test]
    async fn instantly_completing_children_resolve_in_one_turn() {
        let set = set(vec![
            ScriptedDialog::new(
                DialogId::Main,
                vec![
                    step(|_| {
                        StepResult::Delegate(
                            DialogId::Booking,
                            DialogOptions::Booking(BookingDetails::default()),
                        )
                    }),
                    step(|ctx| {
                        let said = ctx.input.as_ref().and_then(|v| v.as_text()).unwrap_or("nothing");
                        StepResult::Suspend(PromptRequest::text(OutgoingResponse::expecting(
                            format!("child said {said}"),
                        )))
                    }),
                ],
            ),
            ScriptedDialog::new(
                DialogId::Booking,
                vec![
                    step(|_| {
                        StepResult::Delegate(
                            DialogId::DateResolver,
                            DialogOptions::DateResolver(DateResolverOptions::default()),
                        )
                    }),
                    step(|ctx| StepResult::Complete(ctx.input.take())),
                ],
            ),
            ScriptedDialog::new(
                DialogId::DateResolver,
                vec![step(|_| {
                    StepResult::Complete(Some(DialogValue::Text("resolved".into())))
                })],
            ),
        ]);

        let mut stack = DialogStack::new();
        let mut turn = turn("");
        let result = stack
            .begin(&set, DialogId::Main, DialogOptions::Main(MainOptions::default()), &mut turn)
            .await
            .unwrap();

        assert_eq!(result.status, DialogTurnStatus::Waiting);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.active().unwrap().cursor, 1);
        assert_eq!(contents(&turn), vec!["child said resolved"]);
    }

    #[tokio::test]
    async fn unknown_dialog_is_fatal() {
        let set = set(vec![ScriptedDialog::new(
            DialogId::Main,
            vec![step(|_| {
                StepResult::Delegate(
                    DialogId::Booking,
                    DialogOptions::Booking(BookingDetails::default()),
                )
            })],
        )]);

        let mut stack = DialogStack::new();
        let err = stack
            .begin(&set, DialogId::Main, DialogOptions::Main(MainOptions::default()), &mut turn(""))
            .await
            .unwrap_err();
        assert!(matches!(err, DialogError::UnknownDialog(DialogId::Booking)));
        assert!(!err.is_recoverable());

        let mut fresh = DialogStack::new();
        let err = fresh
            .begin(
                &set,
                DialogId::DateResolver,
                DialogOptions::DateResolver(DateResolverOptions::default()),
                &mut turn(""),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DialogError::UnknownDialog(DialogId::DateResolver)));
        assert!(fresh.is_empty());
    }

    #[tokio::test]
    async fn rejected_answer_retries_same_step() {
        let set = set(vec![ScriptedDialog::new(
            DialogId::Main,
            vec![
                step(|_| {
                    StepResult::Suspend(
                        PromptRequest::confirm(OutgoingResponse::expecting("Is this correct?"))
                            .with_retry(OutgoingResponse::expecting("Yes or no?")),
                    )
                }),
                step(|ctx| StepResult::Complete(ctx.input.take())),
            ],
        )]);

        let mut stack = DialogStack::new();
        let mut first = turn("");
        stack
            .begin(&set, DialogId::Main, DialogOptions::Main(MainOptions::default()), &mut first)
            .await
            .unwrap();
        assert_eq!(contents(&first), vec!["Is this correct?"]);

        let mut second = turn("maybe");
        let result = stack.continue_dialog(&set, &mut second).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Waiting);
        assert_eq!(contents(&second), vec!["Yes or no?"]);
        let frame = stack.active().unwrap();
        assert_eq!(frame.cursor, 0);
        assert_eq!(frame.retries, 1);

        // Re-prompting is unbounded; the counter pins at its ceiling.
        stack.frames.last_mut().unwrap().retries = u32::MAX;
        let mut again = turn("perhaps");
        stack.continue_dialog(&set, &mut again).await.unwrap();
        assert_eq!(contents(&again), vec!["Yes or no?"]);
        assert_eq!(stack.active().unwrap().retries, u32::MAX);

        let mut third = turn("yes");
        let result = stack.continue_dialog(&set, &mut third).await.unwrap();
        assert_eq!(result, DialogTurnResult::complete(Some(DialogValue::Confirmed(true))));
        assert!(stack.is_empty());
        assert!(third.responses().is_empty());
    }

    fn nested_set() -> DialogSet {
        set(vec![
            ScriptedDialog::new(
                DialogId::Main,
                vec![
                    step(|_| {
                        StepResult::Delegate(
                            DialogId::Booking,
                            DialogOptions::Booking(BookingDetails::default()),
                        )
                    }),
                    step(|ctx| StepResult::Complete(ctx.input.take())),
                ],
            ),
            ScriptedDialog::new(
                DialogId::Booking,
                vec![step(|_| {
                    StepResult::Suspend(PromptRequest::text(OutgoingResponse::expecting("Where?")))
                })],
            ),
        ])
    }

    #[tokio::test]
    async fn end_resumes_parent_with_result() {
        let set = nested_set();
        let mut stack = DialogStack::new();
        stack
            .begin(&set, DialogId::Main, DialogOptions::Main(MainOptions::default()), &mut turn(""))
            .await
            .unwrap();
        assert_eq!(stack.depth(), 2);

        let result = stack
            .end(&set, Some(DialogValue::Text("early".into())), &mut turn(""))
            .await
            .unwrap();
        assert_eq!(result, DialogTurnResult::complete(Some(DialogValue::Text("early".into()))));
        assert!(stack.is_empty());
    }

    #[tokio::test]
    async fn cancel_all_unwinds_every_frame() {
        let set = nested_set();
        let mut stack = DialogStack::new();
        stack
            .begin(&set, DialogId::Main, DialogOptions::Main(MainOptions::default()), &mut turn(""))
            .await
            .unwrap();

        assert_eq!(stack.cancel_all().status, DialogTurnStatus::Cancelled);
        assert!(stack.is_empty());

        let result = stack.continue_dialog(&set, &mut turn("Boston")).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Empty);
    }

    #[tokio::test]
    async fn replace_restarts_in_place() {
        let set = set(vec![ScriptedDialog::new(
            DialogId::Main,
            vec![
                step(|ctx| {
                    let text = match &*ctx.options {
                        DialogOptions::Main(MainOptions { restart_msg: Some(msg) }) => msg.clone(),
                        _ => "Hello".to_string(),
                    };
                    StepResult::Suspend(PromptRequest::text(OutgoingResponse::expecting(text)))
                }),
                step(|_| {
                    StepResult::Replace(
                        DialogId::Main,
                        DialogOptions::Main(MainOptions {
                            restart_msg: Some("Again?".into()),
                        }),
                    )
                }),
            ],
        )]);

        let mut stack = DialogStack::new();
        stack
            .begin(&set, DialogId::Main, DialogOptions::Main(MainOptions::default()), &mut turn(""))
            .await
            .unwrap();

        let mut next = turn("anything");
        let result = stack.continue_dialog(&set, &mut next).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Waiting);
        assert_eq!(contents(&next), vec!["Again?"]);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.active().unwrap().cursor, 0);
    }
}
