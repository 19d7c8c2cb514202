//! Date resolution — keeps asking until the travel date is definite.

use std::sync::Arc;

use async_trait::async_trait;

use crate::channels::OutgoingResponse;
use crate::error::DialogError;
use crate::timex::TemporalResolver;

use super::prompt::PromptRequest;
use super::waterfall::{Dialog, StepContext, StepResult};
use super::{DateResolverOptions, DialogId, DialogValue};

const PROMPT: &str = "On what date would you like to travel? Please provide the month, day, and year.";
const RETRY: &str =
    "I'm sorry, I didn't understand. Please provide the travel date in MM/DD/YYYY format.";

/// Where the sub-dialog stands on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateResolverState {
    /// No usable date yet. `retry` is set when the caller's date was ambiguous.
    AwaitingInput { retry: bool },
    /// A definite date; no turn is needed.
    Resolved(String),
}

pub struct DateResolverDialog {
    temporal: Arc<dyn TemporalResolver>,
}

impl DateResolverDialog {
    pub fn new(temporal: Arc<dyn TemporalResolver>) -> Self {
        Self { temporal }
    }

    pub fn classify_entry(&self, options: &DateResolverOptions) -> DateResolverState {
        match options.date.as_deref() {
            None => DateResolverState::AwaitingInput { retry: false },
            Some(date) if self.temporal.is_definite(date) => {
                DateResolverState::Resolved(date.to_string())
            }
            Some(_) => DateResolverState::AwaitingInput { retry: true },
        }
    }

    fn prompt(&self, retry: bool) -> PromptRequest {
        let temporal = self.temporal.clone();
        let first = if retry { RETRY } else { PROMPT };
        PromptRequest::date_time(OutgoingResponse::expecting(first))
            .with_retry(OutgoingResponse::expecting(RETRY))
            .with_validator(move |candidate: &DialogValue| {
                candidate
                    .as_timex()
                    .is_some_and(|timex| temporal.is_definite(timex))
            })
    }
}

#[async_trait]
impl Dialog for DateResolverDialog {
    fn id(&self) -> DialogId {
        DialogId::DateResolver
    }

    fn step_count(&self) -> usize {
        2
    }

    async fn run_step(&self, ctx: &mut StepContext<'_>) -> Result<StepResult, DialogError> {
        match ctx.index {
            0 => {
                let options = ctx.options.date_resolver_mut(ctx.dialog)?;
                Ok(match self.classify_entry(options) {
                    DateResolverState::AwaitingInput { retry } => {
                        StepResult::Suspend(self.prompt(retry))
                    }
                    DateResolverState::Resolved(timex) => {
                        StepResult::Advance(Some(DialogValue::Timex(timex)))
                    }
                })
            }
            1 => {
                let timex = ctx.take_timex()?;
                tracing::debug!(%timex, "Travel date resolved");
                Ok(StepResult::Complete(Some(DialogValue::Timex(timex))))
            }
            _ => Err(ctx.unexpected()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::context::TurnContext;
    use crate::dialogs::{DialogOptions, DialogSet, DialogSetBuilder, DialogStack, DialogTurnStatus};
    use crate::timex::TimexResolver;

    fn temporal() -> Arc<dyn TemporalResolver> {
        Arc::new(TimexResolver::new())
    }

    fn set() -> DialogSet {
        DialogSetBuilder::new(temporal())
            .add(Box::new(DateResolverDialog::new(temporal())))
            .build()
            .unwrap()
    }

    fn turn(text: Option<&str>) -> TurnContext {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        TurnContext::at("c", text.map(str::to_string), now)
    }

    fn options(date: Option<&str>) -> DialogOptions {
        DialogOptions::DateResolver(DateResolverOptions {
            date: date.map(str::to_string),
        })
    }

    #[test]
    fn entry_classification() {
        let dialog = DateResolverDialog::new(temporal());
        let classify = |date: Option<&str>| {
            dialog.classify_entry(&DateResolverOptions {
                date: date.map(str::to_string),
            })
        };
        assert_eq!(classify(None), DateResolverState::AwaitingInput { retry: false });
        assert_eq!(classify(Some("2026-W43")), DateResolverState::AwaitingInput { retry: true });
        assert_eq!(
            classify(Some("2026-11-03")),
            DateResolverState::Resolved("2026-11-03".into())
        );
    }

    #[tokio::test]
    async fn definite_date_resolves_without_a_turn() {
        let set = set();
        let mut stack = DialogStack::new();
        let mut t = turn(None);
        let result = stack
            .begin(&set, DialogId::DateResolver, options(Some("2026-11-03")), &mut t)
            .await
            .unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);
        assert_eq!(result.result, Some(DialogValue::Timex("2026-11-03".into())));
        assert!(t.responses().is_empty());
    }

    #[tokio::test]
    async fn ambiguous_entry_opens_with_retry_text() {
        let set = set();
        let mut stack = DialogStack::new();
        let mut t = turn(None);
        stack
            .begin(&set, DialogId::DateResolver, options(Some("XXXX-WXX-5")), &mut t)
            .await
            .unwrap();
        assert_eq!(t.responses()[0].content, RETRY);
    }

    #[tokio::test]
    async fn n_ambiguous_answers_issue_n_plus_one_prompts() {
        let set = set();
        let mut stack = DialogStack::new();
        let mut prompts = 0;

        let mut t = turn(None);
        stack
            .begin(&set, DialogId::DateResolver, options(None), &mut t)
            .await
            .unwrap();
        prompts += t.responses().len();
        assert_eq!(t.responses()[0].content, PROMPT);

        for answer in ["next week", "friday", "soon", "next month"] {
            let mut t = turn(Some(answer));
            let result = stack.continue_dialog(&set, &mut t).await.unwrap();
            assert_eq!(result.status, DialogTurnStatus::Waiting);
            assert_eq!(t.responses()[0].content, RETRY);
            prompts += t.responses().len();
        }

        let mut t = turn(Some("11/03/2026"));
        let result = stack.continue_dialog(&set, &mut t).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);
        assert_eq!(result.result, Some(DialogValue::Timex("2026-11-03".into())));
        assert!(t.responses().is_empty());
        assert_eq!(prompts, 5);
    }
}
