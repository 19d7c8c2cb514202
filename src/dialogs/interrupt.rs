//! Global commands that preempt whatever the active dialog is asking.

use crate::channels::{InputHint, OutgoingResponse};
use crate::context::TurnContext;
use crate::error::DialogError;

use super::registry::DialogSet;
use super::stack::{DialogStack, DialogTurnResult};

/// A recognized global command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalCommand {
    Help,
    Cancel,
    Thanks,
    Welcome,
}

/// What intercepting a command does to the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Leave the stack alone and report waiting.
    KeepWaiting,
    /// Unwind every frame.
    CancelAll,
    /// Leave the stack alone and report complete.
    Complete,
}

struct CommandSpec {
    phrases: &'static [&'static str],
    command: GlobalCommand,
    reply: &'static str,
    input_hint: InputHint,
    action: InterruptAction,
}

const HELP: CommandSpec = CommandSpec {
    phrases: &["help", "?"],
    command: GlobalCommand::Help,
    reply: "I can assist you with booking a bus or flight, modifying a booking, or answering your questions. How can I help you today?",
    input_hint: InputHint::ExpectingInput,
    action: InterruptAction::KeepWaiting,
};

const CANCEL: CommandSpec = CommandSpec {
    phrases: &["cancel", "quit"],
    command: GlobalCommand::Cancel,
    reply: "Cancelling your request. Let me know if there's anything else I can do for you!",
    input_hint: InputHint::IgnoringInput,
    action: InterruptAction::CancelAll,
};

const THANKS: CommandSpec = CommandSpec {
    phrases: &["thanks", "thank you"],
    command: GlobalCommand::Thanks,
    reply: "You're welcome! If you need any further assistance, feel free to ask.",
    input_hint: InputHint::IgnoringInput,
    action: InterruptAction::Complete,
};

const WELCOME: CommandSpec = CommandSpec {
    phrases: &["welcome"],
    command: GlobalCommand::Welcome,
    reply: "Welcome to BookingWebsiteBot! I can help you book buses or flights. How can I assist you today?",
    input_hint: InputHint::ExpectingInput,
    action: InterruptAction::KeepWaiting,
};

/// Lookup order for incoming phrases.
const COMMANDS: &[&CommandSpec] = &[&HELP, &CANCEL, &THANKS, &WELCOME];

impl GlobalCommand {
    /// Match a whole utterance against the command table.
    pub fn parse(text: &str) -> Option<Self> {
        Self::spec_for(text).map(|spec| spec.command)
    }

    pub fn action(&self) -> InterruptAction {
        self.spec().action
    }

    pub fn reply(&self) -> OutgoingResponse {
        let spec = self.spec();
        OutgoingResponse {
            input_hint: spec.input_hint,
            ..OutgoingResponse::expecting(spec.reply)
        }
    }

    fn spec(&self) -> &'static CommandSpec {
        match self {
            Self::Help => &HELP,
            Self::Cancel => &CANCEL,
            Self::Thanks => &THANKS,
            Self::Welcome => &WELCOME,
        }
    }

    fn spec_for(text: &str) -> Option<&'static CommandSpec> {
        let lower = text.trim().to_lowercase();
        COMMANDS
            .iter()
            .copied()
            .find(|spec| spec.phrases.contains(&lower.as_str()))
    }
}

/// Sits in front of [`DialogStack::continue_dialog`].
#[derive(Debug, Default, Clone, Copy)]
pub struct InterruptFilter;

impl InterruptFilter {
    pub fn new() -> Self {
        Self
    }

    /// Answer a global command directly. Returns `None` when the turn
    /// should reach the active dialog.
    pub fn intercept(
        &self,
        stack: &mut DialogStack,
        turn: &mut TurnContext,
    ) -> Option<DialogTurnResult> {
        if stack.is_empty() {
            return None;
        }
        let command = GlobalCommand::parse(turn.text.as_deref()?)?;
        tracing::debug!(
            conversation_id = %turn.conversation_id,
            ?command,
            depth = stack.depth(),
            "Global command intercepted"
        );
        turn.send(command.reply());
        Some(match command.action() {
            InterruptAction::KeepWaiting => DialogTurnResult::waiting(),
            InterruptAction::CancelAll => stack.cancel_all(),
            InterruptAction::Complete => DialogTurnResult::complete(None),
        })
    }

    /// Intercept, or forward the turn unchanged to the stack.
    pub async fn continue_dialog(
        &self,
        stack: &mut DialogStack,
        set: &DialogSet,
        turn: &mut TurnContext,
    ) -> Result<DialogTurnResult, DialogError> {
        match self.intercept(stack, turn) {
            Some(result) => Ok(result),
            None => stack.continue_dialog(set, turn).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dialogs::{
        DateResolverDialog, DateResolverOptions, DialogId, DialogOptions, DialogSetBuilder,
        DialogTurnStatus,
    };
    use crate::timex::TimexResolver;

    #[test]
    fn command_table_lookup() {
        assert_eq!(GlobalCommand::parse("HELP"), Some(GlobalCommand::Help));
        assert_eq!(GlobalCommand::parse(" ? "), Some(GlobalCommand::Help));
        assert_eq!(GlobalCommand::parse("Quit"), Some(GlobalCommand::Cancel));
        assert_eq!(GlobalCommand::parse("thank you"), Some(GlobalCommand::Thanks));
        assert_eq!(GlobalCommand::parse("welcome"), Some(GlobalCommand::Welcome));
        assert_eq!(GlobalCommand::parse("help me book a flight"), None);
    }

    #[test]
    fn replies_carry_input_hints() {
        assert_eq!(GlobalCommand::Help.reply().input_hint, InputHint::ExpectingInput);
        assert_eq!(GlobalCommand::Cancel.reply().input_hint, InputHint::IgnoringInput);
        assert_eq!(GlobalCommand::Thanks.action(), InterruptAction::Complete);

        let help = GlobalCommand::Help.reply();
        assert_eq!(help.speak.as_deref(), Some(help.content.as_str()));
    }

    #[test]
    fn every_command_has_its_own_row() {
        let all = [
            GlobalCommand::Help,
            GlobalCommand::Cancel,
            GlobalCommand::Thanks,
            GlobalCommand::Welcome,
        ];
        for command in all {
            let spec = command.spec();
            assert_eq!(spec.command, command);
            for phrase in spec.phrases {
                assert_eq!(GlobalCommand::parse(phrase), Some(command), "{phrase}");
            }
        }
        assert_eq!(COMMANDS.len(), all.len());
    }

    async fn waiting_stack() -> (DialogStack, DialogSet) {
        let temporal = Arc::new(TimexResolver::new());
        let set = DialogSetBuilder::new(temporal.clone())
            .add(Box::new(DateResolverDialog::new(temporal)))
            .build()
            .unwrap();
        let mut stack = DialogStack::new();
        stack
            .begin(
                &set,
                DialogId::DateResolver,
                DialogOptions::DateResolver(DateResolverOptions::default()),
                &mut TurnContext::new("c", None),
            )
            .await
            .unwrap();
        (stack, set)
    }

    #[tokio::test]
    async fn help_leaves_prompt_pending() {
        let (mut stack, set) = waiting_stack().await;
        let filter = InterruptFilter::new();

        let mut turn = TurnContext::new("c", Some("help".into()));
        let result = filter.continue_dialog(&mut stack, &set, &mut turn).await.unwrap();
        assert_eq!(result.status, DialogTurnStatus::Waiting);
        assert_eq!(turn.responses().len(), 1);
        assert!(turn.responses()[0].content.starts_with("I can assist you"));
        let frame = stack.active().unwrap();
        assert_eq!(frame.cursor, 0);
        assert!(frame.prompt.is_some());
    }

    #[tokio::test]
    async fn cancel_empties_stack() {
        let (mut stack, set) = waiting_stack().await;
        let mut turn = TurnContext::new("c", Some("cancel".into()));
        let result = InterruptFilter::new()
            .continue_dialog(&mut stack, &set, &mut turn)
            .await
            .unwrap();
        assert_eq!(result.status, DialogTurnStatus::Cancelled);
        assert!(stack.is_empty());
    }

    #[tokio::test]
    async fn ordinary_text_reaches_the_dialog() {
        let (mut stack, set) = waiting_stack().await;
        let mut turn = TurnContext::new("c", Some("2026-11-03".into()));
        let result = InterruptFilter::new()
            .continue_dialog(&mut stack, &set, &mut turn)
            .await
            .unwrap();
        assert_eq!(result.status, DialogTurnStatus::Complete);
        assert_eq!(result.result.unwrap().as_timex(), Some("2026-11-03"));
    }

    #[test]
    fn empty_stack_is_never_intercepted() {
        let mut stack = DialogStack::new();
        let mut turn = TurnContext::new("c", Some("help".into()));
        assert!(InterruptFilter::new().intercept(&mut stack, &mut turn).is_none());
        assert!(turn.responses().is_empty());
    }
}
