//! Dialog orchestration — a per-conversation stack of waterfall dialogs.
//!
//! A turn flows through the [`InterruptFilter`] into the [`DialogStack`],
//! which resumes the top frame's pending prompt and then keeps running
//! waterfall steps until one of them suspends on a new prompt or the stack
//! empties. Nested dialogs are pushed with [`StepResult::Delegate`] and hand
//! their result back to the parent's next step when they complete.

pub mod booking;
pub mod date_resolver;
pub mod interrupt;
pub mod main_dialog;
pub mod model;
pub mod prompt;
pub mod registry;
pub mod stack;
pub mod waterfall;

pub use booking::BookingDialog;
pub use date_resolver::{DateResolverDialog, DateResolverState};
pub use interrupt::{GlobalCommand, InterruptAction, InterruptFilter};
pub use main_dialog::MainDialog;
pub use model::{BookingDetails, BookingType, DateResolverOptions, MainOptions};
pub use prompt::{PromptKind, PromptRequest, PromptValidator};
pub use registry::{DialogSet, DialogSetBuilder};
pub use stack::{DialogStack, DialogTurnResult, DialogTurnStatus, Frame};
pub use waterfall::{Dialog, StepContext, StepResult};

use serde::{Deserialize, Serialize};

use crate::error::DialogError;

/// Every dialog the bot knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogId {
    Main,
    Booking,
    DateResolver,
}

impl std::fmt::Display for DialogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Main => "main",
            Self::Booking => "booking",
            Self::DateResolver => "date_resolver",
        };
        write!(f, "{s}")
    }
}

/// A value passed between steps: a prompt answer or a child dialog's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogValue {
    Text(String),
    Confirmed(bool),
    /// A TIMEX date expression.
    Timex(String),
    Booking(BookingDetails),
}

impl DialogValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_timex(&self) -> Option<&str> {
        match self {
            Self::Timex(timex) => Some(timex),
            _ => None,
        }
    }
}

/// Caller-supplied options for a frame, mutated in place by its steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOptions {
    Main(MainOptions),
    Booking(BookingDetails),
    DateResolver(DateResolverOptions),
}

impl DialogOptions {
    pub fn main_mut(&mut self, dialog: DialogId) -> Result<&mut MainOptions, DialogError> {
        match self {
            Self::Main(options) => Ok(options),
            _ => Err(DialogError::OptionsMismatch {
                dialog,
                expected: "main options",
            }),
        }
    }

    pub fn booking_mut(&mut self, dialog: DialogId) -> Result<&mut BookingDetails, DialogError> {
        match self {
            Self::Booking(details) => Ok(details),
            _ => Err(DialogError::OptionsMismatch {
                dialog,
                expected: "booking details",
            }),
        }
    }

    pub fn date_resolver_mut(
        &mut self,
        dialog: DialogId,
    ) -> Result<&mut DateResolverOptions, DialogError> {
        match self {
            Self::DateResolver(options) => Ok(options),
            _ => Err(DialogError::OptionsMismatch {
                dialog,
                expected: "date resolver options",
            }),
        }
    }
}
