//! Error types for the booking bot.

use std::time::Duration;

use crate::dialogs::DialogId;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("NLU error: {0}")]
    Nlu(#[from] NluError),

    #[error("Dialog error: {0}")]
    Dialog(#[from] DialogError),
}

/// Configuration-related errors.
///
/// These are raised while the bot is being assembled and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Dialog {parent} depends on {child}, which is not registered")]
    MissingDialog { parent: DialogId, child: DialogId },

    #[error("Dialog {0} registered twice")]
    DuplicateDialog(DialogId),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },
}

/// Errors from the language-understanding collaborator.
#[derive(Debug, thiserror::Error)]
pub enum NluError {
    #[error("Recognizer is not configured")]
    NotConfigured,

    #[error("Recognizer request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Recognizer rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Recognizer rejected credentials (status {status})")]
    AuthFailed { status: u16 },

    #[error("Invalid response from recognizer: {reason}")]
    InvalidResponse { reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dialog orchestration errors.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("Dialog {0} is not registered")]
    UnknownDialog(DialogId),

    #[error("Dialog {dialog} was given options of the wrong kind (expected {expected})")]
    OptionsMismatch {
        dialog: DialogId,
        expected: &'static str,
    },

    #[error("Dialog {dialog} step {step} received an unexpected value")]
    UnexpectedInput { dialog: DialogId, step: usize },

    #[error("Dialog {0} is on top of the stack but is not waiting for input")]
    NotAwaitingInput(DialogId),

    #[error("Recognizer failed: {0}")]
    Recognizer(#[from] NluError),
}

impl DialogError {
    /// Whether the conversation can carry on after this error.
    ///
    /// Collaborator failures are recoverable; everything else indicates a
    /// wiring bug in the dialog definitions.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recognizer(_))
    }
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizer_failures_are_recoverable() {
        let err = DialogError::from(NluError::NotConfigured);
        assert!(err.is_recoverable());
        assert!(!DialogError::UnknownDialog(DialogId::Booking).is_recoverable());
        assert!(!DialogError::NotAwaitingInput(DialogId::Main).is_recoverable());
    }

    #[test]
    fn missing_dialog_message_names_both_sides() {
        let err = ConfigError::MissingDialog {
            parent: DialogId::Main,
            child: DialogId::Booking,
        };
        let text = err.to_string();
        assert!(text.contains("main"));
        assert!(text.contains("booking"));
    }
}
