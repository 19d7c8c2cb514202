//! Channel trait and the message types that cross it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChannelError;

/// Stream of inbound turns produced by a channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// One inbound turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name, e.g. "cli".
    pub channel: String,
    /// Stable conversation identifier; sessions are keyed by this.
    pub conversation_id: String,
    pub user_id: String,
    /// Message text. `None` for non-text activity (conversation start).
    pub content: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    /// A text turn.
    pub fn new(
        channel: impl Into<String>,
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::conversation_start(channel, conversation_id, user_id)
        }
    }

    /// A non-text turn announcing that the user joined the conversation.
    pub fn conversation_start(
        channel: impl Into<String>,
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            content: None,
            received_at: Utc::now(),
        }
    }
}

/// Whether the channel should keep accepting input after a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputHint {
    ExpectingInput,
    IgnoringInput,
}

/// One outbound message: display text, speech text, and an input hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,
    pub input_hint: InputHint,
}

impl OutgoingResponse {
    /// A question: spoken as written, keeps the input open.
    pub fn expecting(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            speak: Some(text.clone()),
            content: text,
            input_hint: InputHint::ExpectingInput,
        }
    }

    /// A statement: spoken as written, no answer expected.
    pub fn ignoring(text: impl Into<String>) -> Self {
        Self {
            input_hint: InputHint::IgnoringInput,
            ..Self::expecting(text)
        }
    }

    /// Display-only text with no speech rendering.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
            speak: None,
            input_hint: InputHint::IgnoringInput,
        }
    }

    pub fn is_expecting_input(&self) -> bool {
        self.input_hint == InputHint::ExpectingInput
    }
}

/// A transport that delivers turns to the bot and carries replies back.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Channel name.
    fn name(&self) -> &str;

    /// Start receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver a reply to the conversation `msg` came from.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Stop the channel.
    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
