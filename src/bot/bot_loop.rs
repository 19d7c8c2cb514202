//! Bot run loop — channel turns in, dialog replies out.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::channels::{Channel, IncomingMessage, OutgoingResponse};
use crate::config::BotConfig;
use crate::context::TurnContext;
use crate::dialogs::{
    DialogId, DialogOptions, DialogSet, DialogStack, DialogTurnResult, DialogTurnStatus,
    InterruptFilter, MainOptions,
};
use crate::error::{DialogError, Error};

use super::session::SessionManager;

/// Sent in place of any raw error.
pub const APOLOGY: &str =
    "The bot encountered an error or bug. To continue to run this bot, please try again.";

/// `tokio::time::interval` panics on a zero period.
const MIN_PRUNE_INTERVAL: Duration = Duration::from_secs(1);

/// The booking bot: sessions plus the shared dialog definitions.
pub struct BookingBot {
    config: BotConfig,
    dialogs: Arc<DialogSet>,
    sessions: Arc<SessionManager>,
    filter: InterruptFilter,
}

impl BookingBot {
    pub fn new(config: BotConfig, dialogs: DialogSet) -> Self {
        Self {
            config,
            dialogs: Arc::new(dialogs),
            sessions: Arc::new(SessionManager::new()),
            filter: InterruptFilter::new(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Serve `channel` until its stream ends or Ctrl+C.
    pub async fn run(self, channel: Arc<dyn Channel>) -> Result<(), Error> {
        let mut message_stream = channel.start().await?;

        let sessions = self.sessions.clone();
        let idle_timeout = self.config.session_idle_timeout;
        let prune_interval = self.config.prune_interval.max(MIN_PRUNE_INTERVAL);
        let pruning_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(prune_interval);
            interval.tick().await; // Skip immediate first tick
            loop {
                interval.tick().await;
                sessions.prune_stale_sessions(idle_timeout).await;
            }
        });

        tracing::info!(channel = channel.name(), "Bot {} ready and listening", self.config.name);

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("Channel stream ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            let responses = match self.handle_message(&message).await {
                Ok(responses) => responses,
                Err(e) => {
                    tracing::error!(
                        conversation_id = %message.conversation_id,
                        "Error handling message: {}",
                        e
                    );
                    vec![OutgoingResponse::ignoring(APOLOGY)]
                }
            };

            for response in responses {
                if let Err(e) = channel.respond(&message, response).await {
                    tracing::warn!("Failed to deliver response: {}", e);
                }
            }
        }

        tracing::info!("Bot shutting down...");
        pruning_handle.abort();
        channel.shutdown().await?;

        Ok(())
    }

    /// Process one turn and return the replies it produced.
    ///
    /// A recoverable failure resets the conversation and answers with an
    /// apology. Anything else resets the conversation and is returned.
    pub async fn handle_message(
        &self,
        message: &IncomingMessage,
    ) -> Result<Vec<OutgoingResponse>, Error> {
        let session = self.sessions.get_or_create(&message.conversation_id).await;
        let mut session = session.lock().await;
        session.touch();

        tracing::debug!(
            conversation_id = %message.conversation_id,
            turn = session.turn_count,
            chars = message.content.as_deref().map_or(0, str::len),
            "Received message"
        );

        let mut turn = TurnContext::at(
            message.conversation_id.clone(),
            message.content.clone(),
            message.received_at,
        );

        match self.process_turn(&mut session.stack, &mut turn).await {
            Ok(result) => {
                tracing::debug!(
                    conversation_id = %message.conversation_id,
                    status = %result.status,
                    depth = session.stack.depth(),
                    "Turn processed"
                );
                Ok(turn.into_responses())
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    conversation_id = %message.conversation_id,
                    "Turn failed, resetting conversation: {}",
                    e
                );
                session.stack.cancel_all();
                turn.send(OutgoingResponse::ignoring(APOLOGY));
                Ok(turn.into_responses())
            }
            Err(e) => {
                session.stack.cancel_all();
                Err(e.into())
            }
        }
    }

    async fn process_turn(
        &self,
        stack: &mut DialogStack,
        turn: &mut TurnContext,
    ) -> Result<DialogTurnResult, DialogError> {
        let result = self
            .filter
            .continue_dialog(stack, &self.dialogs, turn)
            .await?;
        if result.status != DialogTurnStatus::Empty {
            return Ok(result);
        }
        stack
            .begin(
                &self.dialogs,
                DialogId::Main,
                DialogOptions::Main(MainOptions::default()),
                turn,
            )
            .await
    }
}
