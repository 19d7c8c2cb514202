//! Per-conversation sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::dialogs::DialogStack;

/// State kept between turns of one conversation.
#[derive(Debug)]
pub struct Session {
    pub conversation_id: String,
    pub stack: DialogStack,
    pub turn_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            stack: DialogStack::new(),
            turn_count: 0,
            created_at: now,
            last_active_at: now,
        }
    }

    /// Record a turn.
    pub fn touch(&mut self) {
        self.turn_count += 1;
        self.last_active_at = Utc::now();
    }

    /// Whether the session has been idle for longer than `idle` as of `now`.
    pub fn is_idle(&self, idle: Duration, now: DateTime<Utc>) -> bool {
        let idle = chrono::TimeDelta::from_std(idle).unwrap_or(chrono::TimeDelta::MAX);
        now.signed_duration_since(self.last_active_at) > idle
    }
}

/// Conversation id → session. Each session sits behind its own mutex so
/// turns of one conversation run one at a time while other conversations
/// proceed independently.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for `conversation_id`, creating it on first use.
    pub async fn get_or_create(&self, conversation_id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(conversation_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                tracing::info!(%conversation_id, "Session created");
                Arc::new(Mutex::new(Session::new(conversation_id)))
            })
            .clone()
    }

    pub async fn remove(&self, conversation_id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.write().await.remove(conversation_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `idle`.
    ///
    /// A session is kept while anyone else holds its handle: a turn that has
    /// called [`get_or_create`](Self::get_or_create) but not yet taken the
    /// lock must find its session still registered on the next turn.
    pub async fn prune_stale_sessions(&self, idle: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            if Arc::strong_count(session) > 1 {
                return true;
            }
            match session.try_lock() {
                Ok(session) => !session.is_idle(idle, now),
                Err(_) => true,
            }
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }
}
