//! Session Query use case
//!
//! Read side of a session: the detail view, the full export and the live
//! event feed.

use crate::broadcast::{Broadcaster, Subscription};
use crate::error::EngineError;
use crate::ports::session_repository::{ScratchpadStore, SessionRepository};
use crate::use_cases::session_engine::EnginePorts;
use crewtalk_domain::{
    Agent, EventEnvelope, Message, NotepadSnapshot, Session, SessionEvent,
};
use serde::Serialize;
use std::sync::Arc;

/// Messages included in [`SessionDetail`]
pub const DETAIL_MESSAGE_LIMIT: usize = 50;

/// A session with its line-up, latest messages and current notepad
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub session: Session,
    pub agents: Vec<Agent>,
    /// The most recent messages, oldest first
    pub messages: Vec<Message>,
    pub notepad: String,
}

/// Everything a session left behind
#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    pub session: Session,
    pub agents: Vec<Agent>,
    pub messages: Vec<Message>,
    pub notepad_snapshots: Vec<NotepadSnapshot>,
    pub notepad: String,
}

/// Live feed: the status at subscription time, then every emitted event
pub struct SessionFeed {
    initial: Option<EventEnvelope>,
    subscription: Subscription,
}

impl SessionFeed {
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        match self.initial.take() {
            Some(envelope) => Some(envelope),
            None => self.subscription.recv().await,
        }
    }

    pub fn session_id(&self) -> &str {
        self.subscription.session_id()
    }
}

/// Use case for reading sessions
pub struct SessionQueryUseCase {
    repository: Arc<dyn SessionRepository>,
    scratchpad: Arc<dyn ScratchpadStore>,
    broadcaster: Arc<Broadcaster>,
}

impl SessionQueryUseCase {
    pub fn new(ports: &EnginePorts) -> Self {
        Self {
            repository: Arc::clone(&ports.repository),
            scratchpad: Arc::clone(&ports.scratchpad),
            broadcaster: Arc::clone(&ports.broadcaster),
        }
    }

    pub async fn detail(&self, session_id: &str) -> Result<SessionDetail, EngineError> {
        let session = self.load(session_id).await?;
        Ok(SessionDetail {
            agents: self.repository.list_agents(session_id).await?,
            messages: self
                .repository
                .recent_messages(session_id, DETAIL_MESSAGE_LIMIT)
                .await?,
            notepad: self.notepad(session_id).await?,
            session,
        })
    }

    pub async fn export(&self, session_id: &str) -> Result<SessionExport, EngineError> {
        let session = self.load(session_id).await?;
        Ok(SessionExport {
            agents: self.repository.list_agents(session_id).await?,
            messages: self.repository.list_messages(session_id).await?,
            notepad_snapshots: self.repository.list_notepad_snapshots(session_id).await?,
            notepad: self.notepad(session_id).await?,
            session,
        })
    }

    /// Register for live events.
    ///
    /// The queue is registered before the status is read, so nothing emitted
    /// in between is missed.
    pub async fn subscribe(&self, session_id: &str) -> Result<SessionFeed, EngineError> {
        let subscription = self.broadcaster.subscribe(session_id);
        let session = self.load(session_id).await?;
        let initial = EventEnvelope::new(
            session_id,
            SessionEvent::SessionStatus(session.status_snapshot()),
        );
        Ok(SessionFeed {
            initial: Some(initial),
            subscription,
        })
    }

    async fn load(&self, session_id: &str) -> Result<Session, EngineError> {
        self.repository
            .get_session(session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(session_id))
    }

    async fn notepad(&self, session_id: &str) -> Result<String, EngineError> {
        Ok(self.scratchpad.get(session_id).await?.unwrap_or_default())
    }
}
