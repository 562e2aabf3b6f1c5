//! Live session events and their wire envelope.
//!
//! Every event is delivered to subscribers wrapped in an [`EventEnvelope`]:
//!
//! ```json
//! {"session_id": "...", "event": "token.delta", "payload": {...}, "timestamp": "..."}
//! ```

use crate::orchestration::phase::PhaseName;
use crate::session::entities::StatusSnapshot;
use crate::session::transcript::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an error event originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorScope {
    /// A single agent's turn failed; the session continues
    Agent,
    /// The scheduler itself failed; the session is being finalized
    Session,
}

/// `message.created` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub id: u64,
    pub agent_id: String,
    pub phase: PhaseName,
    pub turn_index: u64,
    pub text: String,
    pub sentiment: f64,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessagePayload {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            agent_id: message.agent_id.clone(),
            phase: message.phase,
            turn_index: message.turn_index,
            text: message.text.clone(),
            sentiment: message.sentiment,
            confidence: message.confidence,
            created_at: message.created_at,
        }
    }
}

/// A typed session event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum SessionEvent {
    #[serde(rename = "session.status")]
    SessionStatus(StatusSnapshot),

    #[serde(rename = "phase.changed")]
    PhaseChanged {
        from: PhaseName,
        to: PhaseName,
        deadline: DateTime<Utc>,
    },

    #[serde(rename = "token.delta")]
    TokenDelta {
        agent_id: String,
        turn_index: u64,
        text_delta: String,
    },

    #[serde(rename = "message.created")]
    MessageCreated(MessagePayload),

    #[serde(rename = "notepad.updated")]
    NotepadUpdated {
        content: String,
        updated_by: Option<String>,
    },

    #[serde(rename = "error")]
    Error {
        scope: ErrorScope,
        message: String,
        details: String,
    },

    #[serde(rename = "session.closed")]
    SessionClosed {},
}

impl SessionEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionStatus(_) => "session.status",
            SessionEvent::PhaseChanged { .. } => "phase.changed",
            SessionEvent::TokenDelta { .. } => "token.delta",
            SessionEvent::MessageCreated(_) => "message.created",
            SessionEvent::NotepadUpdated { .. } => "notepad.updated",
            SessionEvent::Error { .. } => "error",
            SessionEvent::SessionClosed {} => "session.closed",
        }
    }

    pub fn agent_error(message: impl Into<String>, details: impl Into<String>) -> Self {
        SessionEvent::Error {
            scope: ErrorScope::Agent,
            message: message.into(),
            details: details.into(),
        }
    }

    pub fn session_error(message: impl Into<String>, details: impl Into<String>) -> Self {
        SessionEvent::Error {
            scope: ErrorScope::Session,
            message: message.into(),
            details: details.into(),
        }
    }
}

/// An event addressed to one session's subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub session_id: String,
    #[serde(flatten)]
    pub event: SessionEvent,
    pub timestamp: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(session_id: impl Into<String>, event: SessionEvent) -> Self {
        Self {
            session_id: session_id.into(),
            event,
            timestamp: Utc::now(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.event.name()
    }
}
