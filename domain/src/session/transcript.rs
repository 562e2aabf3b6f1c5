//! Transcript records: generated messages and notepad snapshots.
//!
//! Both are immutable once written; the notepad history is append-only.

use crate::orchestration::phase::PhaseName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder stored when a model produced only whitespace
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "[no response]";

/// A scored, persisted agent utterance (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub session_id: String,
    pub agent_id: String,
    pub phase: PhaseName,
    pub turn_index: u64,
    pub text: String,
    /// In `[-1, 1]`
    pub sentiment: f64,
    /// In `[0, 1]`
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub session_id: String,
    pub agent_id: String,
    pub phase: PhaseName,
    pub turn_index: u64,
    pub text: String,
    pub sentiment: f64,
    pub confidence: f64,
}

impl NewMessage {
    pub fn into_message(self, id: u64, created_at: DateTime<Utc>) -> Message {
        Message {
            id,
            session_id: self.session_id,
            agent_id: self.agent_id,
            phase: self.phase,
            turn_index: self.turn_index,
            text: self.text,
            sentiment: self.sentiment,
            confidence: self.confidence,
            created_at,
        }
    }
}

/// One write to the shared notepad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotepadSnapshot {
    pub id: u64,
    pub session_id: String,
    pub content: String,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
