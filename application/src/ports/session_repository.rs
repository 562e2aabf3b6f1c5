//! Persistence ports
//!
//! Defines the record store for sessions, agents, messages and notepad
//! snapshots, plus the two key-value stores the engine reads every turn:
//! the shared scratchpad and the per-agent short-term memory.

use async_trait::async_trait;
use crewtalk_domain::{
    Agent, Message, NewAgent, NewMessage, NewSession, NotepadSnapshot, Session, SessionPatch,
};
use thiserror::Error;

/// Errors raised by persistence adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Record store for everything a session leaves behind.
///
/// All operations are keyed by session id; reads are idempotent.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, input: NewSession) -> Result<Session, RepositoryError>;

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, RepositoryError>;

    /// Apply a partial update; an empty patch is a no-op.
    async fn update_session(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<(), RepositoryError>;

    async fn add_agent(&self, input: NewAgent) -> Result<Agent, RepositoryError>;

    /// Agents of a session in creation order
    async fn list_agents(&self, session_id: &str) -> Result<Vec<Agent>, RepositoryError>;

    async fn save_message(&self, input: NewMessage) -> Result<Message, RepositoryError>;

    /// The `limit` most recent messages, returned oldest first
    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// Every message, oldest first
    async fn list_messages(&self, session_id: &str) -> Result<Vec<Message>, RepositoryError>;

    async fn save_notepad_snapshot(
        &self,
        session_id: &str,
        content: &str,
        updated_by: Option<&str>,
    ) -> Result<NotepadSnapshot, RepositoryError>;

    /// Every notepad snapshot, oldest first
    async fn list_notepad_snapshots(
        &self,
        session_id: &str,
    ) -> Result<Vec<NotepadSnapshot>, RepositoryError>;
}

/// Fast key-value store holding the current notepad text per session
#[async_trait]
pub trait ScratchpadStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Option<String>, RepositoryError>;

    async fn set(&self, session_id: &str, content: &str) -> Result<(), RepositoryError>;
}

/// Per-(session, agent) list store backing short-term memory.
///
/// Values are opaque strings; lists are kept newest first.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Push `value` to the front and trim the list to `capacity` entries.
    async fn push_front_trimmed(
        &self,
        session_id: &str,
        agent: &str,
        value: String,
        capacity: usize,
    ) -> Result<(), RepositoryError>;

    /// Up to `limit` entries from the front (newest first).
    async fn range(
        &self,
        session_id: &str,
        agent: &str,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError>;
}
