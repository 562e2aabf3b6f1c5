//! In-memory record store for sessions and everything they produce.

use async_trait::async_trait;
use chrono::Utc;
use crewtalk_application::ports::session_repository::{RepositoryError, SessionRepository};
use crewtalk_domain::{
    Agent, Message, NewAgent, NewMessage, NewSession, NotepadSnapshot, Session, SessionPatch,
};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;
use uuid::Uuid;

#[derive(Default)]
struct Records {
    sessions: HashMap<String, Session>,
    /// Creation order per session
    agents: HashMap<String, Vec<Agent>>,
    messages: HashMap<String, Vec<Message>>,
    snapshots: HashMap<String, Vec<NotepadSnapshot>>,
    next_message_id: u64,
    next_snapshot_id: u64,
}

impl Records {
    fn require_session(&self, session_id: &str) -> Result<(), RepositoryError> {
        if self.sessions.contains_key(session_id) {
            Ok(())
        } else {
            Err(RepositoryError::SessionNotFound(session_id.to_string()))
        }
    }
}

/// Session repository held entirely in process memory
#[derive(Default)]
pub struct InMemorySessionRepository {
    records: RwLock<Records>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create_session(&self, input: NewSession) -> Result<Session, RepositoryError> {
        let session = Session::create(Uuid::new_v4().to_string(), input);
        self.records
            .write()
            .await
            .sessions
            .insert(session.id.clone(), session.clone());
        trace!(session_id = %session.id, "Stored session");
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, RepositoryError> {
        Ok(self.records.read().await.sessions.get(session_id).cloned())
    }

    async fn update_session(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<(), RepositoryError> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut records = self.records.write().await;
        let session = records
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| RepositoryError::SessionNotFound(session_id.to_string()))?;
        session.apply(&patch);
        Ok(())
    }

    async fn add_agent(&self, input: NewAgent) -> Result<Agent, RepositoryError> {
        let mut records = self.records.write().await;
        records.require_session(&input.session_id)?;
        let agent = input.into_agent(Uuid::new_v4().to_string(), Utc::now());
        records
            .agents
            .entry(agent.session_id.clone())
            .or_default()
            .push(agent.clone());
        Ok(agent)
    }

    async fn list_agents(&self, session_id: &str) -> Result<Vec<Agent>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .agents
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_message(&self, input: NewMessage) -> Result<Message, RepositoryError> {
        let mut records = self.records.write().await;
        records.require_session(&input.session_id)?;
        records.next_message_id += 1;
        let message = input.into_message(records.next_message_id, Utc::now());
        records
            .messages
            .entry(message.session_id.clone())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let records = self.records.read().await;
        let messages = records
            .messages
            .get(session_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let skip = messages.len().saturating_sub(limit);
        Ok(messages[skip..].to_vec())
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .messages
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_notepad_snapshot(
        &self,
        session_id: &str,
        content: &str,
        updated_by: Option<&str>,
    ) -> Result<NotepadSnapshot, RepositoryError> {
        let mut records = self.records.write().await;
        records.require_session(session_id)?;
        records.next_snapshot_id += 1;
        let snapshot = NotepadSnapshot {
            id: records.next_snapshot_id,
            session_id: session_id.to_string(),
            content: content.to_string(),
            updated_by: updated_by.map(str::to_string),
            created_at: Utc::now(),
        };
        records
            .snapshots
            .entry(session_id.to_string())
            .or_default()
            .push(snapshot.clone());
        Ok(snapshot)
    }

    async fn list_notepad_snapshots(
        &self,
        session_id: &str,
    ) -> Result<Vec<NotepadSnapshot>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .snapshots
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewtalk_domain::{AgentRole, PhaseName, SessionStatus};

    fn message(session_id: &str, turn_index: u64) -> NewMessage {
        NewMessage {
            session_id: session_id.to_string(),
            agent_id: "a-1".to_string(),
            phase: PhaseName::Discover,
            turn_index,
            text: format!("turn {}", turn_index),
            sentiment: 0.0,
            confidence: 1.0,
        }
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = InMemorySessionRepository::new();
        let session = repo
            .create_session(NewSession::new("Retention", "Keep new sellers"))
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Idle);

        repo.update_session(
            &session.id,
            SessionPatch::new().status(SessionStatus::Running).turn_index(4),
        )
        .await
        .unwrap();
        let stored = repo.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Running);
        assert_eq!(stored.turn_index, 4);
        assert_eq!(stored.title, "Retention");
    }

    #[tokio::test]
    async fn test_update_unknown_session() {
        let repo = InMemorySessionRepository::new();
        let err = repo
            .update_session("nope", SessionPatch::new().turn_index(1))
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::SessionNotFound("nope".to_string()));
        assert!(repo.update_session("nope", SessionPatch::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_agents_keep_creation_order() {
        let repo = InMemorySessionRepository::new();
        let session = repo.create_session(NewSession::new("t", "p")).await.unwrap();
        for (name, role) in [
            ("Mod", AgentRole::Moderator),
            ("Ana", AgentRole::Participant),
            ("Ben", AgentRole::Participant),
        ] {
            repo.add_agent(NewAgent::new(&session.id, name, role)).await.unwrap();
        }
        let names: Vec<String> = repo
            .list_agents(&session.id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Mod", "Ana", "Ben"]);

        let err = repo
            .add_agent(NewAgent::new("nope", "X", AgentRole::Participant))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_recent_messages_are_the_tail_oldest_first() {
        let repo = InMemorySessionRepository::new();
        let session = repo.create_session(NewSession::new("t", "p")).await.unwrap();
        for turn in 1..=5 {
            repo.save_message(message(&session.id, turn)).await.unwrap();
        }
        let recent: Vec<u64> = repo
            .recent_messages(&session.id, 3)
            .await
            .unwrap()
            .iter()
            .map(|m| m.turn_index)
            .collect();
        assert_eq!(recent, vec![3, 4, 5]);
        assert_eq!(repo.list_messages(&session.id).await.unwrap().len(), 5);
        assert!(repo.recent_messages("other", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notepad_snapshots_accumulate() {
        let repo = InMemorySessionRepository::new();
        let session = repo.create_session(NewSession::new("t", "p")).await.unwrap();
        repo.save_notepad_snapshot(&session.id, "v1", None).await.unwrap();
        let second = repo
            .save_notepad_snapshot(&session.id, "v2", Some("Scribe"))
            .await
            .unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(second.updated_by.as_deref(), Some("Scribe"));

        let contents: Vec<String> = repo
            .list_notepad_snapshots(&session.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.content)
            .collect();
        assert_eq!(contents, vec!["v1", "v2"]);
    }
}
