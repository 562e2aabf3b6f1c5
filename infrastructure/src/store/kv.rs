//! Key-value stores: the current notepad text and per-agent memory lists.

use async_trait::async_trait;
use crewtalk_application::ports::session_repository::{
    MemoryStore, RepositoryError, ScratchpadStore,
};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// Current notepad text per session
#[derive(Default)]
pub struct InMemoryScratchpad {
    pads: RwLock<HashMap<String, String>>,
}

impl InMemoryScratchpad {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScratchpadStore for InMemoryScratchpad {
    async fn get(&self, session_id: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.pads.read().await.get(session_id).cloned())
    }

    async fn set(&self, session_id: &str, content: &str) -> Result<(), RepositoryError> {
        self.pads
            .write()
            .await
            .insert(session_id.to_string(), content.to_string());
        Ok(())
    }
}

/// Bounded newest-first lists keyed by (session, agent)
#[derive(Default)]
pub struct InMemoryMemoryStore {
    lists: RwLock<HashMap<(String, String), VecDeque<String>>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn push_front_trimmed(
        &self,
        session_id: &str,
        agent: &str,
        value: String,
        capacity: usize,
    ) -> Result<(), RepositoryError> {
        let mut lists = self.lists.write().await;
        let list = lists
            .entry((session_id.to_string(), agent.to_string()))
            .or_default();
        list.push_front(value);
        list.truncate(capacity);
        Ok(())
    }

    async fn range(
        &self,
        session_id: &str,
        agent: &str,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError> {
        let lists = self.lists.read().await;
        Ok(lists
            .get(&(session_id.to_string(), agent.to_string()))
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
