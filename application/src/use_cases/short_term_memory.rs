//! Short-term memory service.
//!
//! Reads every seated agent's buffer concurrently and merges them into one
//! chronological view; appends new utterances to the speaker's buffer.

use crate::ports::session_repository::{MemoryStore, RepositoryError};
use crewtalk_domain::{Agent, MemoryEntry, decode_buffer, merge_recent};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::trace;

/// Cross-agent short-term memory for one process
#[derive(Clone)]
pub struct ShortTermMemory {
    store: Arc<dyn MemoryStore>,
    limit: usize,
}

impl ShortTermMemory {
    pub fn new(store: Arc<dyn MemoryStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The last `limit` utterances across all `agents`, oldest first.
    ///
    /// Buffers are merged in roster order, so utterances sharing a
    /// `turn_index` keep that order.
    pub async fn collect(
        &self,
        session_id: &str,
        agents: &[Agent],
    ) -> Result<Vec<MemoryEntry>, RepositoryError> {
        if agents.is_empty() {
            return Ok(Vec::new());
        }

        let fetches = agents.iter().map(|agent| async move {
            let raw = self.store.range(session_id, &agent.name, self.limit).await?;
            Ok::<_, RepositoryError>(decode_buffer(&raw))
        });
        let buffers = try_join_all(fetches).await?;

        let merged = merge_recent(buffers, self.limit);
        trace!(session_id, entries = merged.len(), "Collected short-term memory");
        Ok(merged)
    }

    /// Remember what `agent` said at `turn_index`.
    pub async fn remember(
        &self,
        session_id: &str,
        agent: &Agent,
        turn_index: u64,
        text: &str,
    ) -> Result<(), RepositoryError> {
        let entry = MemoryEntry::new(agent.name.clone(), agent.role, turn_index, text);
        self.store
            .push_front_trimmed(session_id, &agent.name, entry.encode(), self.limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use crewtalk_domain::{AgentRole, NewAgent};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// List store that answers slower for agents listed in `delays`
    #[derive(Default)]
    struct ListStore {
        lists: Mutex<HashMap<String, Vec<String>>>,
        delays: HashMap<String, u64>,
    }

    #[async_trait]
    impl MemoryStore for ListStore {
        async fn push_front_trimmed(
            &self,
            _session_id: &str,
            agent: &str,
            value: String,
            capacity: usize,
        ) -> Result<(), RepositoryError> {
            let mut lists = self.lists.lock().unwrap();
            let list = lists.entry(agent.to_string()).or_default();
            list.insert(0, value);
            list.truncate(capacity);
            Ok(())
        }

        async fn range(
            &self,
            _session_id: &str,
            agent: &str,
            limit: usize,
        ) -> Result<Vec<String>, RepositoryError> {
            if let Some(ms) = self.delays.get(agent) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            let lists = self.lists.lock().unwrap();
            Ok(lists
                .get(agent)
                .map(|l| l.iter().take(limit).cloned().collect())
                .unwrap_or_default())
        }
    }

    fn agent(name: &str) -> Agent {
        NewAgent::new("s-1", name, AgentRole::Participant).into_agent(name, Utc::now())
    }

    #[tokio::test]
    async fn test_merge_is_chronological_regardless_of_fetch_order() {
        let mut store = ListStore::default();
        store.delays.insert("A".to_string(), 20);
        let memory = ShortTermMemory::new(Arc::new(store), 8);
        let (a, b) = (agent("A"), agent("B"));

        memory.remember("s-1", &a, 1, "a1").await.unwrap();
        memory.remember("s-1", &b, 2, "b2").await.unwrap();
        memory.remember("s-1", &a, 3, "a3").await.unwrap();
        memory.remember("s-1", &b, 4, "b4").await.unwrap();

        let merged = memory.collect("s-1", &[a, b]).await.unwrap();
        let turns: Vec<u64> = merged.iter().map(|e| e.turn_index).collect();
        assert_eq!(turns, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_buffers_are_trimmed_to_limit() {
        let memory = ShortTermMemory::new(Arc::new(ListStore::default()), 3);
        let a = agent("A");
        for turn in 1..=5 {
            memory.remember("s-1", &a, turn, "x").await.unwrap();
        }
        let merged = memory.collect("s-1", &[a]).await.unwrap();
        let turns: Vec<u64> = merged.iter().map(|e| e.turn_index).collect();
        assert_eq!(turns, vec![3, 4, 5]);
    }

    #[tokio::test]
    async fn test_no_agents_no_memory() {
        let memory = ShortTermMemory::new(Arc::new(ListStore::default()), 8);
        assert!(memory.collect("s-1", &[]).await.unwrap().is_empty());
    }
}
