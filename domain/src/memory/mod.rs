//! Short-term memory: bounded per-agent recent-utterance buffers.
//!
//! Each agent's buffer is stored newest-first and trimmed to
//! [`SHORT_TERM_LIMIT`] entries. Building context for a turn merges every
//! agent's buffer into one chronological, cross-agent view with
//! [`merge_recent`].

use crate::agent::entities::AgentRole;
use serde::{Deserialize, Serialize};

/// Capacity of each per-agent buffer and of the merged view.
pub const SHORT_TERM_LIMIT: usize = 8;

/// One remembered utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Display name of the speaking agent
    pub agent: String,
    pub role: AgentRole,
    pub turn_index: u64,
    pub text: String,
}

impl MemoryEntry {
    pub fn new(
        agent: impl Into<String>,
        role: AgentRole,
        turn_index: u64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            role,
            turn_index,
            text: text.into(),
        }
    }

    /// Serialized form kept in the memory store
    pub fn encode(&self) -> String {
        // A struct of strings and integers always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a stored entry; `None` for anything unreadable.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// Decode one agent's buffer as returned by the store (newest first) into
/// chronological order, skipping entries that fail to parse.
pub fn decode_buffer(raw_newest_first: &[String]) -> Vec<MemoryEntry> {
    raw_newest_first
        .iter()
        .rev()
        .filter_map(|raw| MemoryEntry::decode(raw))
        .collect()
}

/// Merge per-agent buffers into a single chronological view.
///
/// Buffers are concatenated in the order given, stably sorted by
/// `turn_index` (equal indices keep their merge order) and cut down to the
/// last `limit` entries.
pub fn merge_recent(buffers: Vec<Vec<MemoryEntry>>, limit: usize) -> Vec<MemoryEntry> {
    let mut merged: Vec<MemoryEntry> = buffers.into_iter().flatten().collect();
    merged.sort_by_key(|entry| entry.turn_index);
    let skip = merged.len().saturating_sub(limit);
    merged.split_off(skip)
}
