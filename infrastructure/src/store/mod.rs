//! In-process storage adapters.
//!
//! [`InMemorySessionRepository`] keeps sessions, agents, messages and
//! notepad snapshots; [`InMemoryScratchpad`] and [`InMemoryMemoryStore`]
//! stand in for the fast key-value tier read on every turn.

mod kv;
mod session_repository;

pub use kv::{InMemoryMemoryStore, InMemoryScratchpad};
pub use session_repository::InMemorySessionRepository;
