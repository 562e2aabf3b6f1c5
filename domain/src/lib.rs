//! Domain layer for crewtalk
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A brainstorming session walks four fixed phases (discover, define,
//! develop, deliver). Within each phase a moderator, the participants and an
//! optional note-taker take turns producing text.
//!
//! ## Turn
//!
//! One agent's single generate-and-record action. Every turn is built from
//! a deterministic [`TurnPrompt`], scored with [`scoring`] heuristics and
//! remembered in short-term [`memory`].

pub mod agent;
pub mod core;
pub mod event;
pub mod memory;
pub mod orchestration;
pub mod prompt;
pub mod scoring;
pub mod session;

// Re-export commonly used types
pub use agent::entities::{Agent, AgentRole, NewAgent, Roster};
pub use core::error::DomainError;
pub use event::{ErrorScope, EventEnvelope, MessagePayload, SessionEvent};
pub use memory::{MemoryEntry, SHORT_TERM_LIMIT, decode_buffer, merge_recent};
pub use orchestration::{
    phase::{MIN_TOTAL_SECS, PhaseName, PhasePlan, plan_phases},
    strategy::Strategy,
};
pub use prompt::{ChatMessage, ChatRole, TurnContext, TurnMode, TurnPrompt};
pub use scoring::{confidence_score, sentiment_score};
pub use session::{
    entities::{NewSession, Session, SessionPatch, SessionStatus, StatusSnapshot},
    stream::StreamEvent,
    transcript::{EMPTY_RESPONSE_PLACEHOLDER, Message, NewMessage, NotepadSnapshot},
};
