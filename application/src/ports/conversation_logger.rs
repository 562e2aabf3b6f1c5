//! Port for structured transcript logging.
//!
//! Defines the [`ConversationLogger`] trait for recording session events
//! (created messages, failed turns, phase changes, completion) to a
//! machine-readable transcript.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the session
//! transcript in a replayable format (JSONL).

use crewtalk_domain::{Message, PhaseName};
use serde_json::{Value, json};

/// A structured transcript event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g. "message_created", "turn_failed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn message_created(message: &Message) -> Self {
        Self::new(
            "message_created",
            json!({
                "session_id": message.session_id,
                "agent_id": message.agent_id,
                "phase": message.phase,
                "turn_index": message.turn_index,
                "text": message.text,
                "sentiment": message.sentiment,
                "confidence": message.confidence,
            }),
        )
    }

    pub fn turn_failed(session_id: &str, agent_id: &str, turn_index: u64, error: &str) -> Self {
        Self::new(
            "turn_failed",
            json!({
                "session_id": session_id,
                "agent_id": agent_id,
                "turn_index": turn_index,
                "error": error,
            }),
        )
    }

    pub fn phase_started(session_id: &str, phase: PhaseName, duration_secs: u64) -> Self {
        Self::new(
            "phase_started",
            json!({
                "session_id": session_id,
                "phase": phase,
                "duration_secs": duration_secs,
            }),
        )
    }

    pub fn session_finished(session_id: &str, phase: PhaseName, turn_index: u64) -> Self {
        Self::new(
            "session_finished",
            json!({
                "session_id": session_id,
                "phase": phase,
                "turn_index": turn_index,
            }),
        )
    }
}

/// Port for logging transcript events.
///
/// Implementations write each event as a single record (e.g. one JSONL line).
/// `log` is synchronous and infallible so it can never disturb a run;
/// write failures are dropped by the adapter.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when transcripts are disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
