//! Application layer for crewtalk
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use broadcast::{Broadcaster, SUBSCRIBER_CAPACITY, Subscription};
pub use config::EngineConfig;
pub use error::EngineError;
pub use ports::{
    clock::{Clock, SystemClock},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{ChatRequest, GatewayError, LlmGateway, StreamHandle},
    session_repository::{MemoryStore, RepositoryError, ScratchpadStore, SessionRepository},
};
pub use use_cases::coordinator::SessionCoordinator;
pub use use_cases::manage_session::{AdmittedAgent, ManageSessionUseCase};
pub use use_cases::session_engine::{EnginePorts, RunOutcome, SessionEngine};
pub use use_cases::session_query::{
    SessionDetail, SessionExport, SessionFeed, SessionQueryUseCase,
};
pub use use_cases::short_term_memory::ShortTermMemory;
