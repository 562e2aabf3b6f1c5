//! Infrastructure layer for crewtalk
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod ollama;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileEngineConfig, FileLlmConfig,
    FileLoggingConfig, FileSessionConfig,
};
pub use logging::JsonlConversationLogger;
pub use ollama::OllamaGateway;
pub use store::{InMemoryMemoryStore, InMemoryScratchpad, InMemorySessionRepository};
