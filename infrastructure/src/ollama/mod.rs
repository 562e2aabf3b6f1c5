//! Ollama adapter
//!
//! Streams chat completions from an Ollama server. `/api/chat` answers with
//! newline-delimited JSON: one object per generated fragment, the last one
//! flagged `done`.

mod gateway;
mod protocol;

pub use gateway::OllamaGateway;
