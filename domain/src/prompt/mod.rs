//! Prompt composition for agent turns.

pub mod chat;
pub mod template;

pub use chat::{ChatMessage, ChatRole};
pub use template::{TurnContext, TurnMode, TurnPrompt};
