//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod coordinator;
pub mod manage_session;
pub mod session_engine;
pub mod session_query;
pub mod short_term_memory;
