//! Application error taxonomy.

use crate::ports::llm_gateway::GatewayError;
use crate::ports::session_repository::RepositoryError;
use crewtalk_domain::DomainError;
use thiserror::Error;

/// Errors surfaced by the session engine and the use cases around it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Missing roster roles, duplicate start, invalid input
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown session or agent reference
    #[error("Not found: {0}")]
    NotFound(String),

    /// Model streaming failed
    #[error("Transport error: {0}")]
    Transport(#[from] GatewayError),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    /// Any other fault escaping the scheduler
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, EngineError::Configuration(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }

    pub fn session_not_found(session_id: &str) -> Self {
        EngineError::NotFound(format!("Session '{}' not found", session_id))
    }
}

impl From<RepositoryError> for EngineError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::SessionNotFound(id) => EngineError::session_not_found(&id),
            other => EngineError::Repository(other),
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(error: DomainError) -> Self {
        EngineError::Configuration(error.to_string())
    }
}
