//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown phase: {0}")]
    InvalidPhase(String),

    #[error("Unknown agent role: {0}")]
    InvalidRole(String),

    #[error("Unknown session status: {0}")]
    InvalidStatus(String),

    #[error("Session requires at least one moderator and one participant before starting")]
    IncompleteRoster,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_roster_message() {
        let error = DomainError::IncompleteRoster;
        assert!(error.to_string().contains("moderator"));
    }

    #[test]
    fn test_invalid_names_are_reported() {
        assert_eq!(
            DomainError::InvalidRole("scribe".to_string()).to_string(),
            "Unknown agent role: scribe"
        );
    }
}
