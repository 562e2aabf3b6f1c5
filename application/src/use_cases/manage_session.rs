//! Manage Session use case
//!
//! Creating sessions, admitting agents after a model probe, and editing the
//! shared notepad.

use crate::broadcast::Broadcaster;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::session_repository::{ScratchpadStore, SessionRepository};
use crate::use_cases::session_engine::EnginePorts;
use crewtalk_domain::{
    Agent, NewAgent, NewSession, NotepadSnapshot, Session, SessionEvent, core::string::take_chars,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Longest probe reply returned to the caller
pub const PROBE_EXCERPT_CHARS: usize = 200;

/// An admitted agent and what its model answered to the probe
#[derive(Debug, Clone)]
pub struct AdmittedAgent {
    pub agent: Agent,
    pub probe_excerpt: String,
}

/// Use case for session setup and notepad edits
pub struct ManageSessionUseCase {
    repository: Arc<dyn SessionRepository>,
    scratchpad: Arc<dyn ScratchpadStore>,
    gateway: Arc<dyn LlmGateway>,
    broadcaster: Arc<Broadcaster>,
    config: EngineConfig,
}

impl ManageSessionUseCase {
    pub fn new(ports: &EnginePorts, config: EngineConfig) -> Self {
        Self {
            repository: Arc::clone(&ports.repository),
            scratchpad: Arc::clone(&ports.scratchpad),
            gateway: Arc::clone(&ports.gateway),
            broadcaster: Arc::clone(&ports.broadcaster),
            config,
        }
    }

    /// Create an idle session in the discover phase.
    pub async fn create_session(&self, input: NewSession) -> Result<Session, EngineError> {
        if input.title.trim().is_empty() {
            return Err(EngineError::Configuration(
                "Session title must not be empty".to_string(),
            ));
        }
        let session = self.repository.create_session(input).await?;
        info!(session_id = %session.id, title = %session.title, "Session created");
        Ok(session)
    }

    /// Admit an agent once its model answers a one-shot probe.
    ///
    /// Nothing is persisted when the probe fails.
    pub async fn add_agent(&self, input: NewAgent) -> Result<AdmittedAgent, EngineError> {
        self.ensure_session(&input.session_id).await?;

        let model = self.config.resolve_model(input.model_hint.as_deref()).to_string();
        let reply = match self.gateway.probe(&model).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    session_id = %input.session_id,
                    agent = %input.name,
                    %model,
                    %error,
                    "Agent probe failed"
                );
                return Err(EngineError::Transport(error));
            }
        };

        let agent = self.repository.add_agent(input).await?;
        info!(
            session_id = %agent.session_id,
            agent_id = %agent.id,
            role = %agent.role,
            %model,
            "Agent admitted"
        );
        Ok(AdmittedAgent {
            agent,
            probe_excerpt: take_chars(reply.trim(), PROBE_EXCERPT_CHARS).to_string(),
        })
    }

    /// Replace the notepad text, keep a snapshot and tell subscribers.
    pub async fn update_notepad(
        &self,
        session_id: &str,
        content: &str,
        updated_by: Option<&str>,
    ) -> Result<NotepadSnapshot, EngineError> {
        self.ensure_session(session_id).await?;

        self.scratchpad.set(session_id, content).await?;
        let snapshot = self
            .repository
            .save_notepad_snapshot(session_id, content, updated_by)
            .await?;
        self.broadcaster.emit(
            session_id,
            SessionEvent::NotepadUpdated {
                content: content.to_string(),
                updated_by: updated_by.map(str::to_string),
            },
        );
        Ok(snapshot)
    }

    async fn ensure_session(&self, session_id: &str) -> Result<Session, EngineError> {
        self.repository
            .get_session(session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(session_id))
    }
}
