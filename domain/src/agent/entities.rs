//! Agent domain entities.
//!
//! An agent is one seat at the table: a moderator, a participant or the
//! note-taker. The [`Roster`] is the validated line-up a session runs with.

use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Role an agent plays in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Moderator,
    Participant,
    Notetaker,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Moderator => "moderator",
            AgentRole::Participant => "participant",
            AgentRole::Notetaker => "notetaker",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "moderator" => Ok(AgentRole::Moderator),
            "participant" => Ok(AgentRole::Participant),
            "notetaker" | "note-taker" | "note_taker" => Ok(AgentRole::Notetaker),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

/// An agent seated in a session (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub role: AgentRole,
    /// Free-form behaviour tag, e.g. `contrarian`
    #[serde(rename = "trait")]
    pub trait_tag: Option<String>,
    pub model_hint: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Prompt guidance line for this agent's trait, if any.
    ///
    /// Known traits expand to a behavioural instruction; anything else is
    /// passed through as written.
    pub fn trait_guidance(&self) -> Option<String> {
        let tag = self.trait_tag.as_deref()?.trim();
        if tag.is_empty() {
            return None;
        }
        let guidance = match tag {
            "contrarian" => {
                "contrarian. Challenge assumptions politely; propose alternatives with evidence"
            }
            "domain_expert" => "domain_expert. Provide domain facts and constraints succinctly",
            "risk_analyst" => "risk_analyst. Surface risks, failure modes, and mitigations",
            other => return Some(other.to_string()),
        };
        Some(guidance.to_string())
    }
}

/// Input for seating an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAgent {
    pub session_id: String,
    pub name: String,
    pub role: AgentRole,
    pub trait_tag: Option<String>,
    pub model_hint: Option<String>,
}

impl NewAgent {
    pub fn new(session_id: impl Into<String>, name: impl Into<String>, role: AgentRole) -> Self {
        Self {
            session_id: session_id.into(),
            name: name.into(),
            role,
            trait_tag: None,
            model_hint: None,
        }
    }

    pub fn with_trait(mut self, trait_tag: impl Into<String>) -> Self {
        let tag = trait_tag.into();
        self.trait_tag = (!tag.trim().is_empty()).then_some(tag);
        self
    }

    pub fn with_model_hint(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.model_hint = (!model.trim().is_empty()).then_some(model);
        self
    }

    pub fn into_agent(self, id: impl Into<String>, created_at: DateTime<Utc>) -> Agent {
        Agent {
            id: id.into(),
            session_id: self.session_id,
            name: self.name,
            role: self.role,
            trait_tag: self.trait_tag,
            model_hint: self.model_hint,
            is_active: true,
            created_at,
        }
    }
}

/// Validated line-up for a run: exactly one moderator, at least one
/// participant, at most one note-taker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    moderator: Agent,
    participants: Vec<Agent>,
    notetaker: Option<Agent>,
    members: Vec<Agent>,
}

impl Roster {
    /// Bind the active agents of a session in stored order.
    ///
    /// The first active moderator and note-taker win; every active
    /// participant takes a turn in the order given.
    pub fn from_agents(agents: Vec<Agent>) -> Result<Self, DomainError> {
        let members: Vec<Agent> = agents.into_iter().filter(|a| a.is_active).collect();

        let moderator = members
            .iter()
            .find(|a| a.role == AgentRole::Moderator)
            .cloned()
            .ok_or(DomainError::IncompleteRoster)?;
        let participants: Vec<Agent> = members
            .iter()
            .filter(|a| a.role == AgentRole::Participant)
            .cloned()
            .collect();
        if participants.is_empty() {
            return Err(DomainError::IncompleteRoster);
        }
        let notetaker = members
            .iter()
            .find(|a| a.role == AgentRole::Notetaker)
            .cloned();

        Ok(Self {
            moderator,
            participants,
            notetaker,
            members,
        })
    }

    pub fn moderator(&self) -> &Agent {
        &self.moderator
    }

    pub fn participants(&self) -> &[Agent] {
        &self.participants
    }

    pub fn notetaker(&self) -> Option<&Agent> {
        self.notetaker.as_ref()
    }

    /// Every active agent, in stored order (memory is gathered from all)
    pub fn members(&self) -> &[Agent] {
        &self.members
    }
}
