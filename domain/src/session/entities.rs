//! Session domain entities

use crate::core::error::DomainError;
use crate::orchestration::phase::PhaseName;
use crate::orchestration::strategy::Strategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of a session.
///
/// `idle → running → {paused ⇄ running} → done`; `done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Done,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Done)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SessionStatus::Idle),
            "running" => Ok(SessionStatus::Running),
            "paused" => Ok(SessionStatus::Paused),
            "done" => Ok(SessionStatus::Done),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// A brainstorming session record (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub problem_statement: String,
    /// Strategy tag as stored; see [`Session::strategy`]
    pub strategy: String,
    pub phase: PhaseName,
    pub status: SessionStatus,
    pub time_limit_sec: u64,
    pub turn_index: u64,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a fresh idle session from creation input.
    pub fn create(id: impl Into<String>, input: NewSession) -> Self {
        Self {
            id: id.into(),
            title: input.title,
            problem_statement: input.problem_statement,
            strategy: input.strategy,
            phase: PhaseName::Discover,
            status: SessionStatus::Idle,
            time_limit_sec: input.time_limit_sec,
            turn_index: 0,
            deadline: None,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    /// Resolved strategy, or `None` when the stored tag is unsupported
    pub fn strategy(&self) -> Option<Strategy> {
        Strategy::from_tag(&self.strategy)
    }

    pub fn status_snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            phase: self.phase,
            turn_index: self.turn_index,
            deadline: self.deadline,
        }
    }

    /// Apply a partial update. `turn_index` never moves backwards.
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(phase) = patch.phase {
            self.phase = phase;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(turn_index) = patch.turn_index {
            self.turn_index = self.turn_index.max(turn_index);
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(ended_at) = patch.ended_at {
            self.ended_at = Some(ended_at);
        }
    }
}

/// Input for creating a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub problem_statement: String,
    pub time_limit_sec: u64,
    pub strategy: String,
}

impl NewSession {
    pub fn new(title: impl Into<String>, problem_statement: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            problem_statement: problem_statement.into(),
            time_limit_sec: 900,
            strategy: Strategy::DoubleDiamond.as_str().to_string(),
        }
    }

    pub fn with_time_limit(mut self, seconds: u64) -> Self {
        self.time_limit_sec = seconds;
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }
}

/// Partial update of a persisted session.
///
/// Unset fields are left untouched. `deadline` is doubly optional so the
/// deadline can be cleared explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub phase: Option<PhaseName>,
    pub status: Option<SessionStatus>,
    pub turn_index: Option<u64>,
    pub deadline: Option<Option<DateTime<Utc>>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(mut self, phase: PhaseName) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn turn_index(mut self, turn_index: u64) -> Self {
        self.turn_index = Some(turn_index);
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(Some(deadline));
        self
    }

    pub fn clear_deadline(mut self) -> Self {
        self.deadline = Some(None);
        self
    }

    pub fn started_at(mut self, at: DateTime<Utc>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn ended_at(mut self, at: DateTime<Utc>) -> Self {
        self.ended_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The `session.status` payload: what observers need to render progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: SessionStatus,
    pub phase: PhaseName,
    pub turn_index: u64,
    pub deadline: Option<DateTime<Utc>>,
}
