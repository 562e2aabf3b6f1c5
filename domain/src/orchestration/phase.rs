//! The Double Diamond phase table.
//!
//! A session always walks the same four phases in the same order. Each
//! phase gets an equal share of the total time budget; remainder seconds go
//! to the earliest phases so the durations always sum to the budget.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Budgets below this many seconds are raised to it.
pub const MIN_TOTAL_SECS: u64 = 120;

/// One of the four fixed phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PhaseName {
    #[default]
    Discover,
    Define,
    Develop,
    Deliver,
}

impl PhaseName {
    /// All phases in execution order
    pub const ALL: [PhaseName; 4] = [
        PhaseName::Discover,
        PhaseName::Define,
        PhaseName::Develop,
        PhaseName::Deliver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Discover => "discover",
            PhaseName::Define => "define",
            PhaseName::Develop => "develop",
            PhaseName::Deliver => "deliver",
        }
    }

    /// Position of this phase in [`PhaseName::ALL`]
    pub fn index(&self) -> usize {
        match self {
            PhaseName::Discover => 0,
            PhaseName::Define => 1,
            PhaseName::Develop => 2,
            PhaseName::Deliver => 3,
        }
    }

    /// One-line objective shown in the turn prompt header
    pub fn objective(&self) -> &'static str {
        match self {
            PhaseName::Discover => {
                "Explore the problem space, gather insights, and surface open questions."
            }
            PhaseName::Define => {
                "Synthesize findings into a clear problem statement and prioritize needs."
            }
            PhaseName::Develop => {
                "Generate solution concepts, stress test options, and refine promising ideas."
            }
            PhaseName::Deliver => {
                "Select a direction, outline execution steps, and call out success metrics."
            }
        }
    }

    /// Facilitation instruction sent as the system message of every turn
    pub fn facilitation_prompt(&self) -> &'static str {
        match self {
            PhaseName::Discover => {
                "You are facilitating the DISCOVER phase. Focus on gathering observations, \
                 user pains, and unmet needs. Encourage clarifying questions and avoid jumping \
                 to solutions yet."
            }
            PhaseName::Define => {
                "You are in the DEFINE phase. Summarize insights, frame the problem crisply, \
                 and push the team toward a shared articulation of the target outcome."
            }
            PhaseName::Develop => {
                "You are in the DEVELOP phase. Brainstorm solution approaches, compare trade-offs, \
                 and combine ideas into stronger directions. Keep responses concise and purposeful."
            }
            PhaseName::Deliver => {
                "You are in the DELIVER phase. Converge on an actionable plan, outline next steps, \
                 and highlight metrics or validation steps. End with any risks or asks."
            }
        }
    }
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PhaseName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "discover" => Ok(PhaseName::Discover),
            "define" => Ok(PhaseName::Define),
            "develop" => Ok(PhaseName::Develop),
            "deliver" => Ok(PhaseName::Deliver),
            other => Err(DomainError::InvalidPhase(other.to_string())),
        }
    }
}

/// A scheduled phase with its allotted duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    pub name: PhaseName,
    pub duration_secs: u64,
}

impl PhasePlan {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn objective(&self) -> &'static str {
        self.name.objective()
    }
}

/// Compute the four phases for a total time budget in seconds.
///
/// `duration[i] = total / 4 + (1 if i < total % 4)`, with `total` clamped
/// to at least [`MIN_TOTAL_SECS`].
pub fn plan_phases(total_secs: u64) -> Vec<PhasePlan> {
    let total = total_secs.max(MIN_TOTAL_SECS);
    let count = PhaseName::ALL.len() as u64;
    let base = total / count;
    let remainder = total % count;

    PhaseName::ALL
        .iter()
        .enumerate()
        .map(|(idx, name)| PhasePlan {
            name: *name,
            duration_secs: base + u64::from((idx as u64) < remainder),
        })
        .collect()
}
