//! Engine parameters: scheduler loop control.
//!
//! [`EngineConfig`] groups the static parameters that control how a
//! [`SessionEngine`](crate::use_cases::session_engine::SessionEngine) walks
//! its phases. These are application-layer concerns, not domain policy.

use crewtalk_domain::SHORT_TERM_LIMIT;
use serde::{Deserialize, Serialize};

/// Scheduler loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard cap on cycles per phase.
    pub max_cycles_per_phase: usize,
    /// The note-taker speaks after every `notetaker_interval`-th cycle.
    pub notetaker_interval: usize,
    /// Sampling temperature for every turn.
    pub temperature: f32,
    /// Model used when an agent has no model hint.
    pub default_model: String,
    /// Endpoint forwarded to the gateway with every request.
    pub endpoint: Option<String>,
    /// Capacity of each agent's short-term memory and of the merged view.
    pub memory_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cycles_per_phase: 8,
            notetaker_interval: 2,
            temperature: 0.2,
            default_model: "gemma3:4b-it-qat".to_string(),
            endpoint: None,
            memory_limit: SHORT_TERM_LIMIT,
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_max_cycles_per_phase(mut self, cycles: usize) -> Self {
        self.max_cycles_per_phase = cycles;
        self
    }

    pub fn with_notetaker_interval(mut self, interval: usize) -> Self {
        self.notetaker_interval = interval.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = limit;
        self
    }

    /// Model for an agent: its hint when set, otherwise the default.
    pub fn resolve_model<'a>(&'a self, model_hint: Option<&'a str>) -> &'a str {
        model_hint
            .map(str::trim)
            .filter(|hint| !hint.is_empty())
            .unwrap_or(&self.default_model)
    }

    /// Whether the note-taker speaks after the cycle numbered `cycle` (0-based)
    pub fn notetaker_due(&self, cycle: usize) -> bool {
        (cycle + 1) % self.notetaker_interval.max(1) == 0
    }
}
