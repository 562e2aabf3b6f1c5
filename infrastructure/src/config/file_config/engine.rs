//! Scheduler configuration from TOML (`[engine]` section)
//!
//! ```toml
//! [engine]
//! max_cycles_per_phase = 8
//! notetaker_interval = 2
//! temperature = 0.2
//! memory_limit = 8
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Hard cap on cycles per phase
    pub max_cycles_per_phase: usize,
    /// The note-taker speaks after every N-th cycle
    pub notetaker_interval: usize,
    /// Sampling temperature for every turn
    pub temperature: f32,
    /// Short-term memory entries kept per agent and shown in prompts
    pub memory_limit: usize,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            max_cycles_per_phase: 8,
            notetaker_interval: 2,
            temperature: 0.2,
            memory_limit: 8,
        }
    }
}
