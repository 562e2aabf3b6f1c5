//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types
//! once validated.

mod engine;
mod llm;
mod logging;
mod session;

pub use engine::FileEngineConfig;
pub use llm::FileLlmConfig;
pub use logging::FileLoggingConfig;
pub use session::FileSessionConfig;

use crewtalk_application::EngineConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("engine.max_cycles_per_phase cannot be 0")]
    ZeroCycles,

    #[error("engine.notetaker_interval cannot be 0")]
    ZeroNotetakerInterval,

    #[error("engine.temperature must be between 0 and 2, got {0}")]
    TemperatureOutOfRange(f32),

    #[error("llm.request_timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("model name cannot be empty")]
    EmptyModelName,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Scheduler settings
    pub engine: FileEngineConfig,
    /// Model server settings
    pub llm: FileLlmConfig,
    /// Defaults for new sessions
    pub session: FileSessionConfig,
    /// Transcript settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.engine.max_cycles_per_phase == 0 {
            return Err(ConfigValidationError::ZeroCycles);
        }
        if self.engine.notetaker_interval == 0 {
            return Err(ConfigValidationError::ZeroNotetakerInterval);
        }
        let temperature = self.engine.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigValidationError::TemperatureOutOfRange(temperature));
        }
        if let Some(0) = self.llm.request_timeout_seconds {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.llm.default_model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        Ok(())
    }

    /// Scheduler parameters for the application layer
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_max_cycles_per_phase(self.engine.max_cycles_per_phase)
            .with_notetaker_interval(self.engine.notetaker_interval)
            .with_temperature(self.engine.temperature)
            .with_memory_limit(self.engine.memory_limit)
            .with_default_model(self.llm.default_model.trim())
            .with_endpoint(self.llm.endpoint.clone())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.llm.request_timeout_seconds.map(Duration::from_secs)
    }
}
