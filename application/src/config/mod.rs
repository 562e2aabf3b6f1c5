//! Application-level configuration.
//!
//! - [`EngineConfig`]: scheduler loop control (cycles, note-taker cadence,
//!   sampling temperature, default model)

pub mod engine_config;

pub use engine_config::EngineConfig;
