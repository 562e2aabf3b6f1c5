//! Configuration file loading for crewtalk
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CREWTALK_*` environment variables (nested with `__`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./crewtalk.toml` or `./.crewtalk.toml`
//! 4. Global: `$XDG_CONFIG_HOME/crewtalk/config.toml` (or `~/.config/crewtalk/config.toml`)
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileEngineConfig, FileLlmConfig, FileLoggingConfig,
    FileSessionConfig,
};
pub use loader::ConfigLoader;
