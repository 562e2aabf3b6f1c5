//! Session defaults from TOML (`[session]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    /// Total time budget for new sessions, in seconds
    pub time_limit_sec: u64,
    /// Facilitation strategy tag
    pub strategy: String,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            time_limit_sec: 900,
            strategy: "double_diamond".to_string(),
        }
    }
}
