//! Presentation layer for crewtalk
//!
//! This crate contains the CLI definition, the console renderer for live
//! session events and the turn spinner.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat, ParticipantSpec};
pub use output::console::ConsoleRenderer;
pub use progress::reporter::TurnSpinner;
