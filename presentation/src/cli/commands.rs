//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// How session events are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Stream tokens as they are generated
    Live,
    /// Print each message once it is complete
    Messages,
    /// One JSON event envelope per line
    Json,
}

/// A participant given on the command line as `name[:trait[:model]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSpec {
    pub name: String,
    pub trait_tag: Option<String>,
    pub model: Option<String>,
}

impl FromStr for ParticipantSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(format!("participant '{}' needs a name", s));
        }
        let non_empty = |part: Option<&str>| {
            part.map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
        };
        Ok(Self {
            name: name.to_string(),
            trait_tag: non_empty(parts.next()),
            model: non_empty(parts.next()),
        })
    }
}

/// CLI arguments for crewtalk
#[derive(Parser, Debug)]
#[command(name = "crewtalk")]
#[command(author, version, about = "Multi-agent brainstorming sessions on local models")]
#[command(long_about = r#"
crewtalk runs a facilitated brainstorming session between language-model
agents: a moderator, one or more participants and an optional note-taker.

The session walks four phases (discover, define, develop, deliver) within a
fixed time budget. Within a phase agents speak in a fixed order, and the
moderator closes every phase with a summary.

Configuration files are loaded from (in priority order):
1. CREWTALK_* environment variables
2. --config <path>     Explicit config file
3. ./crewtalk.toml     Project-level config
4. ~/.config/crewtalk/config.toml   Global config

Example:
  crewtalk "How do we keep new sellers active after week one?" -p Ana -p Ben:contrarian
  crewtalk "Reduce support tickets" -p Ana:domain_expert -p Raj:risk_analyst:llama3.1:8b --notetaker Scribe
"#)]
pub struct Cli {
    /// The problem the session works on
    pub problem: Option<String>,

    /// Session title (defaults to the start of the problem statement)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Participant as `name[:trait[:model]]` (can be specified multiple times)
    #[arg(short, long = "participant", value_name = "SPEC")]
    pub participants: Vec<ParticipantSpec>,

    /// Moderator name
    #[arg(long, default_value = "Moderator")]
    pub moderator: String,

    /// Seat a note-taker with this name
    #[arg(long, value_name = "NAME")]
    pub notetaker: Option<String>,

    /// Total time budget in seconds (at least 120)
    #[arg(long, value_name = "SECONDS")]
    pub time_limit: Option<u64>,

    /// Model for agents without their own (overrides the config)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "live")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Title for the session
    pub fn session_title(&self, problem: &str) -> String {
        match &self.title {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => {
                let first_line = problem.lines().next().unwrap_or_default().trim();
                let title: String = first_line.chars().take(60).collect();
                if title.is_empty() {
                    "Brainstorm".to_string()
                } else {
                    title
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_spec_forms() {
        let plain: ParticipantSpec = "Ana".parse().unwrap();
        assert_eq!(plain.name, "Ana");
        assert_eq!(plain.trait_tag, None);

        let with_trait: ParticipantSpec = "Ben:contrarian".parse().unwrap();
        assert_eq!(with_trait.trait_tag.as_deref(), Some("contrarian"));
        assert_eq!(with_trait.model, None);

        // Model tags keep their own colon
        let full: ParticipantSpec = "Raj:risk_analyst:llama3.1:8b".parse().unwrap();
        assert_eq!(full.model.as_deref(), Some("llama3.1:8b"));

        let model_only: ParticipantSpec = "Kim::qwen2:7b".parse().unwrap();
        assert_eq!(model_only.trait_tag, None);
        assert_eq!(model_only.model.as_deref(), Some("qwen2:7b"));

        assert!(":contrarian".parse::<ParticipantSpec>().is_err());
    }

    #[test]
    fn test_parse_command_line() {
        let cli = Cli::try_parse_from([
            "crewtalk",
            "Keep new sellers active",
            "-p",
            "Ana",
            "-p",
            "Ben:contrarian",
            "--notetaker",
            "Scribe",
            "--time-limit",
            "300",
            "-o",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.problem.as_deref(), Some("Keep new sellers active"));
        assert_eq!(cli.participants.len(), 2);
        assert_eq!(cli.notetaker.as_deref(), Some("Scribe"));
        assert_eq!(cli.time_limit, Some(300));
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.moderator, "Moderator");
    }

    #[test]
    fn test_session_title_defaults_to_problem() {
        let cli = Cli::try_parse_from(["crewtalk"]).unwrap();
        assert_eq!(cli.session_title("Keep sellers\nmore detail"), "Keep sellers");
        assert_eq!(cli.session_title(""), "Brainstorm");

        let cli = Cli::try_parse_from(["crewtalk", "-t", "Retention"]).unwrap();
        assert_eq!(cli.session_title("anything"), "Retention");
    }
}
