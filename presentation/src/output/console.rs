//! Console rendering of live session events

use crate::cli::commands::OutputFormat;
use colored::Colorize;
use crewtalk_application::SessionExport;
use crewtalk_domain::{Agent, ErrorScope, EventEnvelope, SessionEvent, SessionStatus};
use std::collections::HashMap;

/// Turns event envelopes into terminal text
pub struct ConsoleRenderer {
    format: OutputFormat,
    names: HashMap<String, String>,
    /// Agent whose tokens are currently being streamed
    streaming: Option<String>,
    last_status: Option<SessionStatus>,
}

impl ConsoleRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            names: HashMap::new(),
            streaming: None,
            last_status: None,
        }
    }

    /// Remember an agent so its messages are labelled by name
    pub fn register(&mut self, agent: &Agent) {
        self.names.insert(agent.id.clone(), agent.name.clone());
    }

    fn name_of<'a>(&'a self, agent_id: &'a str) -> &'a str {
        self.names.get(agent_id).map(String::as_str).unwrap_or(agent_id)
    }

    /// Render one event. Returns `None` when the event prints nothing.
    ///
    /// The returned text carries its own newlines and is meant for `print!`.
    pub fn render(&mut self, envelope: &EventEnvelope) -> Option<String> {
        if self.format == OutputFormat::Json {
            return serde_json::to_string(envelope).ok().map(|line| line + "\n");
        }

        match &envelope.event {
            SessionEvent::SessionStatus(snapshot) => {
                let previous = self.last_status.replace(snapshot.status);
                if previous == Some(snapshot.status) {
                    return None;
                }
                self.status_line(previous, snapshot.status)
            }
            SessionEvent::PhaseChanged { to, deadline, .. } => {
                let heading = format!(
                    "{} (until {})",
                    to.as_str().to_uppercase(),
                    deadline.format("%H:%M:%S")
                );
                Some(self.line(Self::section_header(&heading)))
            }
            SessionEvent::TokenDelta {
                agent_id,
                text_delta,
                ..
            } => {
                if self.format != OutputFormat::Live {
                    return None;
                }
                let mut out = String::new();
                if self.streaming.as_deref() != Some(agent_id.as_str()) {
                    if self.streaming.is_some() {
                        out.push('\n');
                    }
                    out.push_str(&format!("\n{}\n", self.speaker(agent_id)));
                    self.streaming = Some(agent_id.clone());
                }
                out.push_str(text_delta);
                Some(out)
            }
            SessionEvent::MessageCreated(message) => {
                let scores = format!(
                    "[sentiment {:+.2} | confidence {:.2}]",
                    message.sentiment, message.confidence
                )
                .dimmed()
                .to_string();
                match self.format {
                    OutputFormat::Live => {
                        let mut out = String::new();
                        if self.streaming.as_deref() != Some(message.agent_id.as_str()) {
                            // Nothing was streamed for this turn
                            out.push_str(&self.line(String::new()));
                            out.push_str(&format!("\n{}\n{}", self.speaker(&message.agent_id), message.text));
                        }
                        self.streaming = None;
                        out.push_str(&format!("\n{}\n", scores));
                        Some(out)
                    }
                    _ => Some(format!(
                        "\n{} {}\n{}\n",
                        self.speaker(&message.agent_id),
                        scores,
                        message.text
                    )),
                }
            }
            SessionEvent::NotepadUpdated {
                content,
                updated_by,
            } => {
                let by = updated_by.as_deref().unwrap_or("someone");
                Some(self.line(format!(
                    "{}\n{}",
                    format!("Notepad updated by {}:", by).cyan().bold(),
                    content
                )))
            }
            SessionEvent::Error {
                scope,
                message,
                details,
            } => {
                let label = match scope {
                    ErrorScope::Agent => "agent error",
                    ErrorScope::Session => "session error",
                };
                Some(self.line(format!(
                    "{} {}: {}",
                    format!("[{}]", label).red().bold(),
                    message,
                    details
                )))
            }
            SessionEvent::SessionClosed {} => None,
        }
    }

    fn status_line(&mut self, previous: Option<SessionStatus>, status: SessionStatus) -> Option<String> {
        match status {
            SessionStatus::Paused => Some(self.line("-- paused --".yellow().to_string())),
            SessionStatus::Done => Some(self.line("-- session done --".green().bold().to_string())),
            SessionStatus::Running if previous == Some(SessionStatus::Paused) => {
                Some(self.line("-- resumed --".yellow().to_string()))
            }
            _ => None,
        }
    }

    /// A full line, closing any half-streamed message first
    fn line(&mut self, text: String) -> String {
        let prefix = if self.streaming.take().is_some() { "\n" } else { "" };
        if text.is_empty() {
            prefix.to_string()
        } else {
            format!("{}{}\n", prefix, text)
        }
    }

    fn speaker(&self, agent_id: &str) -> String {
        format!("{}:", self.name_of(agent_id)).yellow().bold().to_string()
    }

    /// Closing summary of a finished session
    pub fn summary(export: &SessionExport) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&export.session.title));
        output.push('\n');
        output.push_str(&format!(
            "{} {}\n",
            "Problem:".cyan().bold(),
            export.session.problem_statement
        ));
        output.push_str(&format!(
            "{} {} (phase {}, {} turns)\n",
            "Status:".cyan().bold(),
            export.session.status,
            export.session.phase,
            export.session.turn_index
        ));

        output.push_str(&format!("{}\n", "Agents:".cyan().bold()));
        for agent in &export.agents {
            let count = export
                .messages
                .iter()
                .filter(|m| m.agent_id == agent.id)
                .count();
            output.push_str(&format!(
                "  * {} ({}) - {} messages\n",
                agent.name, agent.role, count
            ));
        }

        if !export.messages.is_empty() {
            let n = export.messages.len() as f64;
            let sentiment = export.messages.iter().map(|m| m.sentiment).sum::<f64>() / n;
            let confidence = export.messages.iter().map(|m| m.confidence).sum::<f64>() / n;
            output.push_str(&format!(
                "{} sentiment {:+.2}, confidence {:.2}\n",
                "Averages:".cyan().bold(),
                sentiment,
                confidence
            ));
        }

        if !export.notepad.trim().is_empty() {
            output.push_str(&Self::section_header("Notepad"));
            output.push('\n');
            output.push_str(export.notepad.trim());
            output.push('\n');
        }

        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("\n{}\n{}\n{}\n", line.cyan(), title.cyan().bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}", format!("== {} ==", title).blue().bold())
    }
}
