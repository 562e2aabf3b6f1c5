//! Prompt templates for a single turn.
//!
//! Every turn sends exactly two messages: the phase facilitation
//! instruction as the system message, and a user message assembled from the
//! phase header, the speaker's identity, a mode directive, recent dialogue
//! and the notepad. The output is deterministic for the same inputs.

use crate::agent::entities::Agent;
use crate::core::string::{take_chars, truncate_with_ellipsis};
use crate::memory::{MemoryEntry, SHORT_TERM_LIMIT};
use crate::orchestration::phase::PhaseName;
use crate::prompt::chat::ChatMessage;

/// Characters of each remembered utterance shown in the prompt
pub const MEMORY_PREVIEW_CHARS: usize = 260;
/// Characters of the notepad shown in the prompt before the ellipsis
pub const NOTEPAD_PREVIEW_CHARS: usize = 400;

/// What a turn is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnMode {
    /// Regular contribution of at most 120 words
    #[default]
    Normal,
    /// Note-taker update of the shared notepad
    Notepad,
    /// Moderator's closing summary of a phase
    Summary,
}

impl TurnMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnMode::Normal => "normal",
            TurnMode::Notepad => "notepad",
            TurnMode::Summary => "summary",
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            TurnMode::Normal => "Respond succinctly (<=120 words). Advance the team's progress.",
            TurnMode::Notepad => "Update the shared notepad with key decisions and TODOs.",
            TurnMode::Summary => "Provide a concise summary that transitions to the next phase.",
        }
    }
}

/// Everything a turn prompt is built from
#[derive(Debug, Clone, Copy)]
pub struct TurnContext<'a> {
    pub phase: PhaseName,
    pub problem_statement: &'a str,
    pub agent: &'a Agent,
    pub mode: TurnMode,
    /// Merged recent dialogue, oldest first
    pub memories: &'a [MemoryEntry],
    pub notepad: &'a str,
}

/// Templates for generating turn prompts
pub struct TurnPrompt;

impl TurnPrompt {
    /// The two ordered messages for a turn: system, then user.
    pub fn messages(ctx: &TurnContext<'_>) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(ctx.phase.facilitation_prompt()),
            ChatMessage::user(Self::user_prompt(ctx)),
        ]
    }

    /// The user message for a turn
    pub fn user_prompt(ctx: &TurnContext<'_>) -> String {
        let mut lines = vec![format!(
            "Session phase: {} — {}",
            ctx.phase.as_str().to_uppercase(),
            ctx.phase.objective()
        )];

        let problem = ctx.problem_statement.trim();
        if !problem.is_empty() {
            lines.push(format!("Problem statement: {}", problem));
        }

        lines.push(format!("You are {} ({}).", ctx.agent.name, ctx.agent.role));
        if let Some(guidance) = ctx.agent.trait_guidance() {
            lines.push(format!("Trait guidance: {}.", guidance));
        }
        lines.push(ctx.mode.directive().to_string());

        if !ctx.memories.is_empty() {
            lines.push("\nRecent dialogue:".to_string());
            let skip = ctx.memories.len().saturating_sub(SHORT_TERM_LIMIT);
            for memory in &ctx.memories[skip..] {
                lines.push(format!(
                    "- {}: {}",
                    memory.agent,
                    take_chars(&memory.text, MEMORY_PREVIEW_CHARS)
                ));
            }
        }

        let notepad = ctx.notepad.trim();
        if !notepad.is_empty() {
            lines.push(format!(
                "\nNotepad snapshot:\n{}",
                truncate_with_ellipsis(notepad, NOTEPAD_PREVIEW_CHARS)
            ));
        }

        lines.push("\nState your confidence as `Confidence: <value between 0 and 1>`.".to_string());
        lines.join("\n")
    }
}
