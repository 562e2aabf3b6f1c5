//! Wire types for the Ollama HTTP API.

use crewtalk_domain::ChatMessage;
use serde::{Deserialize, Serialize};

/// `POST /api/chat` body
#[derive(Debug, Serialize)]
pub struct ChatBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    pub options: ChatOptions<'a>,
}

#[derive(Debug, Serialize)]
pub struct ChatOptions<'a> {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<&'a [String]>,
}

/// One NDJSON line of a streamed chat answer
#[derive(Debug, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkMessage {
    #[serde(default)]
    pub content: String,
}

/// What a single stream line means for the caller
#[derive(Debug, PartialEq)]
pub enum ChunkOutcome {
    Fragment(String),
    Done(String),
    Failed(String),
}

impl ChatChunk {
    /// Interpret one NDJSON line. Blank lines yield `None`.
    pub fn parse_line(line: &str) -> Option<ChunkOutcome> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let chunk: ChatChunk = match serde_json::from_str(line) {
            Ok(chunk) => chunk,
            Err(e) => return Some(ChunkOutcome::Failed(format!("malformed stream line: {}", e))),
        };
        if let Some(error) = chunk.error {
            return Some(ChunkOutcome::Failed(error));
        }
        let content = chunk.message.map(|m| m.content).unwrap_or_default();
        if chunk.done {
            Some(ChunkOutcome::Done(content))
        } else {
            Some(ChunkOutcome::Fragment(content))
        }
    }
}

/// `GET /api/tags` answer
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TagEntry {
    pub name: String,
}
