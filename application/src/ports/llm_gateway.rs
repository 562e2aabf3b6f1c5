//! LLM Gateway port
//!
//! Defines the interface for streaming text from a language model.

use async_trait::async_trait;
use crewtalk_domain::{ChatMessage, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Instruction used to check that an agent's model answers at all
pub const PROBE_PROMPT: &str = "Reply 'ready' if you can hear me.";

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport closed")]
    TransportClosed,
}

/// A single streaming chat request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    /// Ordered, role-tagged messages
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub stop: Option<Vec<String>>,
    /// Overrides the gateway's configured endpoint
    pub endpoint: Option<String>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.2,
            stop: None,
            endpoint: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = (!stop.is_empty()).then_some(stop);
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Handle for receiving streaming events from a model.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. The stream is finite and cannot
/// be restarted; dropping the handle abandons the generation.
#[derive(Debug)]
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Next text fragment, `None` once the stream has ended.
    ///
    /// A `Completed` event carrying text that was never delivered as deltas
    /// is surfaced as a final fragment.
    pub async fn next_fragment(
        &mut self,
        seen_text: bool,
    ) -> Option<Result<String, GatewayError>> {
        match self.receiver.recv().await? {
            StreamEvent::Delta(chunk) => Some(Ok(chunk)),
            StreamEvent::Completed(text) => {
                self.receiver.close();
                if seen_text || text.is_empty() {
                    None
                } else {
                    Some(Ok(text))
                }
            }
            StreamEvent::Error(e) => {
                self.receiver.close();
                Some(Err(GatewayError::RequestFailed(e)))
            }
        }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(fragment) = self.next_fragment(!full_text.is_empty()).await {
            full_text.push_str(&fragment?);
        }
        Ok(full_text)
    }
}

/// Gateway for streaming model output
///
/// This port defines how the application layer talks to language models.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Start a streaming generation.
    async fn stream_chat(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError>;

    /// One-shot connectivity check for a model; returns the model's reply.
    async fn probe(&self, model: &str) -> Result<String, GatewayError> {
        let request = ChatRequest::new(model, vec![ChatMessage::user(PROBE_PROMPT)]);
        self.stream_chat(request).await?.collect_text().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn handle_with(events: Vec<StreamEvent>) -> StreamHandle {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.send(event).await.unwrap();
        }
        StreamHandle::new(rx)
    }

    #[tokio::test]
    async fn test_collect_text_joins_deltas() {
        let handle = handle_with(vec![
            StreamEvent::Delta("Hel".to_string()),
            StreamEvent::Delta("".to_string()),
            StreamEvent::Delta("lo".to_string()),
            StreamEvent::Completed("Hello".to_string()),
        ])
        .await;
        assert_eq!(handle.collect_text().await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_completed_only_stream_yields_text() {
        let handle = handle_with(vec![StreamEvent::Completed("ready".to_string())]).await;
        assert_eq!(handle.collect_text().await.unwrap(), "ready");
    }

    #[tokio::test]
    async fn test_error_mid_stream() {
        let handle = handle_with(vec![
            StreamEvent::Delta("par".to_string()),
            StreamEvent::Error("connection reset".to_string()),
        ])
        .await;
        let err = handle.collect_text().await.unwrap_err();
        assert_eq!(err, GatewayError::RequestFailed("connection reset".to_string()));
    }

    #[tokio::test]
    async fn test_closed_channel_ends_stream() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(StreamEvent::Delta("partial".to_string())).await.unwrap();
        drop(tx);
        let handle = StreamHandle::new(rx);
        assert_eq!(handle.collect_text().await.unwrap(), "partial");
    }

    #[tokio::test]
    async fn test_handle_result_can_be_unwrapped_in_tests() {
        // `Result<StreamHandle, _>::unwrap_err` needs `StreamHandle: Debug`
        let result: Result<StreamHandle, GatewayError> = Ok(handle_with(vec![]).await);
        assert!(format!("{:?}", result).contains("StreamHandle"));

        let failed: Result<StreamHandle, GatewayError> = Err(GatewayError::Timeout);
        assert_eq!(failed.unwrap_err(), GatewayError::Timeout);
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new("gemma3", vec![ChatMessage::user("hi")])
            .with_temperature(0.7)
            .with_stop(vec![])
            .with_endpoint("http://localhost:11434");
        assert_eq!(request.temperature, 0.7);
        assert!(request.stop.is_none());
        assert_eq!(request.endpoint.as_deref(), Some("http://localhost:11434"));
    }
}
