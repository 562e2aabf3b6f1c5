//! Ollama LLM Gateway implementation

use super::protocol::{ChatBody, ChatChunk, ChatOptions, ChunkOutcome, TagsResponse};
use async_trait::async_trait;
use crewtalk_application::ports::llm_gateway::{
    ChatRequest, GatewayError, LlmGateway, StreamHandle,
};
use crewtalk_domain::StreamEvent;
use futures::StreamExt;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);
/// Fragments buffered between the HTTP reader and the engine
const STREAM_BUFFER: usize = 64;

/// LLM Gateway implementation for an Ollama server
pub struct OllamaGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl OllamaGateway {
    /// Create a gateway for the server at `endpoint`.
    ///
    /// `timeout` bounds a whole generation, streaming included.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        let endpoint = endpoint.into();
        info!(%endpoint, "OllamaGateway initialized");
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Names of the models the server has pulled; doubles as a health check.
    pub async fn list_models(&self) -> Result<Vec<String>, GatewayError> {
        let response = self
            .client
            .get(api_url(&self.endpoint, "api/tags"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "GET /api/tags returned {}",
                status
            )));
        }
        let tags: TagsResponse = response.json().await.map_err(map_request_error)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LlmGateway for OllamaGateway {
    async fn stream_chat(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError> {
        let base = request.endpoint.as_deref().unwrap_or(&self.endpoint);
        let body = ChatBody {
            model: &request.model,
            messages: &request.messages,
            stream: true,
            options: ChatOptions {
                temperature: request.temperature,
                stop: request.stop.as_deref(),
            },
        };

        debug!(model = %request.model, endpoint = %base, "Starting chat stream");
        let response = self
            .client
            .post(api_url(base, "api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::ModelNotAvailable(request.model));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!(
                "POST /api/chat returned {}: {}",
                status,
                detail.trim()
            )));
        }

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(pump(response, tx));
        Ok(StreamHandle::new(rx))
    }
}

/// Forward decoded stream events until a terminal one or until the reader
/// goes away (dropping the response closes the connection).
async fn pump(response: reqwest::Response, tx: mpsc::Sender<StreamEvent>) {
    let mut bytes = response.bytes_stream();
    let mut decoder = NdjsonDecoder::default();

    while let Some(chunk) = bytes.next().await {
        let events = match chunk {
            Ok(chunk) => decoder.feed(&chunk),
            Err(e) => {
                warn!(error = %e, "Chat stream interrupted");
                vec![StreamEvent::Error(e.to_string())]
            }
        };
        for event in events {
            let terminal = event.is_terminal();
            if tx.send(event).await.is_err() || terminal {
                return;
            }
        }
    }

    for event in decoder.finish() {
        if tx.send(event).await.is_err() {
            return;
        }
    }
}

/// Incremental decoder for `/api/chat` NDJSON bodies
#[derive(Default)]
struct NdjsonDecoder {
    pending: Vec<u8>,
    text: String,
    finished: bool,
}

impl NdjsonDecoder {
    /// Decode every complete line in `bytes` plus what was pending.
    fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        self.pending.extend_from_slice(bytes);
        let mut events = Vec::new();
        while !self.finished
            && let Some(pos) = self.pending.iter().position(|b| *b == b'\n')
        {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.decode_line(&String::from_utf8_lossy(&line), &mut events);
        }
        events
    }

    /// Flush a trailing unterminated line; a body that ends without a
    /// `done` line still completes with what was received.
    fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        let rest = std::mem::take(&mut self.pending);
        self.decode_line(&String::from_utf8_lossy(&rest), &mut events);
        if !self.finished {
            self.finished = true;
            events.push(StreamEvent::Completed(std::mem::take(&mut self.text)));
        }
        events
    }

    fn decode_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        match ChatChunk::parse_line(line) {
            None => {}
            Some(ChunkOutcome::Fragment(text)) => {
                if !text.is_empty() {
                    self.text.push_str(&text);
                    events.push(StreamEvent::Delta(text));
                }
            }
            Some(ChunkOutcome::Done(text)) => {
                if !text.is_empty() {
                    self.text.push_str(&text);
                    events.push(StreamEvent::Delta(text));
                }
                self.finished = true;
                events.push(StreamEvent::Completed(std::mem::take(&mut self.text)));
            }
            Some(ChunkOutcome::Failed(error)) => {
                self.finished = true;
                events.push(StreamEvent::Error(error));
            }
        }
    }
}

fn api_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

fn map_request_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else if error.is_connect() {
        GatewayError::ConnectionError(error.to_string())
    } else {
        GatewayError::RequestFailed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crewtalk_domain::ChatMessage;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer exactly one HTTP request with `status` and `body`; resolves to
    /// the raw request text.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (base, handle)
    }

    fn request(model: &str) -> ChatRequest {
        ChatRequest::new(model, vec![ChatMessage::user("Pitch one idea.")]).with_temperature(0.4)
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = NdjsonDecoder::default();
        let mut events = decoder.feed(br#"{"message":{"content":"Hel"},"done":false}
{"message":{"cont"#);
        events.extend(decoder.feed(br#"ent":"lo"},"done":false}
{"message":{"content":""},"done":true}
"#));
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".to_string()),
                StreamEvent::Delta("lo".to_string()),
                StreamEvent::Completed("Hello".to_string()),
            ]
        );
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_decoder_completes_body_without_done_line() {
        let mut decoder = NdjsonDecoder::default();
        let events = decoder.feed(br#"{"message":{"content":"partial"},"done":false}"#);
        assert!(events.is_empty());
        assert_eq!(
            decoder.finish(),
            vec![
                StreamEvent::Delta("partial".to_string()),
                StreamEvent::Completed("partial".to_string()),
            ]
        );
    }

    #[test]
    fn test_decoder_reports_error_line() {
        let mut decoder = NdjsonDecoder::default();
        let events = decoder.feed(b"{\"error\":\"out of memory\"}\n{\"done\":true}\n");
        assert_eq!(events, vec![StreamEvent::Error("out of memory".to_string())]);
    }

    #[test]
    fn test_api_url_trims_slash() {
        assert_eq!(api_url("http://h:11434/", "api/chat"), "http://h:11434/api/chat");
        assert_eq!(api_url("http://h:11434", "api/tags"), "http://h:11434/api/tags");
    }

    #[tokio::test]
    async fn test_stream_chat_against_local_server() {
        let body = [
            r#"{"message":{"role":"assistant","content":"Free "},"done":false}"#,
            r#"{"message":{"role":"assistant","content":"onboarding."},"done":false}"#,
            r#"{"message":{"role":"assistant","content":""},"done":true}"#,
        ]
        .join("\n")
            + "\n";
        let (base, server) = serve_once("200 OK", body).await;
        let gateway = OllamaGateway::new(base, Some(Duration::from_secs(5))).unwrap();

        let handle = gateway.stream_chat(request("gemma3:4b-it-qat")).await.unwrap();
        assert_eq!(handle.collect_text().await.unwrap(), "Free onboarding.");

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/chat"));
        let json_start = raw.find('{').unwrap();
        let sent: serde_json::Value = serde_json::from_str(&raw[json_start..]).unwrap();
        assert_eq!(sent["model"], "gemma3:4b-it-qat");
        assert_eq!(sent["stream"], true);
        assert_eq!(sent["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_request_endpoint_overrides_default() {
        let body = "{\"message\":{\"content\":\"ok\"},\"done\":true}\n".to_string();
        let (base, server) = serve_once("200 OK", body).await;
        let gateway = OllamaGateway::new("http://127.0.0.1:9", None).unwrap();

        let handle = gateway
            .stream_chat(request("m").with_endpoint(base))
            .await
            .unwrap();
        assert_eq!(handle.collect_text().await.unwrap(), "ok");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_model_is_reported() {
        let (base, server) =
            serve_once("404 Not Found", r#"{"error":"model not found"}"#.to_string()).await;
        let gateway = OllamaGateway::new(base, None).unwrap();

        let error = gateway.stream_chat(request("nope:1b")).await.unwrap_err();
        assert_eq!(error, GatewayError::ModelNotAvailable("nope:1b".to_string()));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_list_models() {
        let body = r#"{"models":[{"name":"gemma3:4b-it-qat","size":1},{"name":"llama3.1:8b"}]}"#;
        let (base, server) = serve_once("200 OK", body.to_string()).await;
        let gateway = OllamaGateway::new(base, None).unwrap();

        let models = gateway.list_models().await.unwrap();
        assert_eq!(models, vec!["gemma3:4b-it-qat", "llama3.1:8b"]);
        assert!(server.await.unwrap().starts_with("GET /api/tags"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let gateway = OllamaGateway::new(base, None).unwrap();
        let error = gateway.stream_chat(request("m")).await.unwrap_err();
        assert!(matches!(error, GatewayError::ConnectionError(_)));
    }
}
