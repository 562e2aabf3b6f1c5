//! In-memory ports and a scripted model gateway shared by the use case tests.

use crate::broadcast::Broadcaster;
use crate::ports::clock::Clock;
use crate::ports::conversation_logger::NoConversationLogger;
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway, StreamHandle};
use crate::ports::session_repository::{
    MemoryStore, RepositoryError, ScratchpadStore, SessionRepository,
};
use crate::use_cases::session_engine::EnginePorts;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use crewtalk_domain::{
    Agent, AgentRole, Message, NewAgent, NewMessage, NewSession, NotepadSnapshot, Session,
    SessionPatch, StreamEvent,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct MemoryRepository {
    sessions: Mutex<HashMap<String, Session>>,
    agents: Mutex<Vec<Agent>>,
    messages: Mutex<Vec<Message>>,
    snapshots: Mutex<Vec<NotepadSnapshot>>,
    update_calls: Mutex<usize>,
    failing_update: Mutex<Option<usize>>,
}

impl MemoryRepository {
    /// Make the `n`-th `update_session` call (1-based) fail with a storage error
    pub fn fail_update_number(&self, n: usize) {
        *self.failing_update.lock().unwrap() = Some(n);
    }

    pub fn session(&self, session_id: &str) -> Session {
        self.sessions.lock().unwrap()[session_id].clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionRepository for MemoryRepository {
    async fn create_session(&self, input: NewSession) -> Result<Session, RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = Session::create(format!("s-{}", sessions.len() + 1), input);
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, RepositoryError> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn update_session(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<(), RepositoryError> {
        let call = {
            let mut calls = self.update_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if *self.failing_update.lock().unwrap() == Some(call) {
            return Err(RepositoryError::Storage("disk full".to_string()));
        }
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| RepositoryError::SessionNotFound(session_id.to_string()))?;
        session.apply(&patch);
        Ok(())
    }

    async fn add_agent(&self, input: NewAgent) -> Result<Agent, RepositoryError> {
        let mut agents = self.agents.lock().unwrap();
        let agent = input.into_agent(format!("a-{}", agents.len() + 1), Utc::now());
        agents.push(agent.clone());
        Ok(agent)
    }

    async fn list_agents(&self, session_id: &str) -> Result<Vec<Agent>, RepositoryError> {
        Ok(self
            .agents
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn save_message(&self, input: NewMessage) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.lock().unwrap();
        let message = input.into_message(messages.len() as u64 + 1, Utc::now());
        messages.push(message.clone());
        Ok(message)
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let all = self.list_messages(session_id).await?;
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn save_notepad_snapshot(
        &self,
        session_id: &str,
        content: &str,
        updated_by: Option<&str>,
    ) -> Result<NotepadSnapshot, RepositoryError> {
        let mut snapshots = self.snapshots.lock().unwrap();
        let snapshot = NotepadSnapshot {
            id: snapshots.len() as u64 + 1,
            session_id: session_id.to_string(),
            content: content.to_string(),
            updated_by: updated_by.map(str::to_string),
            created_at: Utc::now(),
        };
        snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn list_notepad_snapshots(
        &self,
        session_id: &str,
    ) -> Result<Vec<NotepadSnapshot>, RepositoryError> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryKv {
    pads: Mutex<HashMap<String, String>>,
    lists: Mutex<HashMap<(String, String), VecDeque<String>>>,
}

#[async_trait]
impl ScratchpadStore for MemoryKv {
    async fn get(&self, session_id: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.pads.lock().unwrap().get(session_id).cloned())
    }

    async fn set(&self, session_id: &str, content: &str) -> Result<(), RepositoryError> {
        self.pads
            .lock()
            .unwrap()
            .insert(session_id.to_string(), content.to_string());
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for MemoryKv {
    async fn push_front_trimmed(
        &self,
        session_id: &str,
        agent: &str,
        value: String,
        capacity: usize,
    ) -> Result<(), RepositoryError> {
        let mut lists = self.lists.lock().unwrap();
        let list = lists
            .entry((session_id.to_string(), agent.to_string()))
            .or_default();
        list.push_front(value);
        list.truncate(capacity);
        Ok(())
    }

    async fn range(
        &self,
        session_id: &str,
        agent: &str,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError> {
        let lists = self.lists.lock().unwrap();
        Ok(lists
            .get(&(session_id.to_string(), agent.to_string()))
            .map(|l| l.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// Clock that moves forward by `step` every time it is read
pub struct SteppingClock {
    now: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            now: Mutex::new(Utc::now()),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap();
        let current = *now;
        *now = current + self.step;
        current
    }
}

/// What the scripted gateway does for one call
#[derive(Debug, Clone)]
pub enum Script {
    Reply(Vec<&'static str>),
    Fail,
    /// Never finishes; the stream stays open
    Hang,
    Panic,
}

/// Gateway that plays back scripts in call order, then repeats `fallback`
pub struct ScriptedGateway {
    scripts: Mutex<VecDeque<Script>>,
    fallback: Script,
    requests: Mutex<Vec<ChatRequest>>,
    open_streams: Mutex<Vec<mpsc::Sender<StreamEvent>>>,
}

impl ScriptedGateway {
    pub fn new(fallback: Script) -> Self {
        Self {
            scripts: Mutex::new(VecDeque::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
            open_streams: Mutex::new(Vec::new()),
        }
    }

    pub fn replying() -> Self {
        Self::new(Script::Reply(vec!["We should ", "try it. Confidence: 0.8"]))
    }

    pub fn then(self, script: Script) -> Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn stream_chat(&self, request: ChatRequest) -> Result<StreamHandle, GatewayError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match script {
            Script::Reply(chunks) => {
                let (tx, rx) = mpsc::channel(chunks.len() + 1);
                for chunk in &chunks {
                    tx.try_send(StreamEvent::Delta(chunk.to_string())).unwrap();
                }
                tx.try_send(StreamEvent::Completed(chunks.concat())).unwrap();
                Ok(StreamHandle::new(rx))
            }
            Script::Fail => Err(GatewayError::ConnectionError("refused".to_string())),
            Script::Hang => {
                let (tx, rx) = mpsc::channel(1);
                self.open_streams.lock().unwrap().push(tx);
                Ok(StreamHandle::new(rx))
            }
            Script::Panic => panic!("model adapter exploded"),
        }
    }
}

pub struct Fixture {
    pub repository: Arc<MemoryRepository>,
    pub kv: Arc<MemoryKv>,
    pub gateway: Arc<ScriptedGateway>,
    pub broadcaster: Arc<Broadcaster>,
}

impl Fixture {
    pub fn new(gateway: ScriptedGateway) -> Self {
        Self {
            repository: Arc::new(MemoryRepository::default()),
            kv: Arc::new(MemoryKv::default()),
            gateway: Arc::new(gateway),
            broadcaster: Arc::new(Broadcaster::new()),
        }
    }

    pub fn ports(&self) -> EnginePorts {
        EnginePorts {
            repository: self.repository.clone(),
            scratchpad: self.kv.clone(),
            memory: self.kv.clone(),
            gateway: self.gateway.clone(),
            broadcaster: self.broadcaster.clone(),
            logger: Arc::new(NoConversationLogger),
        }
    }

    /// A session with a moderator and one participant per name
    pub async fn seeded_session(&self, participants: &[&str]) -> Session {
        let session = self
            .repository
            .create_session(NewSession::new("Retention", "Keep new sellers active").with_time_limit(600))
            .await
            .unwrap();
        self.add(&session.id, "Mod", AgentRole::Moderator).await;
        for name in participants {
            self.add(&session.id, name, AgentRole::Participant).await;
        }
        session
    }

    pub async fn add(&self, session_id: &str, name: &str, role: AgentRole) -> Agent {
        self.repository
            .add_agent(NewAgent::new(session_id, name, role))
            .await
            .unwrap()
    }
}
