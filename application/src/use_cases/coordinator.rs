//! Session coordinator
//!
//! Process-wide registry mapping session ids to their engines. Engines are
//! created on first start and evicted once their run has ended.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::use_cases::session_engine::{EnginePorts, SessionEngine};
use crewtalk_domain::{Session, StatusSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

type Engines = Arc<Mutex<HashMap<String, Arc<SessionEngine>>>>;

/// Routes control requests to per-session engines
pub struct SessionCoordinator {
    ports: EnginePorts,
    config: EngineConfig,
    engines: Engines,
}

fn lock(engines: &Engines) -> MutexGuard<'_, HashMap<String, Arc<SessionEngine>>> {
    engines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SessionCoordinator {
    pub fn new(ports: EnginePorts, config: EngineConfig) -> Self {
        Self {
            ports,
            config,
            engines: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ports(&self) -> &EnginePorts {
        &self.ports
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The registered engine for a session, if any
    pub fn engine(&self, session_id: &str) -> Option<Arc<SessionEngine>> {
        lock(&self.engines).get(session_id).cloned()
    }

    /// Ids of sessions with a registered engine
    pub fn active_sessions(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.engines).keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn start(&self, session_id: &str) -> Result<StatusSnapshot, EngineError> {
        self.load(session_id).await?;
        let engine = self.engine_or_create(session_id);
        if let Err(error) = engine.start().await {
            // A rejected start must not leave an idle engine behind.
            let mut engines = lock(&self.engines);
            let registered = engines
                .get(session_id)
                .is_some_and(|current| Arc::ptr_eq(current, &engine));
            if registered && !engine.is_active() {
                engines.remove(session_id);
            }
            return Err(error);
        }
        self.evict_when_finished(engine);
        self.status(session_id).await
    }

    pub async fn pause(&self, session_id: &str) -> Result<StatusSnapshot, EngineError> {
        self.load(session_id).await?;
        if let Some(engine) = self.engine(session_id) {
            engine.pause().await?;
        }
        self.status(session_id).await
    }

    pub async fn resume(&self, session_id: &str) -> Result<StatusSnapshot, EngineError> {
        self.load(session_id).await?;
        if let Some(engine) = self.engine(session_id) {
            engine.resume().await?;
        }
        self.status(session_id).await
    }

    /// Stop a session and wait for its scheduler to wind down.
    pub async fn stop(&self, session_id: &str) -> Result<StatusSnapshot, EngineError> {
        self.load(session_id).await?;
        if let Some(engine) = self.engine(session_id) {
            engine.stop().await?;
        }
        self.status(session_id).await
    }

    pub async fn advance_phase(&self, session_id: &str) -> Result<StatusSnapshot, EngineError> {
        self.load(session_id).await?;
        if let Some(engine) = self.engine(session_id) {
            engine.advance_phase();
        }
        self.status(session_id).await
    }

    /// Persisted status of a session
    pub async fn status(&self, session_id: &str) -> Result<StatusSnapshot, EngineError> {
        Ok(self.load(session_id).await?.status_snapshot())
    }

    async fn load(&self, session_id: &str) -> Result<Session, EngineError> {
        self.ports
            .repository
            .get_session(session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(session_id))
    }

    fn engine_or_create(&self, session_id: &str) -> Arc<SessionEngine> {
        let mut engines = lock(&self.engines);
        Arc::clone(engines.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "Creating session engine");
            Arc::new(SessionEngine::new(
                session_id,
                self.ports.clone(),
                self.config.clone(),
            ))
        }))
    }

    /// Drop the registry entry once the run ends, unless the same engine
    /// has been started again in the meantime.
    fn evict_when_finished(&self, engine: Arc<SessionEngine>) {
        let engines = Arc::clone(&self.engines);
        tokio::spawn(async move {
            engine.wait_finished().await;
            let mut registry = lock(&engines);
            let current = registry
                .get(engine.session_id())
                .is_some_and(|registered| Arc::ptr_eq(registered, &engine));
            if current && !engine.is_active() {
                registry.remove(engine.session_id());
                debug!(session_id = %engine.session_id(), "Evicted finished session engine");
            }
        });
    }
}
