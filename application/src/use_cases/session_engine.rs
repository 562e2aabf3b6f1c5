//! Session engine
//!
//! The per-session scheduler and state machine. One engine owns one
//! session's run: it walks the phase table, executes turns strictly in
//! order (moderator, participants, every other cycle the note-taker) and
//! mirrors every state change to the repository and the broadcaster.
//!
//! ```text
//! idle ──start──▶ running ◀──resume── paused
//!                    │  └────pause────▶ │
//!                    └──stop / end──▶ done ◀──stop──┘
//! ```
//!
//! In-memory state is authoritative during a run; the repository is a
//! write-through mirror. Whatever ends the run (phases exhausted, stop,
//! error or panic inside the loop) the same cleanup marks the session done.

use crate::broadcast::Broadcaster;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ports::clock::{Clock, SystemClock};
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use crate::ports::session_repository::{MemoryStore, ScratchpadStore, SessionRepository};
use crate::use_cases::short_term_memory::ShortTermMemory;
use chrono::{DateTime, Utc};
use crewtalk_domain::{
    Agent, EMPTY_RESPONSE_PLACEHOLDER, MessagePayload, NewMessage, PhaseName, PhasePlan, Roster,
    Session, SessionEvent, SessionPatch, SessionStatus, StatusSnapshot, TurnContext, TurnMode,
    TurnPrompt, confidence_score, plan_phases, sentiment_score,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Adapters an engine talks to
#[derive(Clone)]
pub struct EnginePorts {
    pub repository: Arc<dyn SessionRepository>,
    pub scratchpad: Arc<dyn ScratchpadStore>,
    pub memory: Arc<dyn MemoryStore>,
    pub gateway: Arc<dyn LlmGateway>,
    pub broadcaster: Arc<Broadcaster>,
    pub logger: Arc<dyn ConversationLogger>,
}

/// How a scheduler run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// All remaining phases ran, or a stop was observed between turns
    Completed,
    /// The scheduler was cancelled by `stop`
    Cancelled,
    /// An error or panic escaped the phase loop
    Crashed(String),
}

/// Binary gate every suspension point waits on.
///
/// Closed while paused; `stop` and `advance_phase` force it open. Status
/// changes and the matching gate change happen under the run state lock.
struct PauseGate {
    open: watch::Sender<bool>,
}

impl PauseGate {
    fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self { open }
    }

    fn open(&self) {
        self.open.send_replace(true);
    }

    fn close(&self) {
        self.open.send_replace(false);
    }

    async fn wait_open(&self) {
        let mut rx = self.open.subscribe();
        // The sender lives as long as the gate, so this only returns once open.
        let _ = rx.wait_for(|open| *open).await;
    }
}

#[derive(Debug, Clone)]
struct RunState {
    status: SessionStatus,
    phase: PhaseName,
    turn_index: u64,
    /// Deadline of the current phase, kept across a pause
    phase_deadline: Option<DateTime<Utc>>,
}

impl RunState {
    /// The deadline is only reported while running.
    fn deadline(&self) -> Option<DateTime<Utc>> {
        self.phase_deadline
            .filter(|_| self.status == SessionStatus::Running)
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            status: self.status,
            phase: self.phase,
            turn_index: self.turn_index,
            deadline: self.deadline(),
        }
    }
}

/// State shared between the control surface and the scheduler task
struct EngineCore {
    session_id: String,
    ports: EnginePorts,
    config: EngineConfig,
    memory: ShortTermMemory,
    clock: Arc<dyn Clock>,
    state: Mutex<RunState>,
    gate: PauseGate,
    stop_requested: AtomicBool,
    advance_requested: AtomicBool,
    /// `true` whenever no scheduler is running
    finished: watch::Sender<bool>,
}

#[derive(Default)]
struct Control {
    task: Option<JoinHandle<RunOutcome>>,
    cancel: CancellationToken,
}

/// Scheduler and state machine for one session
pub struct SessionEngine {
    core: Arc<EngineCore>,
    /// Serializes start / pause / resume / stop
    control: tokio::sync::Mutex<Control>,
}

impl SessionEngine {
    pub fn new(session_id: impl Into<String>, ports: EnginePorts, config: EngineConfig) -> Self {
        Self::with_clock(session_id, ports, config, Arc::new(SystemClock))
    }

    /// Engine whose phase deadlines are read from `clock`
    pub fn with_clock(
        session_id: impl Into<String>,
        ports: EnginePorts,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let memory = ShortTermMemory::new(Arc::clone(&ports.memory), config.memory_limit);
        let (finished, _) = watch::channel(true);
        let core = EngineCore {
            session_id: session_id.into(),
            ports,
            config,
            memory,
            clock,
            state: Mutex::new(RunState {
                status: SessionStatus::Idle,
                phase: PhaseName::Discover,
                turn_index: 0,
                phase_deadline: None,
            }),
            gate: PauseGate::new(),
            stop_requested: AtomicBool::new(false),
            advance_requested: AtomicBool::new(false),
            finished,
        };
        Self {
            core: Arc::new(core),
            control: tokio::sync::Mutex::new(Control::default()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.core.session_id
    }

    /// Current in-memory status, phase, turn index and deadline
    pub fn snapshot(&self) -> StatusSnapshot {
        self.core.state().snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.core.state().status
    }

    /// Whether a scheduler task is currently running
    pub fn is_active(&self) -> bool {
        !*self.core.finished.borrow()
    }

    /// Resolves once no scheduler is running.
    pub async fn wait_finished(&self) {
        let mut rx = self.core.finished.subscribe();
        let _ = rx.wait_for(|finished| *finished).await;
    }

    /// Bind the roster and launch the scheduler.
    ///
    /// Resumes from the session's recorded phase and turn index. Fails with
    /// a configuration error when a scheduler is already active or the
    /// roster lacks a moderator or a participant.
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut control = self.control.lock().await;
        let core = &self.core;
        if self.is_active() {
            return Err(EngineError::Configuration(format!(
                "Session '{}' is already running",
                core.session_id
            )));
        }

        let session = core
            .ports
            .repository
            .get_session(&core.session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(&core.session_id))?;
        let roster = Roster::from_agents(core.ports.repository.list_agents(&core.session_id).await?)?;

        core.ports
            .repository
            .update_session(
                &core.session_id,
                SessionPatch::new()
                    .status(SessionStatus::Running)
                    .phase(session.phase)
                    .turn_index(session.turn_index)
                    .started_at(Utc::now()),
            )
            .await?;

        {
            let mut state = core.state();
            state.status = SessionStatus::Running;
            state.phase = session.phase;
            state.turn_index = session.turn_index;
            state.phase_deadline = None;
            core.stop_requested.store(false, Ordering::SeqCst);
            core.advance_requested.store(false, Ordering::SeqCst);
            core.gate.open();
        }
        core.finished.send_replace(false);
        core.emit_status();

        info!(
            session_id = %core.session_id,
            phase = %session.phase,
            turn_index = session.turn_index,
            participants = roster.participants().len(),
            "Session started"
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(core).run(session, roster, cancel.clone()));
        control.task = Some(task);
        control.cancel = cancel;
        Ok(())
    }

    /// Suspend a running session at its next suspension point. No-op unless running.
    pub async fn pause(&self) -> Result<(), EngineError> {
        let _control = self.control.lock().await;
        let core = &self.core;
        {
            let mut state = core.state();
            if state.status != SessionStatus::Running {
                return Ok(());
            }
            state.status = SessionStatus::Paused;
            core.gate.close();
        }
        info!(session_id = %core.session_id, "Session paused");

        core.ports
            .repository
            .update_session(
                &core.session_id,
                SessionPatch::new()
                    .status(SessionStatus::Paused)
                    .clear_deadline(),
            )
            .await?;
        core.emit_status();
        Ok(())
    }

    /// Continue a paused session. No-op unless paused.
    pub async fn resume(&self) -> Result<(), EngineError> {
        let _control = self.control.lock().await;
        let core = &self.core;
        let deadline = {
            let mut state = core.state();
            if state.status != SessionStatus::Paused {
                return Ok(());
            }
            state.status = SessionStatus::Running;
            core.gate.open();
            state.deadline()
        };
        info!(session_id = %core.session_id, "Session resumed");

        let mut patch = SessionPatch::new().status(SessionStatus::Running);
        if let Some(deadline) = deadline {
            patch = patch.deadline(deadline);
        }
        core.ports
            .repository
            .update_session(&core.session_id, patch)
            .await?;
        core.emit_status();
        Ok(())
    }

    /// End the session: flag the stop, unstick a paused run, mark it done
    /// and cancel the scheduler. Returns once the scheduler's cleanup ran.
    pub async fn stop(&self) -> Result<Option<RunOutcome>, EngineError> {
        let mut control = self.control.lock().await;
        let core = &self.core;
        if !self.is_active() && matches!(core.state().status, SessionStatus::Idle | SessionStatus::Done)
        {
            return Ok(None);
        }

        {
            let mut state = core.state();
            core.stop_requested.store(true, Ordering::SeqCst);
            state.status = SessionStatus::Done;
            core.gate.open();
        }
        info!(session_id = %core.session_id, "Session stop requested");

        let persisted = core
            .ports
            .repository
            .update_session(
                &core.session_id,
                SessionPatch::new()
                    .status(SessionStatus::Done)
                    .clear_deadline()
                    .ended_at(Utc::now()),
            )
            .await;
        core.emit_status();

        control.cancel.cancel();
        let outcome = match control.task.take() {
            Some(task) => match task.await {
                Ok(outcome) => Some(outcome),
                Err(join_error) => {
                    error!(session_id = %core.session_id, %join_error, "Scheduler task failed");
                    Some(RunOutcome::Crashed(join_error.to_string()))
                }
            },
            None => None,
        };
        debug!(session_id = %core.session_id, ?outcome, "Scheduler stopped");

        persisted?;
        Ok(outcome)
    }

    /// End the current phase early. The phase loop consumes the flag at its
    /// next cycle boundary; the closing summary still runs.
    pub fn advance_phase(&self) {
        info!(session_id = %self.core.session_id, "Manual phase advance requested");
        self.core.advance_requested.store(true, Ordering::SeqCst);
        self.core.gate.open();
    }
}

impl EngineCore {
    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stopped(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn emit(&self, event: SessionEvent) {
        self.ports.broadcaster.emit(&self.session_id, event);
    }

    fn emit_status(&self) {
        let snapshot = self.state().snapshot();
        self.emit(SessionEvent::SessionStatus(snapshot));
    }

    /// Scheduler task body: run the phases, then always finalize.
    async fn run(self: Arc<Self>, session: Session, roster: Roster, cancel: CancellationToken) -> RunOutcome {
        let phases = AssertUnwindSafe(self.run_phases(&session, &roster)).catch_unwind();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => RunOutcome::Cancelled,
            result = phases => match result {
                Ok(Ok(())) => RunOutcome::Completed,
                Ok(Err(error)) => RunOutcome::Crashed(error.to_string()),
                Err(panic) => RunOutcome::Crashed(panic_message(panic.as_ref())),
            },
        };

        if let RunOutcome::Crashed(details) = &outcome {
            error!(session_id = %self.session_id, %details, "Session crashed");
            self.emit(SessionEvent::session_error("engine crashed", details.clone()));
        }

        self.finalize().await;

        if outcome == RunOutcome::Cancelled {
            info!(session_id = %self.session_id, "Session runner cancelled");
        }
        outcome
    }

    /// Terminal cleanup: the session is never left persisted as running.
    async fn finalize(&self) {
        let (phase, turn_index) = {
            let mut state = self.state();
            state.status = SessionStatus::Done;
            state.phase_deadline = None;
            (state.phase, state.turn_index)
        };

        let patch = SessionPatch::new()
            .status(SessionStatus::Done)
            .phase(phase)
            .turn_index(turn_index)
            .clear_deadline()
            .ended_at(Utc::now());
        if let Err(error) = self.ports.repository.update_session(&self.session_id, patch).await {
            error!(session_id = %self.session_id, %error, "Failed to persist final session state");
        }

        self.emit_status();
        self.ports
            .logger
            .log(ConversationEvent::session_finished(&self.session_id, phase, turn_index));
        info!(session_id = %self.session_id, %phase, turn_index, "Session finished");
        self.finished.send_replace(true);
    }

    async fn run_phases(&self, session: &Session, roster: &Roster) -> Result<(), EngineError> {
        if session.strategy().is_none() {
            warn!(
                session_id = %self.session_id,
                strategy = %session.strategy,
                "Strategy unsupported, falling back to double_diamond"
            );
        }

        let phases = plan_phases(session.time_limit_sec);
        let resume_from = self.state().phase.index();

        for plan in &phases[resume_from..] {
            if self.stopped() {
                break;
            }
            self.gate.wait_open().await;
            if self.stopped() {
                break;
            }
            self.run_phase(plan, session, roster).await?;
        }
        Ok(())
    }

    async fn run_phase(
        &self,
        plan: &PhasePlan,
        session: &Session,
        roster: &Roster,
    ) -> Result<(), EngineError> {
        let deadline = self.clock.now() + phase_length(plan);
        let (previous, running) = {
            let mut state = self.state();
            let previous = state.phase;
            state.phase = plan.name;
            state.phase_deadline = Some(deadline);
            (previous, state.status == SessionStatus::Running)
        };

        let patch = SessionPatch::new().phase(plan.name);
        let patch = if running {
            patch.deadline(deadline)
        } else {
            patch.clear_deadline()
        };
        self.ports
            .repository
            .update_session(&self.session_id, patch)
            .await?;
        self.emit(SessionEvent::PhaseChanged {
            from: previous,
            to: plan.name,
            deadline,
        });
        self.emit_status();
        self.ports.logger.log(ConversationEvent::phase_started(
            &self.session_id,
            plan.name,
            plan.duration_secs,
        ));
        info!(
            session_id = %self.session_id,
            phase = %plan.name,
            duration_secs = plan.duration_secs,
            "Phase started"
        );

        let mut cycle = 0;
        while cycle < self.config.max_cycles_per_phase && !self.stopped() {
            self.gate.wait_open().await;
            if self.stopped() {
                break;
            }
            if self.advance_requested.swap(false, Ordering::SeqCst) {
                info!(session_id = %self.session_id, phase = %plan.name, "Manual advance");
                // The forced opening only serves to end the phase; a paused
                // session stays paused.
                let state = self.state();
                if state.status == SessionStatus::Paused {
                    self.gate.close();
                }
                break;
            }
            if self.clock.now() > deadline {
                info!(session_id = %self.session_id, phase = %plan.name, "Phase reached deadline");
                break;
            }

            self.take_turn(session, roster, roster.moderator(), TurnMode::Normal)
                .await?;
            for participant in roster.participants() {
                self.take_turn(session, roster, participant, TurnMode::Normal)
                    .await?;
            }
            if let Some(notetaker) = roster.notetaker()
                && self.config.notetaker_due(cycle)
            {
                self.take_turn(session, roster, notetaker, TurnMode::Notepad)
                    .await?;
            }
            cycle += 1;
        }

        if !self.stopped() {
            self.take_turn(session, roster, roster.moderator(), TurnMode::Summary)
                .await?;
        }
        Ok(())
    }

    /// One agent's generate-and-record action.
    ///
    /// Transport failures are reported and the turn is skipped; every other
    /// error propagates to the scheduler.
    async fn take_turn(
        &self,
        session: &Session,
        roster: &Roster,
        agent: &Agent,
        mode: TurnMode,
    ) -> Result<(), EngineError> {
        if self.stopped() {
            return Ok(());
        }
        self.gate.wait_open().await;
        if self.stopped() || self.state().status == SessionStatus::Paused {
            return Ok(());
        }

        let phase = self.state().phase;
        let memories = self.memory.collect(&self.session_id, roster.members()).await?;
        let notepad = self
            .ports
            .scratchpad
            .get(&self.session_id)
            .await?
            .unwrap_or_default();
        let messages = TurnPrompt::messages(&TurnContext {
            phase,
            problem_statement: &session.problem_statement,
            agent,
            mode,
            memories: &memories,
            notepad: &notepad,
        });

        // Counted before generation: a failed or interrupted turn keeps its number.
        let turn_index = {
            let mut state = self.state();
            state.turn_index += 1;
            state.turn_index
        };
        self.ports
            .repository
            .update_session(&self.session_id, SessionPatch::new().turn_index(turn_index))
            .await?;
        self.emit_status();

        let model = self.config.resolve_model(agent.model_hint.as_deref());
        let mut request = ChatRequest::new(model, messages).with_temperature(self.config.temperature);
        if let Some(endpoint) = &self.config.endpoint {
            request = request.with_endpoint(endpoint.clone());
        }
        debug!(
            session_id = %self.session_id,
            agent = %agent.name,
            turn_index,
            mode = mode.as_str(),
            model = %request.model,
            "Turn started"
        );

        let text = match self.stream_turn(agent, turn_index, request).await {
            Ok(text) => text,
            Err(error) => {
                warn!(
                    session_id = %self.session_id,
                    agent_id = %agent.id,
                    turn_index,
                    %error,
                    "Generation failed"
                );
                self.emit(SessionEvent::agent_error(
                    format!("{} generation failed", agent.name),
                    error.to_string(),
                ));
                self.ports.logger.log(ConversationEvent::turn_failed(
                    &self.session_id,
                    &agent.id,
                    turn_index,
                    &error.to_string(),
                ));
                return Ok(());
            }
        };

        let text = match text.trim() {
            "" => EMPTY_RESPONSE_PLACEHOLDER.to_string(),
            trimmed => trimmed.to_string(),
        };
        let message = self
            .ports
            .repository
            .save_message(NewMessage {
                session_id: self.session_id.clone(),
                agent_id: agent.id.clone(),
                phase,
                turn_index,
                sentiment: sentiment_score(&text),
                confidence: confidence_score(&text),
                text,
            })
            .await?;
        self.memory
            .remember(&self.session_id, agent, turn_index, &message.text)
            .await?;

        self.emit(SessionEvent::MessageCreated(MessagePayload::from(&message)));
        self.ports.logger.log(ConversationEvent::message_created(&message));
        Ok(())
    }

    /// Stream one generation, broadcasting each fragment as it arrives.
    async fn stream_turn(
        &self,
        agent: &Agent,
        turn_index: u64,
        request: ChatRequest,
    ) -> Result<String, GatewayError> {
        let mut stream = self.ports.gateway.stream_chat(request).await?;
        let mut text = String::new();
        while let Some(fragment) = stream.next_fragment(!text.is_empty()).await {
            let fragment = fragment?;
            if fragment.is_empty() {
                continue;
            }
            text.push_str(&fragment);
            self.emit(SessionEvent::TokenDelta {
                agent_id: agent.id.clone(),
                turn_index,
                text_delta: fragment,
            });
        }
        Ok(text)
    }
}

fn phase_length(plan: &PhasePlan) -> chrono::Duration {
    i64::try_from(plan.duration_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "scheduler panicked".to_string()
    }
}
