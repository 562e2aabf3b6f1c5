//! Waiting indicator between a turn starting and its first token

use crewtalk_domain::{EventEnvelope, SessionEvent, SessionStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shows a spinner while the model has not produced anything yet
pub struct TurnSpinner {
    bar: Option<ProgressBar>,
    enabled: bool,
    last_turn: u64,
}

impl TurnSpinner {
    pub fn new(enabled: bool) -> Self {
        Self {
            bar: None,
            enabled,
            last_turn: 0,
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Update the spinner from an event. Call before printing the event.
    pub fn observe(&mut self, envelope: &EventEnvelope) {
        match &envelope.event {
            SessionEvent::SessionStatus(snapshot) => {
                if snapshot.status == SessionStatus::Running && snapshot.turn_index > self.last_turn {
                    self.last_turn = snapshot.turn_index;
                    self.start(format!(
                        "turn {} ({}) waiting for the model...",
                        snapshot.turn_index, snapshot.phase
                    ));
                } else if snapshot.status != SessionStatus::Running {
                    self.clear();
                }
            }
            SessionEvent::TokenDelta { .. }
            | SessionEvent::MessageCreated(_)
            | SessionEvent::Error { .. }
            | SessionEvent::SessionClosed {} => self.clear(),
            _ => {}
        }
    }

    /// Whether a spinner is currently drawn
    pub fn is_spinning(&self) -> bool {
        self.bar.is_some()
    }

    fn start(&mut self, message: String) {
        self.clear();
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::spinner_style());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    pub fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for TurnSpinner {
    fn drop(&mut self) {
        self.clear();
    }
}
