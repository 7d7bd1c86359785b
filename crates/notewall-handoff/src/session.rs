//! Session identity and the caller-facing handle.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::outcome::HandoffOutcome;
use crate::state::{HandoffStateMachine, InvalidTransition, SessionState};

/// Random session identifier: 16 bytes, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Draws a fresh identifier from `rng`.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut bytes = [0_u8; 16];
        rng.fill(&mut bytes[..]);
        Self(hex::encode(bytes))
    }

    /// Hex string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

struct SessionShared {
    machine: Mutex<HandoffStateMachine>,
    state: watch::Sender<SessionState>,
    outcome: watch::Sender<Option<HandoffOutcome>>,
}

/// Cheap, cloneable view of one session.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    started_at: SystemTime,
    shared: Arc<SessionShared>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

impl SessionHandle {
    pub(crate) fn new(id: SessionId) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (outcome, _) = watch::channel(None);
        Self {
            id,
            started_at: SystemTime::now(),
            shared: Arc::new(SessionShared {
                machine: Mutex::new(HandoffStateMachine::new()),
                state,
                outcome,
            }),
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Wall-clock creation time.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Outcome, once terminal.
    pub fn outcome(&self) -> Option<HandoffOutcome> {
        self.shared.outcome.borrow().clone()
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> Vec<SessionState> {
        self.machine().history().to_vec()
    }

    /// Receiver that observes each state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Waits for the terminal outcome.
    pub async fn wait(&self) -> HandoffOutcome {
        let mut receiver = self.shared.outcome.subscribe();
        match receiver.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone().unwrap_or(HandoffOutcome::Cancelled),
            // The sender lives as long as `self`; unreachable in practice.
            Err(_) => HandoffOutcome::Cancelled,
        }
    }

    /// Applies a non-terminal transition; `on_change` runs under the session
    /// lock so observers see changes in order.
    pub(crate) fn transition(
        &self,
        to: SessionState,
        on_change: impl FnOnce(),
    ) -> Result<(), InvalidTransition> {
        let mut machine = self.machine();
        machine.advance(to)?;
        self.shared.state.send_replace(to);
        on_change();
        Ok(())
    }

    /// Moves to the outcome's terminal state. Returns `false` when the session
    /// had already ended.
    pub(crate) fn complete(&self, outcome: &HandoffOutcome, on_change: impl FnOnce()) -> bool {
        let mut machine = self.machine();
        let to = outcome.terminal_state();
        if machine.advance(to).is_err() {
            return false;
        }
        self.shared.state.send_replace(to);
        self.shared.outcome.send_replace(Some(outcome.clone()));
        on_change();
        true
    }

    fn machine(&self) -> MutexGuard<'_, HandoffStateMachine> {
        self.shared
            .machine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
