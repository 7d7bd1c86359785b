//! Session states and the legal transition table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of one handoff session.
///
/// Ordering follows the happy path; the three terminal states sort last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, nothing started yet.
    Idle,
    /// Composing and saving both artifacts.
    Rendering,
    /// Both artifacts written.
    Persisted,
    /// Polling readiness of the written artifacts.
    Verifying,
    /// Launching the external automation.
    Triggering,
    /// Automation launched; waiting for a completion signal.
    AwaitingExternalCompletion,
    /// Terminal: automation applied the artifacts (or was assumed to).
    Completed,
    /// Terminal: a step failed.
    Failed,
    /// Terminal: caller cancelled.
    Cancelled,
}

impl SessionState {
    /// Every state, in declaration order.
    pub const ALL: [SessionState; 9] = [
        Self::Idle,
        Self::Rendering,
        Self::Persisted,
        Self::Verifying,
        Self::Triggering,
        Self::AwaitingExternalCompletion,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Returns `true` for `Completed`, `Failed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Happy-path successor, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Rendering),
            Self::Rendering => Some(Self::Persisted),
            Self::Persisted => Some(Self::Verifying),
            Self::Verifying => Some(Self::Triggering),
            Self::Triggering => Some(Self::AwaitingExternalCompletion),
            Self::AwaitingExternalCompletion => Some(Self::Completed),
            Self::Completed | Self::Failed | Self::Cancelled => None,
        }
    }

    /// Whether `self -> to` is a legal transition.
    ///
    /// The chain only moves forward one step; `Failed` and `Cancelled` are
    /// reachable from every non-terminal state.
    pub fn can_transition(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(to, Self::Failed | Self::Cancelled) || self.next() == Some(to)
    }

    /// Stable lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rendering => "rendering",
            Self::Persisted => "persisted",
            Self::Verifying => "verifying",
            Self::Triggering => "triggering",
            Self::AwaitingExternalCompletion => "awaiting_external_completion",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal session transition {from} -> {to}")]
pub struct InvalidTransition {
    /// State at the time of the attempt.
    pub from: SessionState,
    /// Requested state.
    pub to: SessionState,
}

/// State machine with explicit legal transitions and a visited-state history.
#[derive(Debug, Clone)]
pub struct HandoffStateMachine {
    state: SessionState,
    history: Vec<SessionState>,
}

impl HandoffStateMachine {
    /// Creates a machine in [`SessionState::Idle`].
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            history: vec![SessionState::Idle],
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    /// Moves to `to` when the transition table allows it.
    ///
    /// # Errors
    /// Returns [`InvalidTransition`] otherwise; the state is left unchanged.
    pub fn advance(&mut self, to: SessionState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition(to) {
            return Err(InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        self.history.push(to);
        Ok(())
    }
}

impl Default for HandoffStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
