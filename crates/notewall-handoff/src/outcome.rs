//! Terminal outcomes and the events published for each session.

use notewall_events::BusEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionId;
use crate::state::SessionState;
use crate::trigger::TriggerRejection;

/// How a completed session learned that the automation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionSource {
    /// The automation's callback published `ArtifactApplied`.
    Explicit,
    /// The host returned to the foreground and the grace delay passed quietly.
    AssumedAfterForeground,
}

/// Reason a session ended in [`SessionState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum HandoffFailure {
    /// Rendering failed.
    #[error("composition failed: {0}")]
    Compose(String),
    /// Writing an artifact failed.
    #[error("persisting artifacts failed: {0}")]
    Persist(String),
    /// Artifacts never became ready within the poll window.
    #[error("artifacts not ready after {waited_ms} ms")]
    VerificationTimeout {
        /// Time spent polling.
        waited_ms: u64,
    },
    /// The automation could not be started.
    #[error("trigger rejected: {0}")]
    TriggerRejected(TriggerRejection),
}

/// Terminal result of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandoffOutcome {
    /// Automation finished (or was assumed to).
    Completed {
        /// Signal that resolved the wait.
        source: CompletionSource,
    },
    /// A step failed; no automatic retry follows.
    Failed {
        /// What went wrong.
        failure: HandoffFailure,
    },
    /// Caller cancelled, replaced or shut the session down.
    Cancelled,
}

impl HandoffOutcome {
    /// Terminal state this outcome puts the session in.
    pub fn terminal_state(&self) -> SessionState {
        match self {
            Self::Completed { .. } => SessionState::Completed,
            Self::Failed { .. } => SessionState::Failed,
            Self::Cancelled => SessionState::Cancelled,
        }
    }

    pub(crate) fn failed(failure: HandoffFailure) -> Self {
        Self::Failed { failure }
    }

    pub(crate) fn completed(source: CompletionSource) -> Self {
        Self::Completed { source }
    }
}

/// Session progress published on the bus under topic `handoff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandoffEvent {
    /// The session entered `state`.
    StateChanged {
        /// Session that moved.
        session_id: SessionId,
        /// State entered.
        state: SessionState,
    },
    /// The session reached a terminal outcome.
    Finished {
        /// Session that ended.
        session_id: SessionId,
        /// Its outcome.
        outcome: HandoffOutcome,
    },
}

impl HandoffEvent {
    /// Session the event belongs to.
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::StateChanged { session_id, .. } | Self::Finished { session_id, .. } => session_id,
        }
    }
}

impl BusEvent for HandoffEvent {
    const TOPIC: &'static str = "handoff";
}

#[cfg(test)]
mod tests {
    //! Unit tests for the outcome wire shape.

    use super::*;

    #[test]
    fn failure_serializes_with_kind_and_detail() {
        let outcome = HandoffOutcome::failed(HandoffFailure::VerificationTimeout { waited_ms: 6_000 });
        let value = serde_json::to_value(&outcome).expect("serializable");
        assert_eq!(
            value,
            serde_json::json!({
                "status": "failed",
                "failure": { "kind": "verification_timeout", "detail": { "waited_ms": 6000 } }
            })
        );
    }

    #[test]
    fn trigger_rejection_is_distinct_from_timeout() {
        let rejected = HandoffFailure::TriggerRejected(TriggerRejection::NotInstalled);
        assert_eq!(rejected.to_string(), "trigger rejected: automation host is not installed");
        assert_ne!(rejected, HandoffFailure::VerificationTimeout { waited_ms: 0 });
    }
}
