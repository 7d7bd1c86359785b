#![warn(missing_docs)]
//! # notewall-handoff
//!
//! ## Purpose
//! Carries one render request through to the external automation that applies
//! the wallpapers: compose, persist, verify, trigger, then wait for a
//! completion signal.
//!
//! ## Responsibilities
//! - Enforce the session state machine ([`SessionState`],
//!   [`HandoffStateMachine`]).
//! - Keep at most one session alive; repeat requests return the live session.
//! - Poll artifact readiness within a bounded, jittered window ([`PollPolicy`]).
//! - Build the trigger URI and hand it to an [`AutomationLauncher`].
//! - Resolve completion from `ArtifactApplied` or a foreground event followed by
//!   a grace delay.
//! - Publish every transition as a [`HandoffEvent`].
//!
//! ## Data flow
//! Caller -> [`HandoffOrchestrator::request`] -> session task:
//! `Composer` -> `ArtifactStore::save` -> [`wait_until_ready`] ->
//! [`build_trigger_uri`] -> [`AutomationLauncher::launch`] -> bus signals ->
//! [`HandoffOutcome`] on [`SessionHandle::wait`] and the bus.
//!
//! ## Ownership and lifetimes
//! The orchestrator owns its collaborators behind `Arc`s; each session task
//! owns a copy of the notes and style so callers keep theirs. Handles are cheap
//! clones that stay valid after the session ends.
//!
//! ## Concurrency
//! Every suspension point (poll sleeps, the completion wait, the grace delay)
//! selects on the session's `CancellationToken`. The session slot is one
//! `Mutex<Option<..>>`, checked and set under a single lock.
//!
//! ## Error model
//! Step failures are outcomes ([`HandoffFailure`]), never panics or retries.
//! Only starting a session can fail ([`HandoffError`]).
//!
//! ## Example
//! ```rust
//! use notewall_handoff::{HandoffStateMachine, SessionState};
//!
//! let mut machine = HandoffStateMachine::new();
//! machine.advance(SessionState::Rendering).unwrap();
//! assert!(machine.advance(SessionState::Triggering).is_err());
//! ```

mod orchestrator;
mod outcome;
mod policy;
mod session;
mod state;
mod trigger;

pub use orchestrator::{HandoffError, HandoffOrchestrator};
pub use outcome::{CompletionSource, HandoffEvent, HandoffFailure, HandoffOutcome};
pub use policy::{
    AutomationTarget, DEFAULT_AUTOMATION_NAME, DEFAULT_AUTOMATION_SCHEME,
    DEFAULT_FOREGROUND_GRACE, HandoffConfig, PollPolicy, PollResult, wait_until_ready,
};
pub use session::{SessionHandle, SessionId};
pub use state::{HandoffStateMachine, InvalidTransition, SessionState};
pub use trigger::{
    AutomationLauncher, CommandLauncher, TRIGGER_HOST, TriggerRejection, build_trigger_uri,
};
