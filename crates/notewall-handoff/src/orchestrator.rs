//! Single-session orchestrator: render, persist, verify, trigger, await.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use notewall_compose::Composer;
use notewall_core::{Note, StyleConfig, Variant};
use notewall_events::{ArtifactApplied, EventBus, LifecycleEvent};
use notewall_store::ArtifactStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::outcome::{CompletionSource, HandoffEvent, HandoffFailure, HandoffOutcome};
use crate::policy::{HandoffConfig, PollResult, wait_until_ready};
use crate::session::{SessionHandle, SessionId};
use crate::state::SessionState;
use crate::trigger::{AutomationLauncher, TriggerRejection, build_trigger_uri};

/// Errors raised when a session cannot be started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandoffError {
    /// `request` was called outside a tokio runtime.
    #[error("no tokio runtime available to run the session")]
    NoRuntime,
    /// The event bus was shut down.
    #[error("event bus is shut down")]
    BusClosed,
}

struct ActiveSession {
    handle: SessionHandle,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner {
    composer: Arc<dyn Composer>,
    store: Arc<dyn ArtifactStore>,
    launcher: Arc<dyn AutomationLauncher>,
    bus: EventBus,
    config: HandoffConfig,
    active: Mutex<Option<ActiveSession>>,
    /// Held by whichever session is composing and saving, until its blocking
    /// write finishes, even after that session was cancelled.
    persist: Arc<AsyncMutex<()>>,
    rng: Mutex<StdRng>,
}

/// Drives at most one handoff session at a time.
#[derive(Clone)]
pub struct HandoffOrchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for HandoffOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffOrchestrator")
            .field("config", &self.inner.config)
            .field("active", &self.active_session().map(|handle| handle.id().clone()))
            .finish()
    }
}

impl HandoffOrchestrator {
    /// Creates an orchestrator over its collaborators.
    pub fn new(
        composer: Arc<dyn Composer>,
        store: Arc<dyn ArtifactStore>,
        launcher: Arc<dyn AutomationLauncher>,
        bus: EventBus,
        config: HandoffConfig,
    ) -> Self {
        let seed = config.rng_seed.unwrap_or_else(clock_seed);
        Self {
            inner: Arc::new(Inner {
                composer,
                store,
                launcher,
                bus,
                config,
                active: Mutex::new(None),
                persist: Arc::new(AsyncMutex::new(())),
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
            }),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &HandoffConfig {
        &self.inner.config
    }

    /// Bus the orchestrator publishes on and listens to.
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Handle of the live session, if any.
    pub fn active_session(&self) -> Option<SessionHandle> {
        self.inner
            .slot()
            .as_ref()
            .filter(|session| !session.handle.state().is_terminal())
            .map(|session| session.handle.clone())
    }

    /// Starts a session, or returns the live one unchanged.
    ///
    /// Returns immediately; progress is observable through the handle and the
    /// bus.
    ///
    /// # Errors
    /// See [`HandoffError`].
    pub fn request(
        &self,
        notes: &[Note],
        style: &StyleConfig,
    ) -> Result<SessionHandle, HandoffError> {
        self.begin(notes, style, false)
    }

    /// Cancels any live session, then starts a fresh one.
    ///
    /// # Errors
    /// See [`HandoffError`].
    pub fn resubmit(
        &self,
        notes: &[Note],
        style: &StyleConfig,
    ) -> Result<SessionHandle, HandoffError> {
        self.begin(notes, style, true)
    }

    /// Moves the live session to `Cancelled` and frees the slot.
    ///
    /// Returns the cancelled session's handle.
    pub fn cancel(&self) -> Option<SessionHandle> {
        let session = self.inner.slot().take()?;
        self.inner.end(&session, HandoffOutcome::Cancelled);
        Some(session.handle)
    }

    /// Cancels the live session and waits for its task and any in-flight
    /// artifact write to unwind.
    pub async fn shutdown(&self) {
        if let Some(session) = self.inner.slot().take() {
            self.inner.end(&session, HandoffOutcome::Cancelled);
            if let Err(error) = session.task.await {
                warn!(session = %session.handle.id(), %error, "session task ended abnormally");
            }
        }
        drop(self.inner.persist.lock().await);
        info!("handoff orchestrator shut down");
    }

    fn begin(
        &self,
        notes: &[Note],
        style: &StyleConfig,
        replace: bool,
    ) -> Result<SessionHandle, HandoffError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| HandoffError::NoRuntime)?;
        if self.inner.bus.is_shut_down() {
            return Err(HandoffError::BusClosed);
        }

        let mut slot = self.inner.slot();
        if let Some(current) = slot.take() {
            if !replace && !current.handle.state().is_terminal() {
                debug!(session = %current.handle.id(), "session already active");
                let handle = current.handle.clone();
                *slot = Some(current);
                return Ok(handle);
            }
            self.inner.end(&current, HandoffOutcome::Cancelled);
        }

        let (id, seed) = {
            let mut rng = self
                .inner
                .rng
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            (SessionId::generate(&mut *rng), rng.random::<u64>())
        };
        let handle = SessionHandle::new(id);
        let cancel = CancellationToken::new();
        info!(session = %handle.id(), notes = notes.len(), "handoff session started");
        self.inner.step(&handle, SessionState::Rendering);

        let task = runtime.spawn(run_session(
            Arc::clone(&self.inner),
            handle.clone(),
            cancel.clone(),
            notes.to_vec(),
            style.clone(),
            StdRng::seed_from_u64(seed),
        ));
        *slot = Some(ActiveSession {
            handle: handle.clone(),
            cancel,
            task,
        });
        Ok(handle)
    }
}

impl Inner {
    fn slot(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, event: HandoffEvent) {
        if let Err(error) = self.bus.publish(event) {
            debug!(%error, "handoff event not published");
        }
    }

    /// Non-terminal transition; `false` once the session has already ended.
    fn step(&self, handle: &SessionHandle, to: SessionState) -> bool {
        let result = handle.transition(to, || {
            self.publish(HandoffEvent::StateChanged {
                session_id: handle.id().clone(),
                state: to,
            });
        });
        match result {
            Ok(()) => {
                info!(session = %handle.id(), state = %to, "session state changed");
                true
            }
            Err(error) => {
                debug!(session = %handle.id(), %error, "session already ended");
                false
            }
        }
    }

    /// Terminal transition; first caller wins, later calls are ignored.
    fn finish(&self, handle: &SessionHandle, outcome: HandoffOutcome) -> bool {
        let to = outcome.terminal_state();
        let applied = handle.complete(&outcome, || {
            self.publish(HandoffEvent::StateChanged {
                session_id: handle.id().clone(),
                state: to,
            });
            self.publish(HandoffEvent::Finished {
                session_id: handle.id().clone(),
                outcome: outcome.clone(),
            });
        });
        if applied {
            match &outcome {
                HandoffOutcome::Failed { failure } => {
                    warn!(session = %handle.id(), %failure, "handoff session failed");
                }
                _ => info!(session = %handle.id(), state = %to, "handoff session finished"),
            }
        }
        applied
    }

    /// Finishes a session that was already removed from the slot.
    fn end(&self, session: &ActiveSession, outcome: HandoffOutcome) {
        self.finish(&session.handle, outcome);
        session.cancel.cancel();
    }

    fn release(&self, id: &SessionId) {
        let mut slot = self.slot();
        if slot
            .as_ref()
            .is_some_and(|session| session.handle.id() == id)
        {
            *slot = None;
        }
    }
}

async fn run_session(
    inner: Arc<Inner>,
    handle: SessionHandle,
    cancel: CancellationToken,
    notes: Vec<Note>,
    style: StyleConfig,
    mut rng: StdRng,
) {
    let outcome = drive(&inner, &handle, &cancel, &notes, &style, &mut rng).await;
    inner.finish(&handle, outcome);
    inner.release(handle.id());
}

async fn drive(
    inner: &Inner,
    handle: &SessionHandle,
    cancel: &CancellationToken,
    notes: &[Note],
    style: &StyleConfig,
    rng: &mut StdRng,
) -> HandoffOutcome {
    if cancel.is_cancelled() {
        return HandoffOutcome::Cancelled;
    }

    // A superseded session may still be inside a blocking save; wait for it
    // so its files can never land on top of this session's.
    let writer = tokio::select! {
        biased;
        _ = cancel.cancelled() => return HandoffOutcome::Cancelled,
        guard = Arc::clone(&inner.persist).lock_owned() => {
            let composer = Arc::clone(&inner.composer);
            let store = Arc::clone(&inner.store);
            let token = cancel.clone();
            let (notes, style) = (notes.to_vec(), style.clone());
            tokio::task::spawn_blocking(move || {
                let _guard = guard;
                render_and_save(composer.as_ref(), store.as_ref(), &notes, &style, &token)
            })
        }
    };
    let written = tokio::select! {
        biased;
        _ = cancel.cancelled() => return HandoffOutcome::Cancelled,
        joined = writer => joined,
    };
    match written {
        Ok(Ok(())) => {}
        Ok(Err(outcome)) => return outcome,
        Err(error) => {
            return HandoffOutcome::failed(HandoffFailure::Persist(format!(
                "render task aborted: {error}"
            )));
        }
    }
    if !inner.step(handle, SessionState::Persisted) || !inner.step(handle, SessionState::Verifying)
    {
        return HandoffOutcome::Cancelled;
    }

    match wait_until_ready(
        inner.store.as_ref(),
        &Variant::ALL,
        &inner.config.poll,
        rng,
        cancel,
    )
    .await
    {
        PollResult::Ready { .. } => {}
        PollResult::TimedOut { waited } => {
            return HandoffOutcome::failed(HandoffFailure::VerificationTimeout {
                waited_ms: waited.as_millis() as u64,
            });
        }
        PollResult::Cancelled => return HandoffOutcome::Cancelled,
    }
    if !inner.step(handle, SessionState::Triggering) {
        return HandoffOutcome::Cancelled;
    }

    // Subscribe before launching so a fast callback is not missed.
    let (Ok(mut applied), Ok(mut lifecycle)) = (
        inner.bus.subscribe::<ArtifactApplied>(),
        inner.bus.subscribe::<LifecycleEvent>(),
    ) else {
        return HandoffOutcome::Cancelled;
    };

    let uri = match build_trigger_uri(&inner.config.automation) {
        Ok(uri) => uri,
        Err(rejection) => return HandoffOutcome::failed(HandoffFailure::TriggerRejected(rejection)),
    };
    match inner.launcher.launch(&uri) {
        Ok(true) => {}
        Ok(false) => {
            return HandoffOutcome::failed(HandoffFailure::TriggerRejected(
                TriggerRejection::Declined,
            ));
        }
        Err(rejection) => return HandoffOutcome::failed(HandoffFailure::TriggerRejected(rejection)),
    }
    if !inner.step(handle, SessionState::AwaitingExternalCompletion) {
        return HandoffOutcome::Cancelled;
    }

    let mut grace_deadline: Option<Instant> = None;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return HandoffOutcome::Cancelled,
            event = applied.recv() => match event {
                Ok(ArtifactApplied { session_id })
                    if session_id.as_deref().is_none_or(|id| id == handle.id().as_str()) =>
                {
                    return HandoffOutcome::completed(CompletionSource::Explicit);
                }
                Ok(_) => debug!(session = %handle.id(), "completion for another session ignored"),
                Err(_) => return HandoffOutcome::Cancelled,
            },
            event = lifecycle.recv() => match event {
                Ok(LifecycleEvent::Foreground) => {
                    if grace_deadline.is_none() {
                        debug!(session = %handle.id(), "foreground observed; grace delay armed");
                        grace_deadline = Some(Instant::now() + inner.config.foreground_grace);
                    }
                }
                Ok(LifecycleEvent::Background) => {
                    debug!(session = %handle.id(), "host moved to background");
                }
                Err(_) => return HandoffOutcome::Cancelled,
            },
            _ = tokio::time::sleep_until(grace_deadline.unwrap_or_else(Instant::now)),
                if grace_deadline.is_some() =>
            {
                return HandoffOutcome::completed(CompletionSource::AssumedAfterForeground);
            }
        }
    }
}

/// Blocking half of `Rendering`: compose, then save each variant while the
/// session is still live.
fn render_and_save(
    composer: &dyn Composer,
    store: &dyn ArtifactStore,
    notes: &[Note],
    style: &StyleConfig,
    cancel: &CancellationToken,
) -> Result<(), HandoffOutcome> {
    let composed = composer
        .compose(notes, style)
        .map_err(|error| HandoffOutcome::failed(HandoffFailure::Compose(error.to_string())))?;
    for artifact in composed.artifacts() {
        if cancel.is_cancelled() {
            return Err(HandoffOutcome::Cancelled);
        }
        store
            .save(artifact)
            .map_err(|error| HandoffOutcome::failed(HandoffFailure::Persist(error.to_string())))?;
    }
    Ok(())
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default();
    nanos ^ (u64::from(std::process::id()) << 32)
}
