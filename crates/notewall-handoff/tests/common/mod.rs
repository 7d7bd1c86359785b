//! Shared fixtures for handoff integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notewall_compose::{ComposeError, ComposedWallpaper, Composer};
use notewall_core::{Color, Note, RenderedArtifact, StyleConfig, ThemeVariant, Variant};
use notewall_events::EventBus;
use notewall_handoff::{
    AutomationLauncher, HandoffConfig, HandoffOrchestrator, SessionHandle, SessionState,
    TriggerRejection,
};
use notewall_store::{ArtifactStore, SavedArtifact, StoreError};
use tokio::time::Instant;
use url::Url;

/// Composer double: tiny solid artifacts, or a scripted failure.
#[derive(Debug, Default)]
pub struct StubComposer {
    pub fail: bool,
}

impl Composer for StubComposer {
    fn compose(
        &self,
        _notes: &[Note],
        _style: &StyleConfig,
    ) -> Result<ComposedWallpaper, ComposeError> {
        if self.fail {
            return Err(ComposeError::EmptyNotes);
        }
        let artifact = |variant| {
            RenderedArtifact::new(variant, 2, 2, vec![0; 16], ThemeVariant::Dark, 20)
                .expect("fixture artifact should be valid")
        };
        Ok(ComposedWallpaper {
            home: artifact(Variant::Home),
            lock: artifact(Variant::Lock),
        })
    }
}

/// Store double whose artifacts become ready at a scripted instant.
#[derive(Debug)]
pub struct ScriptedStore {
    ready_at: Option<Instant>,
    fail_save: bool,
    saves: Mutex<Vec<Variant>>,
}

impl ScriptedStore {
    /// Ready `after` the moment of construction; `None` never becomes ready.
    pub fn ready_after(after: Option<Duration>) -> Self {
        Self {
            ready_at: after.map(|after| Instant::now() + after),
            fail_save: false,
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Store whose every save fails.
    pub fn failing() -> Self {
        Self {
            fail_save: true,
            ..Self::ready_after(None)
        }
    }

    /// Variants saved so far.
    pub fn saves(&self) -> Vec<Variant> {
        self.saves.lock().expect("saves lock").clone()
    }
}

impl ArtifactStore for ScriptedStore {
    fn save(&self, artifact: &RenderedArtifact) -> Result<SavedArtifact, StoreError> {
        if self.fail_save {
            return Err(StoreError::Encode("disk full".to_string()));
        }
        self.saves.lock().expect("saves lock").push(artifact.variant);
        Ok(SavedArtifact {
            variant: artifact.variant,
            path: self.path_for(artifact.variant),
            byte_len: artifact.rgba.len() as u64,
            sha256: String::new(),
        })
    }

    fn is_ready(&self, _variant: Variant) -> bool {
        self.ready_at.is_some_and(|at| Instant::now() >= at)
    }

    fn path_for(&self, variant: Variant) -> PathBuf {
        PathBuf::from(format!("/scripted/{variant}.png"))
    }
}

/// How the launcher double answers.
#[derive(Debug, Clone, Copy)]
pub enum LaunchScript {
    Accept,
    Decline,
    Reject(TriggerRejection),
}

/// Launcher double that records every URI it is handed.
#[derive(Debug)]
pub struct StubLauncher {
    script: LaunchScript,
    launched: Mutex<Vec<String>>,
}

impl StubLauncher {
    pub fn new(script: LaunchScript) -> Self {
        Self {
            script,
            launched: Mutex::new(Vec::new()),
        }
    }

    /// URIs launched so far.
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().expect("launch lock").clone()
    }
}

impl AutomationLauncher for StubLauncher {
    fn launch(&self, uri: &Url) -> Result<bool, TriggerRejection> {
        self.launched
            .lock()
            .expect("launch lock")
            .push(uri.to_string());
        match self.script {
            LaunchScript::Accept => Ok(true),
            LaunchScript::Decline => Ok(false),
            LaunchScript::Reject(rejection) => Err(rejection),
        }
    }
}

/// Orchestrator wired to doubles, with handles kept for assertions.
#[allow(dead_code)]
pub struct Harness {
    pub orchestrator: HandoffOrchestrator,
    pub bus: EventBus,
    pub store: Arc<ScriptedStore>,
    pub launcher: Arc<StubLauncher>,
}

/// Seeded default configuration.
#[allow(dead_code)]
pub fn test_config() -> HandoffConfig {
    HandoffConfig {
        rng_seed: Some(42),
        ..HandoffConfig::default()
    }
}

/// Harness with a working composer and the default configuration.
#[allow(dead_code)]
pub fn harness(ready_after: Option<Duration>, script: LaunchScript) -> Harness {
    harness_with(
        StubComposer::default(),
        ScriptedStore::ready_after(ready_after),
        script,
        test_config(),
    )
}

/// Fully custom harness.
#[allow(dead_code)]
pub fn harness_with(
    composer: StubComposer,
    store: ScriptedStore,
    script: LaunchScript,
    config: HandoffConfig,
) -> Harness {
    let bus = EventBus::new();
    let store = Arc::new(store);
    let launcher = Arc::new(StubLauncher::new(script));
    let orchestrator = HandoffOrchestrator::new(
        Arc::new(composer),
        store.clone(),
        launcher.clone(),
        bus.clone(),
        config,
    );
    Harness {
        orchestrator,
        bus,
        store,
        launcher,
    }
}

/// Two short notes on a black background.
#[allow(dead_code)]
pub fn fixture_request() -> (Vec<Note>, StyleConfig) {
    (
        vec![
            Note::new("n1", "Call the plumber"),
            Note::new("n2", "Be strong and courageous.").with_reference("Joshua 1:9"),
        ],
        StyleConfig::solid(Color::BLACK),
    )
}

/// Waits until the session reached `state` or moved past it.
#[allow(dead_code)]
pub async fn reach(handle: &SessionHandle, state: SessionState) {
    let mut states = handle.watch_state();
    let reached = tokio::time::timeout(
        Duration::from_secs(60),
        states.wait_for(|current| *current >= state),
    )
    .await
    .expect("session should make progress")
    .map(|current| *current)
    .expect("state channel should stay open");
    assert!(
        handle.history().contains(&state),
        "expected {state}, session is {reached} with history {:?}",
        handle.history()
    );
}
