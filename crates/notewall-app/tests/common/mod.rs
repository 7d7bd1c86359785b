//! Shared fixtures for app integration tests.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notewall_app::{AppConfig, NotewallApp};
use notewall_core::{Color, Note, StyleConfig};
use notewall_handoff::{AutomationLauncher, SessionHandle, SessionState, TriggerRejection};
use url::Url;

/// Launcher double that accepts and records every URI.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<String>>,
}

impl RecordingLauncher {
    /// URIs launched so far.
    #[allow(dead_code)]
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().expect("launch lock").clone()
    }
}

impl AutomationLauncher for RecordingLauncher {
    fn launch(&self, uri: &Url) -> Result<bool, TriggerRejection> {
        self.launched
            .lock()
            .expect("launch lock")
            .push(uri.to_string());
        Ok(true)
    }
}

/// Seeded config on a small canvas rooted at `dir`.
#[allow(dead_code)]
pub fn small_config(dir: &Path) -> AppConfig {
    AppConfig {
        storage_dir: dir.to_path_buf(),
        canvas_width: 117,
        canvas_height: 253,
        min_font_size: 4,
        max_font_size: 16,
        rng_seed: Some(7),
        ..AppConfig::default()
    }
}

/// App wired to a [`RecordingLauncher`].
#[allow(dead_code)]
pub fn app_with_stub(config: AppConfig) -> (NotewallApp, Arc<RecordingLauncher>) {
    let launcher = Arc::new(RecordingLauncher::default());
    let app = NotewallApp::with_launcher(config, launcher.clone()).expect("app should build");
    (app, launcher)
}

/// Two short notes on a white background.
#[allow(dead_code)]
pub fn fixture_request() -> (Vec<Note>, StyleConfig) {
    (
        vec![
            Note::new("n1", "Water the plants"),
            Note::new("n2", "Renew passport"),
        ],
        StyleConfig::solid(Color::WHITE),
    )
}

/// Waits until the session reached `state` or moved past it.
#[allow(dead_code)]
pub async fn reach(handle: &SessionHandle, state: SessionState) {
    let mut states = handle.watch_state();
    let reached = tokio::time::timeout(
        Duration::from_secs(30),
        states.wait_for(|current| *current >= state),
    )
    .await;
    assert!(
        matches!(reached, Ok(Ok(_))),
        "session never reached {state}"
    );
}
