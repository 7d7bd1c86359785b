#![warn(missing_docs)]
//! # notewall-app
//!
//! ## Purpose
//! Wires the notewall crates into one process-level facade for the host UI.
//!
//! ## Responsibilities
//! - Load [`AppConfig`] from defaults, an optional JSON file and environment
//!   overrides.
//! - Initialize `tracing` output.
//! - Own the process event bus, artifact store, flag store and orchestrator.
//! - Gate handoff requests behind the runtime kill switch.
//!
//! ## Data flow
//! Host collaborators -> [`NotewallApp::submit`] -> orchestrator session ->
//! bus events -> [`NotewallApp::status_for`] projections. Completion callbacks
//! and lifecycle notifications enter through [`NotewallApp::notify_applied`],
//! [`NotewallApp::notify_foreground`] and [`NotewallApp::notify_background`].
//!
//! ## Ownership and lifetimes
//! [`NotewallApp`] lives for the whole process; [`NotewallApp::shutdown`] tears
//! down the live session and the bus.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`].
//!
//! ## Privacy notes
//! Logs carry counts, states and digests; note text is never logged.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notewall_compose::{
    ComposeError, ComposedWallpaper, Composer, ComposerConfig, DEFAULT_MAX_FONT_SIZE,
    DEFAULT_MIN_FONT_SIZE, WallpaperComposer,
};
use notewall_core::{
    CanvasSpec, CoreError, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, HOME_TEXT_REGION,
    LOCK_TEXT_REGION, Note, StyleConfig,
};
use notewall_events::{EventBus, EventBusError, LifecycleEvent, parse_artifact_applied};
use notewall_handoff::{
    AutomationLauncher, AutomationTarget, CommandLauncher, DEFAULT_AUTOMATION_NAME,
    DEFAULT_AUTOMATION_SCHEME, HandoffConfig, HandoffError, HandoffOrchestrator, PollPolicy,
    SessionHandle,
};
use notewall_store::{FlagStore, FsArtifactStore, StoreError};
use notewall_ui::{HandoffStatusView, OnboardingFlow, SETUP_COMPLETED_FLAG};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("NOTEWALL_VERSION");

/// Path of an optional JSON config file.
pub const CONFIG_ENV: &str = "NOTEWALL_CONFIG";
/// Overrides [`AppConfig::storage_dir`].
pub const STORAGE_DIR_ENV: &str = "NOTEWALL_STORAGE_DIR";
/// Overrides [`AppConfig::automation_scheme`].
pub const AUTOMATION_SCHEME_ENV: &str = "NOTEWALL_AUTOMATION_SCHEME";
/// Overrides [`AppConfig::automation_name`].
pub const AUTOMATION_NAME_ENV: &str = "NOTEWALL_AUTOMATION_NAME";
/// Overrides [`AppConfig::foreground_grace_ms`].
pub const FOREGROUND_GRACE_ENV: &str = "NOTEWALL_FOREGROUND_GRACE_MS";
/// Runtime kill switch for handoff requests.
pub const HANDOFF_ENABLED_ENV: &str = "NOTEWALL_HANDOFF_ENABLED";

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "notewall_app=info,notewall_compose=info,\
notewall_events=info,notewall_handoff=info,notewall_layout=info,notewall_store=info,\
notewall_theme=info";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over [`DEFAULT_LOG_FILTER`]. A second call is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Returns `false` for the kill-switch values `0`, `false` and `off`
/// (case-insensitive, surrounding whitespace ignored).
pub fn is_enabled_value(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    !matches!(normalized.as_str(), "0" | "false" | "off")
}

/// Checks the runtime kill switch.
///
/// Semantics:
/// - Unset => handoff enabled.
/// - `0`, `false`, `off` (case-insensitive) => handoff disabled.
/// - Any other value => handoff enabled.
pub fn handoff_enabled_from_env() -> bool {
    std::env::var(HANDOFF_ENABLED_ENV)
        .map(|value| is_enabled_value(&value))
        .unwrap_or(true)
}

/// Effective process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding artifacts and flags.
    pub storage_dir: PathBuf,
    /// URI scheme of the automation host.
    pub automation_scheme: String,
    /// Automation that applies the wallpapers.
    pub automation_name: String,
    /// Grace delay after a foreground event, in milliseconds.
    pub foreground_grace_ms: u64,
    /// Readiness window, in milliseconds.
    pub poll_max_wait_ms: u64,
    /// Base delay between readiness probes, in milliseconds.
    pub poll_interval_ms: u64,
    /// Upper bound of probe jitter, in milliseconds.
    pub poll_max_jitter_ms: u64,
    /// Canvas width for both variants.
    pub canvas_width: u32,
    /// Canvas height for both variants.
    pub canvas_height: u32,
    /// Font size floor.
    pub min_font_size: u32,
    /// Font size ceiling.
    pub max_font_size: u32,
    /// Whether handoff requests are accepted.
    pub handoff_enabled: bool,
    /// Fixed seed for session ids and jitter.
    pub rng_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let poll = PollPolicy::default();
        Self {
            storage_dir: std::env::temp_dir().join("notewall"),
            automation_scheme: DEFAULT_AUTOMATION_SCHEME.to_string(),
            automation_name: DEFAULT_AUTOMATION_NAME.to_string(),
            foreground_grace_ms: notewall_handoff::DEFAULT_FOREGROUND_GRACE.as_millis() as u64,
            poll_max_wait_ms: poll.max_wait.as_millis() as u64,
            poll_interval_ms: poll.interval.as_millis() as u64,
            poll_max_jitter_ms: poll.max_jitter.as_millis() as u64,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            max_font_size: DEFAULT_MAX_FONT_SIZE,
            handoff_enabled: true,
            rng_seed: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    /// See [`AppConfig::from_lookup`].
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from a key lookup.
    ///
    /// Order: defaults, then the JSON file named by [`CONFIG_ENV`], then the
    /// individual environment overrides.
    ///
    /// # Errors
    /// Returns [`AppError::ConfigIo`] / [`AppError::ConfigParse`] for an
    /// unreadable or malformed file and [`AppError::InvalidConfig`] for a bad
    /// override value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(dir) = lookup(STORAGE_DIR_ENV) {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Some(scheme) = lookup(AUTOMATION_SCHEME_ENV) {
            config.automation_scheme = scheme;
        }
        if let Some(name) = lookup(AUTOMATION_NAME_ENV) {
            config.automation_name = name;
        }
        if let Some(raw) = lookup(FOREGROUND_GRACE_ENV) {
            config.foreground_grace_ms = raw.trim().parse().map_err(|_| {
                AppError::InvalidConfig(format!("{FOREGROUND_GRACE_ENV} must be milliseconds"))
            })?;
        }
        if let Some(raw) = lookup(HANDOFF_ENABLED_ENV) {
            config.handoff_enabled = is_enabled_value(&raw);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file; missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns [`AppError::ConfigIo`] or [`AppError::ConfigParse`].
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read(path).map_err(|source| AppError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidConfig`].
    pub fn validate(&self) -> Result<(), AppError> {
        if self.min_font_size == 0 || self.min_font_size > self.max_font_size {
            return Err(AppError::InvalidConfig(format!(
                "font sizes must satisfy 0 < min ({}) <= max ({})",
                self.min_font_size, self.max_font_size
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(AppError::InvalidConfig(
                "poll interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Orchestrator tuning derived from this config.
    pub fn handoff_config(&self) -> HandoffConfig {
        HandoffConfig {
            poll: PollPolicy {
                max_wait: Duration::from_millis(self.poll_max_wait_ms),
                interval: Duration::from_millis(self.poll_interval_ms),
                max_jitter: Duration::from_millis(self.poll_max_jitter_ms),
            },
            foreground_grace: Duration::from_millis(self.foreground_grace_ms),
            automation: AutomationTarget {
                scheme: self.automation_scheme.clone(),
                name: self.automation_name.clone(),
            },
            rng_seed: self.rng_seed,
        }
    }

    /// Composer configuration derived from this config.
    ///
    /// # Errors
    /// Returns [`AppError::Core`] for a zero-sized canvas.
    pub fn composer_config(&self) -> Result<ComposerConfig, AppError> {
        Ok(ComposerConfig {
            lock: CanvasSpec::new(self.canvas_width, self.canvas_height, LOCK_TEXT_REGION)?,
            home: CanvasSpec::new(self.canvas_width, self.canvas_height, HOME_TEXT_REGION)?,
            min_font_size: self.min_font_size,
            max_font_size: self.max_font_size,
            ..ComposerConfig::default()
        })
    }
}

/// Process-level facade over the notewall crates.
pub struct NotewallApp {
    config: AppConfig,
    bus: EventBus,
    composer: Arc<dyn Composer>,
    flags: FlagStore,
    orchestrator: HandoffOrchestrator,
}

impl std::fmt::Debug for NotewallApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotewallApp")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl NotewallApp {
    /// Builds the app with the platform opener as launcher.
    ///
    /// # Errors
    /// See [`NotewallApp::with_launcher`].
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        Self::with_launcher(config, Arc::new(CommandLauncher::platform_default()))
    }

    /// Builds the app around a caller-supplied launcher.
    ///
    /// # Errors
    /// Returns [`AppError`] for invalid configuration or an unusable storage
    /// directory.
    pub fn with_launcher(
        config: AppConfig,
        launcher: Arc<dyn AutomationLauncher>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let composer: Arc<dyn Composer> =
            Arc::new(WallpaperComposer::new(config.composer_config()?));
        let store = Arc::new(FsArtifactStore::open(&config.storage_dir)?);
        let flags = FlagStore::open(&config.storage_dir)?;
        let bus = EventBus::new();
        let orchestrator = HandoffOrchestrator::new(
            Arc::clone(&composer),
            store,
            launcher,
            bus.clone(),
            config.handoff_config(),
        );
        info!(
            version = APP_VERSION,
            storage_dir = %config.storage_dir.display(),
            handoff_enabled = config.handoff_enabled,
            "notewall app initialized"
        );
        Ok(Self {
            config,
            bus,
            composer,
            flags,
            orchestrator,
        })
    }

    /// Effective configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Process event bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Underlying orchestrator.
    pub fn orchestrator(&self) -> &HandoffOrchestrator {
        &self.orchestrator
    }

    /// Returns `true` when both the config and the runtime kill switch allow
    /// handoff.
    pub fn handoff_allowed(&self) -> bool {
        self.config.handoff_enabled && handoff_enabled_from_env()
    }

    /// Renders both variants without persisting or triggering anything.
    ///
    /// # Errors
    /// Returns [`AppError::Compose`].
    pub fn render(
        &self,
        notes: &[Note],
        style: &StyleConfig,
    ) -> Result<ComposedWallpaper, AppError> {
        Ok(self.composer.compose(notes, style)?)
    }

    /// Starts a handoff, or returns the live session.
    ///
    /// # Errors
    /// Returns [`AppError::HandoffDisabled`] when the kill switch is off and
    /// [`AppError::Handoff`] when no session can be started.
    pub fn submit(&self, notes: &[Note], style: &StyleConfig) -> Result<SessionHandle, AppError> {
        self.ensure_allowed()?;
        Ok(self.orchestrator.request(notes, style)?)
    }

    /// Replaces any live session with a fresh one.
    ///
    /// # Errors
    /// See [`NotewallApp::submit`].
    pub fn resubmit(
        &self,
        notes: &[Note],
        style: &StyleConfig,
    ) -> Result<SessionHandle, AppError> {
        self.ensure_allowed()?;
        Ok(self.orchestrator.resubmit(notes, style)?)
    }

    /// Cancels the live session, if any.
    pub fn cancel(&self) -> Option<SessionHandle> {
        self.orchestrator.cancel()
    }

    /// Feeds the JSON completion payload from the automation's callback.
    ///
    /// # Errors
    /// Returns [`AppError::Events`] for a malformed payload or a closed bus.
    pub fn notify_applied(&self, raw: &str) -> Result<(), AppError> {
        let signal = parse_artifact_applied(raw)?;
        self.bus.publish(signal)?;
        Ok(())
    }

    /// Host returned to the foreground.
    ///
    /// # Errors
    /// Returns [`AppError::Events`] once the bus is shut down.
    pub fn notify_foreground(&self) -> Result<(), AppError> {
        self.bus.publish(LifecycleEvent::Foreground)?;
        Ok(())
    }

    /// Host moved to the background.
    ///
    /// # Errors
    /// Returns [`AppError::Events`] once the bus is shut down.
    pub fn notify_background(&self) -> Result<(), AppError> {
        self.bus.publish(LifecycleEvent::Background)?;
        Ok(())
    }

    /// Display projection of a session.
    pub fn status_for(&self, handle: &SessionHandle) -> HandoffStatusView {
        match handle.outcome() {
            Some(outcome) => HandoffStatusView::for_outcome(&outcome),
            None => HandoffStatusView::for_state(handle.state()),
        }
    }

    /// Onboarding flow resumed from the persisted setup flag.
    ///
    /// # Errors
    /// Returns [`AppError::Store`] when the flag file is unreadable.
    pub fn onboarding(&self) -> Result<OnboardingFlow, AppError> {
        Ok(OnboardingFlow::resume(self.flags.get(SETUP_COMPLETED_FLAG)?))
    }

    /// Persists the setup-completed flag.
    ///
    /// # Errors
    /// Returns [`AppError::Store`] on write failure.
    pub fn mark_setup_completed(&self) -> Result<(), AppError> {
        self.flags.set(SETUP_COMPLETED_FLAG, true)?;
        Ok(())
    }

    /// Cancels the live session and closes the bus.
    pub async fn shutdown(&self) {
        self.orchestrator.shutdown().await;
        self.bus.shutdown();
        info!("notewall app shut down");
    }

    fn ensure_allowed(&self) -> Result<(), AppError> {
        if self.handoff_allowed() {
            return Ok(());
        }
        warn!("handoff request refused by kill switch");
        Err(AppError::HandoffDisabled)
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Config file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`AppConfig`].
    #[error("malformed config: {0}")]
    ConfigParse(#[from] serde_json::Error),
    /// A config value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Handoff is switched off.
    #[error("handoff is disabled by {HANDOFF_ENABLED_ENV}")]
    HandoffDisabled,
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Rendering error.
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),
    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Event bus error.
    #[error("event error: {0}")]
    Events(#[from] EventBusError),
    /// Session could not be started.
    #[error("handoff error: {0}")]
    Handoff(#[from] HandoffError),
}
