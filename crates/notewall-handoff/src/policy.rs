//! Timing policy and the readiness poll loop.

use std::time::Duration;

use notewall_core::Variant;
use notewall_store::ArtifactStore;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default scheme of the external automation host.
pub const DEFAULT_AUTOMATION_SCHEME: &str = "shortcuts";
/// Default name of the automation that applies the wallpapers.
pub const DEFAULT_AUTOMATION_NAME: &str = "Set Wallpaper";
/// Default delay after returning to the foreground before completion is assumed.
pub const DEFAULT_FOREGROUND_GRACE: Duration = Duration::from_millis(1_500);

/// Bounded polling schedule for artifact readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Total verification window.
    pub max_wait: Duration,
    /// Base delay between probes.
    pub interval: Duration,
    /// Upper bound of the random extra delay added to each probe.
    pub max_jitter: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(6),
            interval: Duration::from_millis(250),
            max_jitter: Duration::from_millis(40),
        }
    }
}

impl PollPolicy {
    /// Delay before the next probe: `interval` plus `0..=max_jitter`.
    pub fn next_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        let jitter_ms = self.max_jitter.as_millis().min(u64::MAX as u128) as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rng.random_range(0..=jitter_ms)
        };
        self.interval + Duration::from_millis(jitter)
    }
}

/// External automation addressed by the trigger URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationTarget {
    /// URI scheme of the automation host.
    pub scheme: String,
    /// Automation name, percent-encoded into the query.
    pub name: String,
}

impl Default for AutomationTarget {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_AUTOMATION_SCHEME.to_string(),
            name: DEFAULT_AUTOMATION_NAME.to_string(),
        }
    }
}

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Readiness polling schedule.
    pub poll: PollPolicy,
    /// Delay after a foreground event before completion is assumed.
    pub foreground_grace: Duration,
    /// Automation launched once artifacts are verified.
    pub automation: AutomationTarget,
    /// Fixed seed for session ids and jitter; `None` seeds from the clock.
    pub rng_seed: Option<u64>,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            foreground_grace: DEFAULT_FOREGROUND_GRACE,
            automation: AutomationTarget::default(),
            rng_seed: None,
        }
    }
}

/// Result of one verification window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollResult {
    /// Every requested variant was ready.
    Ready {
        /// Time spent polling.
        waited: Duration,
    },
    /// The window closed before every variant was ready.
    TimedOut {
        /// Time spent polling.
        waited: Duration,
    },
    /// The token fired first.
    Cancelled,
}

/// Probes `store` until every variant is ready, the window closes or `cancel`
/// fires.
///
/// Sleeps never overshoot the deadline, and one last probe runs at the
/// deadline itself.
pub async fn wait_until_ready<R: Rng>(
    store: &dyn ArtifactStore,
    variants: &[Variant],
    policy: &PollPolicy,
    rng: &mut R,
    cancel: &CancellationToken,
) -> PollResult {
    let started = Instant::now();
    let deadline = started + policy.max_wait;
    let mut probes = 0_u32;

    loop {
        if cancel.is_cancelled() {
            return PollResult::Cancelled;
        }
        probes += 1;
        let ready = variants.iter().all(|variant| store.is_ready(*variant));
        if cancel.is_cancelled() {
            return PollResult::Cancelled;
        }

        let now = Instant::now();
        let waited = now.saturating_duration_since(started);
        if ready {
            debug!(probes, waited_ms = waited.as_millis() as u64, "artifacts ready");
            return PollResult::Ready { waited };
        }
        if now >= deadline {
            debug!(probes, waited_ms = waited.as_millis() as u64, "verification window closed");
            return PollResult::TimedOut { waited };
        }

        let delay = policy.next_delay(rng).min(deadline - now);
        tokio::select! {
            _ = cancel.cancelled() => return PollResult::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
