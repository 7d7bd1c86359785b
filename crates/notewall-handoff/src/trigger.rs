//! Trigger URI construction and the launcher seam.

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::policy::AutomationTarget;

/// Fixed host segment of every trigger URI.
pub const TRIGGER_HOST: &str = "run-automation";

/// Why the automation could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerRejection {
    /// Scheme or name do not form a valid URI.
    #[error("trigger uri is malformed")]
    MalformedUri,
    /// Nothing on the host handles the scheme.
    #[error("automation host is not installed")]
    NotInstalled,
    /// The host refused the launch.
    #[error("automation launch was declined")]
    Declined,
}

/// Builds `scheme://run-automation?name=<percent-encoded name>`.
///
/// Spaces encode as `%20`, not `+`.
///
/// # Errors
/// Returns [`TriggerRejection::MalformedUri`] for an invalid scheme or a blank
/// name.
pub fn build_trigger_uri(target: &AutomationTarget) -> Result<Url, TriggerRejection> {
    if !is_valid_scheme(&target.scheme) || target.name.trim().is_empty() {
        return Err(TriggerRejection::MalformedUri);
    }

    let name: String = url::form_urlencoded::byte_serialize(target.name.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    let raw = format!("{}://{TRIGGER_HOST}?name={name}", target.scheme);
    Url::parse(&raw).map_err(|_| TriggerRejection::MalformedUri)
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Hands a trigger URI to whatever opens it on the host.
pub trait AutomationLauncher: Send + Sync {
    /// Starts the automation without waiting for it.
    ///
    /// Returns whether the launch was accepted; acceptance is not completion.
    ///
    /// # Errors
    /// Returns a [`TriggerRejection`] when the launch cannot be attempted.
    fn launch(&self, uri: &Url) -> Result<bool, TriggerRejection>;
}

/// Launcher that spawns the platform opener (`open`, `xdg-open`, `explorer`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLauncher {
    program: String,
}

impl CommandLauncher {
    /// Launcher running `program <uri>`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Opener of the current platform.
    pub fn platform_default() -> Self {
        let program = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        };
        Self::new(program)
    }

    /// Program this launcher spawns.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandLauncher {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl AutomationLauncher for CommandLauncher {
    fn launch(&self, uri: &Url) -> Result<bool, TriggerRejection> {
        // Spawned and left running; the completion signal arrives on the bus.
        match tokio::process::Command::new(&self.program)
            .arg(uri.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                info!(program = %self.program, pid = child.id(), scheme = uri.scheme(), "automation launched");
                Ok(true)
            }
            Err(error) => {
                warn!(program = %self.program, %error, "automation opener failed to spawn");
                Err(TriggerRejection::NotInstalled)
            }
        }
    }
}
