#![warn(missing_docs)]
//! # notewall-app binary
//!
//! Diagnostics entry point: prints the version, kill-switch state and the
//! effective configuration.

use std::process::ExitCode;

use notewall_app::{AppConfig, HANDOFF_ENABLED_ENV, app_version, handoff_enabled_from_env};
use tracing::error;

/// CLI entry point.
fn main() -> ExitCode {
    notewall_app::init_tracing();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            eprintln!("notewall: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("notewall {}", app_version());
    println!(
        "handoff_enabled={} ({HANDOFF_ENABLED_ENV})",
        config.handoff_enabled && handoff_enabled_from_env()
    );
    match serde_json::to_string_pretty(&config) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => {
            eprintln!("notewall: cannot render configuration: {err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
