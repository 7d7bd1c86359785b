//! Integration tests for the bounded readiness window.

mod common;

use std::time::Duration;

use common::LaunchScript;
use notewall_handoff::{HandoffFailure, HandoffOutcome, SessionState};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn verification_window_tests_late_but_in_window_reaches_triggering() {
    let started = Instant::now();
    let harness = common::harness(Some(Duration::from_millis(5_900)), LaunchScript::Accept);
    let (notes, style) = common::fixture_request();

    let handle = harness
        .orchestrator
        .request(&notes, &style)
        .expect("session should start");
    common::reach(&handle, SessionState::AwaitingExternalCompletion).await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(5_900), "{elapsed:?}");
    assert!(elapsed <= Duration::from_millis(6_001), "{elapsed:?}");
    assert!(handle.history().contains(&SessionState::Triggering));
    assert_eq!(
        harness.launcher.launched(),
        vec!["shortcuts://run-automation?name=Set%20Wallpaper".to_string()]
    );
    harness.orchestrator.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn verification_window_tests_never_ready_times_out() {
    let harness = common::harness(None, LaunchScript::Accept);
    let (notes, style) = common::fixture_request();

    let handle = harness
        .orchestrator
        .request(&notes, &style)
        .expect("session should start");
    let outcome = handle.wait().await;

    let HandoffOutcome::Failed {
        failure: HandoffFailure::VerificationTimeout { waited_ms },
    } = outcome
    else {
        panic!("expected verification timeout, got {outcome:?}");
    };
    assert!((6_000..6_100).contains(&waited_ms), "{waited_ms}");
    assert!(harness.launcher.launched().is_empty());
    assert_eq!(handle.state(), SessionState::Failed);
}

#[tokio::test(start_paused = true)]
async fn verification_window_tests_ready_after_deadline_still_times_out() {
    let harness = common::harness(Some(Duration::from_millis(6_500)), LaunchScript::Accept);
    let (notes, style) = common::fixture_request();

    let handle = harness
        .orchestrator
        .request(&notes, &style)
        .expect("session should start");

    assert!(matches!(
        handle.wait().await,
        HandoffOutcome::Failed {
            failure: HandoffFailure::VerificationTimeout { .. }
        }
    ));
    assert!(!handle.history().contains(&SessionState::Triggering));
}

#[tokio::test(start_paused = true)]
async fn verification_window_tests_immediately_ready_skips_waiting() {
    let started = Instant::now();
    let harness = common::harness(Some(Duration::ZERO), LaunchScript::Accept);
    let (notes, style) = common::fixture_request();

    let handle = harness
        .orchestrator
        .request(&notes, &style)
        .expect("session should start");
    common::reach(&handle, SessionState::AwaitingExternalCompletion).await;

    assert!(started.elapsed() < Duration::from_millis(250));
    assert_eq!(
        harness.store.saves(),
        vec![notewall_core::Variant::Home, notewall_core::Variant::Lock]
    );
    harness.orchestrator.shutdown().await;
}
