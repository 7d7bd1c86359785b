//! Integration tests for the events a session publishes.

mod common;

use std::time::Duration;

use common::LaunchScript;
use notewall_events::ArtifactApplied;
use notewall_handoff::{CompletionSource, HandoffEvent, HandoffOutcome, SessionState};

#[tokio::test(start_paused = true)]
async fn handoff_event_tests_every_transition_is_published_in_order() {
    let harness = common::harness(Some(Duration::ZERO), LaunchScript::Accept);
    let mut events = harness
        .bus
        .subscribe::<HandoffEvent>()
        .expect("bus open");
    let (notes, style) = common::fixture_request();

    let handle = harness
        .orchestrator
        .request(&notes, &style)
        .expect("session should start");
    common::reach(&handle, SessionState::AwaitingExternalCompletion).await;
    harness
        .bus
        .publish(ArtifactApplied { session_id: None })
        .expect("bus open");
    handle.wait().await;

    let mut states = Vec::new();
    let mut finished = None;
    while let Some(event) = events.try_recv().expect("bus open") {
        assert_eq!(event.session_id(), handle.id());
        match event {
            HandoffEvent::StateChanged { state, .. } => states.push(state),
            HandoffEvent::Finished { outcome, .. } => finished = Some(outcome),
        }
    }

    assert_eq!(
        states,
        vec![
            SessionState::Rendering,
            SessionState::Persisted,
            SessionState::Verifying,
            SessionState::Triggering,
            SessionState::AwaitingExternalCompletion,
            SessionState::Completed,
        ]
    );
    assert_eq!(
        finished,
        Some(HandoffOutcome::Completed {
            source: CompletionSource::Explicit
        })
    );
}

#[tokio::test(start_paused = true)]
async fn handoff_event_tests_cancel_publishes_one_terminal_event() {
    let harness = common::harness(None, LaunchScript::Accept);
    let mut events = harness
        .bus
        .subscribe::<HandoffEvent>()
        .expect("bus open");
    let (notes, style) = common::fixture_request();

    let handle = harness
        .orchestrator
        .request(&notes, &style)
        .expect("session should start");
    common::reach(&handle, SessionState::Verifying).await;
    harness.orchestrator.cancel();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let mut finished = Vec::new();
    while let Some(event) = events.try_recv().expect("bus open") {
        if let HandoffEvent::Finished { outcome, .. } = event {
            finished.push(outcome);
        }
    }
    assert_eq!(finished, vec![HandoffOutcome::Cancelled]);
}

#[test]
fn handoff_event_tests_wire_form_is_tagged() {
    let json = serde_json::json!({
        "type": "state_changed",
        "session_id": "00ff",
        "state": "awaiting_external_completion"
    });
    let event: HandoffEvent = serde_json::from_value(json).expect("valid wire form");
    assert!(matches!(
        event,
        HandoffEvent::StateChanged {
            state: SessionState::AwaitingExternalCompletion,
            ..
        }
    ));
}
