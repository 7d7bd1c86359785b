//! Validates contract fixtures and live wire forms against frozen JSON schemas.

use jsonschema::JSONSchema;
use notewall_events::{ArtifactApplied, parse_artifact_applied};
use notewall_handoff::{
    CompletionSource, HandoffEvent, HandoffFailure, HandoffOutcome, SessionId, SessionState,
    TriggerRejection,
};
use serde_json::Value;

const SESSION: &str = "3f9a0c1d2b4e5f60718293a4b5c6d7e8";

fn contract(relative: &str) -> Value {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../contracts")
        .join(relative);
    let raw = std::fs::read(&path)
        .unwrap_or_else(|err| panic!("cannot read {}: {err}", path.display()));
    serde_json::from_slice(&raw).expect("contract file should be JSON")
}

fn compile(schema: &str) -> JSONSchema {
    JSONSchema::compile(&contract(schema)).expect("schema should compile")
}

fn session_id() -> SessionId {
    serde_json::from_value(Value::String(SESSION.to_string())).expect("valid session id")
}

#[test]
fn artifact_applied_fixture_matches_schema() {
    let validator = compile("artifact-applied.schema.json");
    let fixture = contract("fixtures/artifact-applied.valid.json");
    assert!(
        validator.is_valid(&fixture),
        "artifact-applied fixture should validate against schema"
    );

    let parsed = parse_artifact_applied(&fixture.to_string()).expect("fixture should parse");
    assert_eq!(parsed.session_id.as_deref(), Some(SESSION));

    let anonymous = serde_json::to_value(ArtifactApplied { session_id: None })
        .expect("serializable");
    assert!(validator.is_valid(&anonymous));
}

#[test]
fn handoff_event_fixture_matches_schema() {
    let validator = compile("handoff-event.schema.json");
    let fixture = contract("fixtures/handoff-event.valid.json");
    assert!(
        validator.is_valid(&fixture),
        "handoff-event fixture should validate against schema"
    );

    let event: HandoffEvent = serde_json::from_value(fixture).expect("fixture should decode");
    assert!(matches!(
        event,
        HandoffEvent::Finished {
            outcome: HandoffOutcome::Failed {
                failure: HandoffFailure::VerificationTimeout { waited_ms: 6_000 }
            },
            ..
        }
    ));
}

#[test]
fn handoff_event_wire_forms_match_schema() {
    let validator = compile("handoff-event.schema.json");
    let outcomes = [
        HandoffOutcome::Completed {
            source: CompletionSource::Explicit,
        },
        HandoffOutcome::Completed {
            source: CompletionSource::AssumedAfterForeground,
        },
        HandoffOutcome::Cancelled,
        HandoffOutcome::Failed {
            failure: HandoffFailure::Compose("no notes to render".to_string()),
        },
        HandoffOutcome::Failed {
            failure: HandoffFailure::Persist("disk full".to_string()),
        },
        HandoffOutcome::Failed {
            failure: HandoffFailure::TriggerRejected(TriggerRejection::NotInstalled),
        },
    ];

    let mut events: Vec<HandoffEvent> = SessionState::ALL
        .iter()
        .map(|state| HandoffEvent::StateChanged {
            session_id: session_id(),
            state: *state,
        })
        .collect();
    events.extend(outcomes.into_iter().map(|outcome| HandoffEvent::Finished {
        session_id: session_id(),
        outcome,
    }));

    for event in events {
        let value = serde_json::to_value(&event).expect("serializable");
        assert!(validator.is_valid(&value), "{value} should validate");
    }
}

#[test]
fn handoff_event_schema_rejects_unknown_state() {
    let validator = compile("handoff-event.schema.json");
    let value = serde_json::json!({
        "type": "state_changed",
        "session_id": SESSION,
        "state": "uploading"
    });
    assert!(!validator.is_valid(&value));
}
