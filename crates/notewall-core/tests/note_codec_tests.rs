//! Tests decoding of host-submitted note payloads.

use notewall_core::{NoteId, notes_from_json};

#[test]
fn note_codec_tests_accepts_optional_fields() {
    let raw = br#"[
        {"id": "a", "text": "Be still.", "reference": "Psalm 46:10"},
        {"id": "b", "text": "Call mom", "completed": true}
    ]"#;

    let notes = notes_from_json(raw).expect("payload should decode");
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].id, NoteId("a".to_string()));
    assert_eq!(notes[0].reference.as_deref(), Some("Psalm 46:10"));
    assert!(!notes[0].completed);
    assert!(notes[1].completed);
    assert_eq!(notes[1].reference, None);
}

#[test]
fn note_codec_tests_rejects_missing_text() {
    assert!(notes_from_json(br#"[{"id": "a"}]"#).is_err());
}
