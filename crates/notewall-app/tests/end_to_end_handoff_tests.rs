//! Integration tests driving a full handoff through the app facade.

mod common;

use notewall_app::AppError;
use notewall_core::Variant;
use notewall_handoff::{CompletionSource, HandoffOutcome, SessionState};
use notewall_store::{HOME_FILE_NAME, LOCK_FILE_NAME};
use notewall_ui::Remedy;

#[tokio::test]
async fn end_to_end_handoff_tests_callback_completes_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (app, launcher) = common::app_with_stub(common::small_config(dir.path()));
    let (notes, style) = common::fixture_request();

    let handle = app.submit(&notes, &style).expect("session should start");
    common::reach(&handle, SessionState::AwaitingExternalCompletion).await;

    assert!(dir.path().join(HOME_FILE_NAME).is_file());
    assert!(dir.path().join(LOCK_FILE_NAME).is_file());
    assert_eq!(
        launcher.launched(),
        vec!["shortcuts://run-automation?name=Set%20Wallpaper".to_string()]
    );
    assert!(app.status_for(&handle).busy);

    let payload = format!(r#"{{"session_id":"{}"}}"#, handle.id());
    app.notify_applied(&payload).expect("payload accepted");

    assert_eq!(
        handle.wait().await,
        HandoffOutcome::Completed {
            source: CompletionSource::Explicit
        }
    );
    let view = app.status_for(&handle);
    assert!(!view.busy);
    assert_eq!(view.remedy, None);
    app.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn end_to_end_handoff_tests_foreground_assumes_completion() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (app, _) = common::app_with_stub(common::small_config(dir.path()));
    let (notes, style) = common::fixture_request();

    let handle = app.submit(&notes, &style).expect("session should start");
    common::reach(&handle, SessionState::AwaitingExternalCompletion).await;
    app.notify_background().expect("bus open");
    app.notify_foreground().expect("bus open");

    assert_eq!(
        handle.wait().await,
        HandoffOutcome::Completed {
            source: CompletionSource::AssumedAfterForeground
        }
    );
    assert_eq!(
        app.status_for(&handle).headline,
        "Wallpapers probably updated"
    );
}

#[tokio::test]
async fn end_to_end_handoff_tests_empty_notes_point_back_to_notes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (app, launcher) = common::app_with_stub(common::small_config(dir.path()));
    let (_, style) = common::fixture_request();

    let handle = app.submit(&[], &style).expect("session should start");
    let outcome = handle.wait().await;

    assert!(matches!(outcome, HandoffOutcome::Failed { .. }));
    assert_eq!(app.status_for(&handle).remedy, Some(Remedy::ReviewNotes));
    assert!(launcher.launched().is_empty());
}

#[test]
fn end_to_end_handoff_tests_render_matches_canvas_and_skips_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (app, _) = common::app_with_stub(common::small_config(dir.path()));
    let (notes, style) = common::fixture_request();

    let composed = app.render(&notes, &style).expect("render succeeds");

    for artifact in composed.artifacts() {
        assert_eq!((artifact.width, artifact.height), (117, 253));
    }
    assert_eq!(composed.home.variant, Variant::Home);
    assert!(!dir.path().join(HOME_FILE_NAME).exists());
}

#[test]
fn end_to_end_handoff_tests_malformed_callback_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (app, _) = common::app_with_stub(common::small_config(dir.path()));

    assert!(matches!(
        app.notify_applied("{not json"),
        Err(AppError::Events(_))
    ));
}
