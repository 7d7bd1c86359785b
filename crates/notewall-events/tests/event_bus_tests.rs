//! Integration tests for the typed event bus lifecycle.

use notewall_events::{ArtifactApplied, EventBus, EventBusError, LifecycleEvent};

#[tokio::test]
async fn event_bus_tests_delivers_to_every_subscriber_of_a_topic() {
    let bus = EventBus::new();
    let mut first = bus.subscribe::<ArtifactApplied>().expect("subscribe");
    let mut second = bus.subscribe::<ArtifactApplied>().expect("subscribe");
    let mut lifecycle = bus.subscribe::<LifecycleEvent>().expect("subscribe");

    let event = ArtifactApplied {
        session_id: Some("abc".to_string()),
    };
    assert_eq!(bus.publish(event.clone()).expect("publish"), 2);

    assert_eq!(first.recv().await.expect("recv"), event);
    assert_eq!(second.recv().await.expect("recv"), event);
    assert_eq!(lifecycle.try_recv().expect("open"), None);
}

#[tokio::test]
async fn event_bus_tests_shutdown_closes_channels() {
    let bus = EventBus::new();
    let mut subscription = bus.subscribe::<LifecycleEvent>().expect("subscribe");

    bus.shutdown();

    assert!(bus.is_shut_down());
    assert_eq!(subscription.recv().await, Err(EventBusError::Closed));
    assert_eq!(
        bus.publish(LifecycleEvent::Foreground),
        Err(EventBusError::Closed)
    );
    assert!(bus.subscribe::<LifecycleEvent>().is_err());
}

#[test]
fn event_bus_tests_publish_without_subscribers_is_not_an_error() {
    let bus = EventBus::new();
    assert_eq!(bus.publish(LifecycleEvent::Background), Ok(0));
}
