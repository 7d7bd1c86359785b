#![warn(missing_docs)]
//! # notewall-events
//!
//! ## Purpose
//! Process-wide typed publish/subscribe bus used by the orchestrator, its
//! caller and the completion-callback path.
//!
//! ## Responsibilities
//! - Keep a registry of typed channels keyed by [`BusEvent::TOPIC`].
//! - Offer subscribe/unsubscribe and publish with an explicit lifecycle
//!   ([`EventBus::new`] at process start, [`EventBus::shutdown`] at teardown).
//! - Define the cross-process signals: [`ArtifactApplied`] and
//!   [`LifecycleEvent`].
//!
//! ## Data flow
//! External completion callback -> [`parse_artifact_applied`] ->
//! [`EventBus::publish`] -> orchestrator [`Subscription`].
//! Host foreground/background notifications -> [`LifecycleEvent`] -> same path.
//!
//! ## Ownership and lifetimes
//! [`EventBus`] is a cheap clone over shared state; subscriptions own their
//! receiver and unsubscribe on drop.
//!
//! ## Error model
//! Publishing or subscribing after shutdown, and registering two event types
//! under one topic, fail with [`EventBusError`].
//!
//! ## Example
//! ```rust
//! use notewall_events::{EventBus, LifecycleEvent};
//!
//! let bus = EventBus::new();
//! let mut lifecycle = bus.subscribe::<LifecycleEvent>().unwrap();
//! bus.publish(LifecycleEvent::Foreground).unwrap();
//! assert_eq!(lifecycle.try_recv().unwrap(), Some(LifecycleEvent::Foreground));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Default per-topic buffer before slow subscribers start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Event type carried on its own named channel.
pub trait BusEvent: Clone + Send + Sync + 'static {
    /// Stable topic name.
    const TOPIC: &'static str;
}

/// Completion signal published by the external automation's callback path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactApplied {
    /// Session the automation was launched for, when the callback knows it.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl BusEvent for ArtifactApplied {
    const TOPIC: &'static str = "artifact-applied";
}

/// Host application lifecycle transitions; scheduling hints only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Host app returned to the foreground.
    Foreground,
    /// Host app moved to the background.
    Background,
}

impl BusEvent for LifecycleEvent {
    const TOPIC: &'static str = "lifecycle";
}

/// Decodes the JSON wire form of [`ArtifactApplied`].
///
/// # Errors
/// Returns [`EventBusError::Payload`] for malformed JSON.
pub fn parse_artifact_applied(raw: &str) -> Result<ArtifactApplied, EventBusError> {
    serde_json::from_str(raw).map_err(|error| EventBusError::Payload(error.to_string()))
}

struct BusState {
    channels: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
    shut_down: bool,
}

/// Typed publish/subscribe registry.
#[derive(Clone)]
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
    capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a bus with [`DEFAULT_CHANNEL_CAPACITY`] per topic.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus with a custom per-topic buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                channels: HashMap::new(),
                shut_down: false,
            })),
            capacity: capacity.max(1),
        }
    }

    /// Subscribes to every future event of type `E`.
    ///
    /// # Errors
    /// Returns [`EventBusError::Closed`] after shutdown and
    /// [`EventBusError::TopicTypeMismatch`] when `E::TOPIC` is already bound to
    /// another type.
    pub fn subscribe<E: BusEvent>(&self) -> Result<Subscription<E>, EventBusError> {
        let mut state = self.lock()?;
        let sender = self.sender_for::<E>(&mut state)?;
        let subscription = Subscription {
            id: SubscriptionId::next(),
            receiver: sender.subscribe(),
        };
        debug!(topic = E::TOPIC, id = subscription.id.0, "subscribed");
        Ok(subscription)
    }

    /// Drops a subscription explicitly.
    pub fn unsubscribe<E: BusEvent>(&self, subscription: Subscription<E>) {
        debug!(topic = E::TOPIC, id = subscription.id.0, "unsubscribed");
        drop(subscription);
    }

    /// Publishes `event`, returning how many subscribers received it.
    ///
    /// Publishing with no subscribers is not an error.
    ///
    /// # Errors
    /// Returns [`EventBusError::Closed`] after shutdown.
    pub fn publish<E: BusEvent>(&self, event: E) -> Result<usize, EventBusError> {
        let mut state = self.lock()?;
        let sender = self.sender_for::<E>(&mut state)?;
        let delivered = sender.send(event).unwrap_or(0);
        debug!(topic = E::TOPIC, delivered, "published");
        Ok(delivered)
    }

    /// Number of live subscriptions for `E`.
    pub fn subscriber_count<E: BusEvent>(&self) -> usize {
        self.state
            .lock()
            .ok()
            .and_then(|state| {
                state
                    .channels
                    .get(E::TOPIC)
                    .and_then(|slot| slot.downcast_ref::<broadcast::Sender<E>>())
                    .map(broadcast::Sender::receiver_count)
            })
            .unwrap_or(0)
    }

    /// Closes every channel; pending receivers observe the end of stream.
    pub fn shutdown(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.shut_down = true;
            let topics = state.channels.len();
            state.channels.clear();
            info!(topics, "event bus shut down");
        }
    }

    /// Returns `true` once [`EventBus::shutdown`] ran.
    pub fn is_shut_down(&self) -> bool {
        self.state.lock().map(|state| state.shut_down).unwrap_or(true)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BusState>, EventBusError> {
        let state = self.state.lock().map_err(|_| EventBusError::LockPoisoned)?;
        if state.shut_down {
            return Err(EventBusError::Closed);
        }
        Ok(state)
    }

    fn sender_for<E: BusEvent>(
        &self,
        state: &mut BusState,
    ) -> Result<broadcast::Sender<E>, EventBusError> {
        let slot = state
            .channels
            .entry(E::TOPIC)
            .or_insert_with(|| {
                Box::new(broadcast::channel::<E>(self.capacity).0) as Box<dyn Any + Send + Sync>
            });
        slot.downcast_ref::<broadcast::Sender<E>>()
            .cloned()
            .ok_or(EventBusError::TopicTypeMismatch(E::TOPIC))
    }
}

/// Identifier of one subscription, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Receiving end of one typed channel.
#[derive(Debug)]
pub struct Subscription<E: BusEvent> {
    id: SubscriptionId,
    receiver: broadcast::Receiver<E>,
}

impl<E: BusEvent> Subscription<E> {
    /// Subscription identifier.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event.
    ///
    /// Lagged events are skipped with a warning.
    ///
    /// # Errors
    /// Returns [`EventBusError::Closed`] once the bus shut down.
    pub async fn recv(&mut self) -> Result<E, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(topic = E::TOPIC, skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(EventBusError::Closed),
            }
        }
    }

    /// Returns the next buffered event without waiting.
    ///
    /// # Errors
    /// Returns [`EventBusError::Closed`] once the bus shut down.
    pub fn try_recv(&mut self) -> Result<Option<E>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(topic = E::TOPIC, skipped, "subscriber lagged");
                }
                Err(broadcast::error::TryRecvError::Closed) => return Err(EventBusError::Closed),
            }
        }
    }
}

/// Event bus error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventBusError {
    /// Bus was shut down.
    #[error("event bus is shut down")]
    Closed,
    /// Topic already carries a different event type.
    #[error("topic {0} is bound to a different event type")]
    TopicTypeMismatch(&'static str),
    /// Wire payload could not be decoded.
    #[error("invalid event payload: {0}")]
    Payload(String),
    /// Registry lock was poisoned by a panicking holder.
    #[error("event bus lock poisoned")]
    LockPoisoned,
}

#[cfg(test)]
mod tests {
    //! Unit tests for registry bookkeeping.

    use super::*;

    #[derive(Debug, Clone)]
    struct Impostor;

    impl BusEvent for Impostor {
        const TOPIC: &'static str = "lifecycle";
    }

    #[test]
    fn topic_cannot_change_type() {
        let bus = EventBus::new();
        let _lifecycle = bus.subscribe::<LifecycleEvent>().expect("subscribe");
        assert_eq!(
            bus.subscribe::<Impostor>().map(|_| ()),
            Err(EventBusError::TopicTypeMismatch("lifecycle"))
        );
    }

    #[test]
    fn unsubscribe_drops_receiver() {
        let bus = EventBus::new();
        let subscription = bus.subscribe::<ArtifactApplied>().expect("subscribe");
        assert_eq!(bus.subscriber_count::<ArtifactApplied>(), 1);
        bus.unsubscribe(subscription);
        assert_eq!(bus.subscriber_count::<ArtifactApplied>(), 0);
    }

    #[test]
    fn wire_payload_session_is_optional() {
        assert_eq!(
            parse_artifact_applied("{}").expect("empty object is valid"),
            ArtifactApplied { session_id: None }
        );
        assert!(parse_artifact_applied("not json").is_err());
    }
}
