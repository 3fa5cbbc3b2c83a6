// SPDX-License-Identifier: Apache-2.0
//! Per-store subscription bus.
//!
//! The bus keeps the store's live subscriptions and fans events out to them
//! on a dedicated worker thread, so delivery never blocks the writer that
//! produced the event. Events are enqueued while the write guard is held,
//! which makes the queue order the commit order; the single worker then
//! preserves that order per subscriber.
//!
//! A subscriber is either a channel handle ([`Subscriber`]) or a callback.
//! A dropped channel receiver is the unreachability signal: the first failed
//! send removes the subscription and no further delivery is attempted.
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use arbor_model::{
    generate_id, now_ms, Event, StoreError, SubscribeOptions, SubscriptionId, Topic,
};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Callback sink invoked on the bus worker thread. Callbacks must be cheap,
/// must not panic, and must not call back into subscribe/unsubscribe (the
/// worker holds the registry lock during delivery); a slow callback delays
/// every later delivery on this store.
pub type EventCallback = Arc<dyn Fn(Event) + Send + Sync>;

enum Sink {
    Channel(Sender<Event>),
    Callback(EventCallback),
}

struct SubEntry {
    topic: Topic,
    options: SubscribeOptions,
    sink: Sink,
    created_at: i64,
}

enum BusMessage {
    Dispatch(Event),
    Shutdown,
}

/// Receiving half of a channel subscription.
pub struct Subscriber {
    id: SubscriptionId,
    rx: Receiver<Event>,
}

impl Subscriber {
    /// The subscription id, usable with `unsubscribe`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Non-blocking receive.
    pub fn try_recv(&self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Blocking receive with a deadline. `Timeout` is contractual here.
    pub fn recv_timeout(&self, timeout_ms: u64) -> Result<Event, StoreError> {
        self.rx
            .recv_timeout(Duration::from_millis(timeout_ms))
            .map_err(|err| match err {
                RecvTimeoutError::Timeout => StoreError::Timeout {
                    operation: "subscription receive",
                    waited_ms: timeout_ms,
                },
                RecvTimeoutError::Disconnected => StoreError::Timeout {
                    operation: "subscription receive (bus stopped)",
                    waited_ms: timeout_ms,
                },
            })
    }

    /// Drains everything currently queued.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }
}

/// The store's subscription registry plus its fanout worker.
pub(crate) struct SubscriptionBus {
    subs: Arc<Mutex<FxHashMap<SubscriptionId, SubEntry>>>,
    tx: Sender<BusMessage>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionBus {
    /// Starts the fanout worker for a store.
    pub(crate) fn start(store_name: &str) -> Self {
        let subs: Arc<Mutex<FxHashMap<SubscriptionId, SubEntry>>> =
            Arc::new(Mutex::new(FxHashMap::default()));
        let (tx, rx) = unbounded::<BusMessage>();
        let worker_subs = Arc::clone(&subs);
        let name = store_name.to_owned();
        let worker = thread::spawn(move || fanout_loop(&name, &rx, &worker_subs));
        Self {
            subs,
            tx,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Registers a channel subscription and returns its receiving half.
    pub(crate) fn subscribe(
        &self,
        topic: Topic,
        options: SubscribeOptions,
    ) -> (SubscriptionId, Subscriber) {
        let (event_tx, event_rx) = unbounded::<Event>();
        let id = generate_id();
        self.subs.lock().insert(
            id.clone(),
            SubEntry {
                topic,
                options,
                sink: Sink::Channel(event_tx),
                created_at: now_ms(),
            },
        );
        let subscriber = Subscriber {
            id: id.clone(),
            rx: event_rx,
        };
        (id, subscriber)
    }

    /// Registers a callback subscription.
    pub(crate) fn subscribe_with(
        &self,
        topic: Topic,
        options: SubscribeOptions,
        callback: EventCallback,
    ) -> SubscriptionId {
        let id = generate_id();
        self.subs.lock().insert(
            id.clone(),
            SubEntry {
                topic,
                options,
                sink: Sink::Callback(callback),
                created_at: now_ms(),
            },
        );
        id
    }

    /// Removes a subscription.
    pub(crate) fn unsubscribe(&self, id: &str) -> Result<(), StoreError> {
        match self.subs.lock().remove(id) {
            Some(_) => Ok(()),
            None => Err(StoreError::SubscriptionNotFound(id.to_owned())),
        }
    }

    /// Number of live subscriptions.
    pub(crate) fn len(&self) -> usize {
        self.subs.lock().len()
    }

    /// Introspection: `(id, rendered topic, created_at)` per live
    /// subscription, ordered by creation time.
    pub(crate) fn subscriptions(&self) -> Vec<(SubscriptionId, String, i64)> {
        let registry = self.subs.lock();
        let mut rows: Vec<(SubscriptionId, String, i64)> = registry
            .iter()
            .map(|(id, entry)| (id.clone(), entry.topic.render(), entry.created_at))
            .collect();
        rows.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    /// Enqueues an event for fanout. Never blocks; events enqueued while a
    /// write guard is held are delivered in commit order.
    pub(crate) fn dispatch(&self, event: Event) {
        // A send after shutdown means the store is stopping; drop the event.
        let _ = self.tx.send(BusMessage::Dispatch(event));
    }

    /// Stops the worker and drops every subscription.
    pub(crate) fn shutdown(&self) {
        let _ = self.tx.send(BusMessage::Shutdown);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
        self.subs.lock().clear();
    }
}

impl Drop for SubscriptionBus {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn fanout_loop(
    store_name: &str,
    rx: &Receiver<BusMessage>,
    subs: &Mutex<FxHashMap<SubscriptionId, SubEntry>>,
) {
    while let Ok(BusMessage::Dispatch(event)) = rx.recv() {
        let mut unreachable: Vec<SubscriptionId> = Vec::new();
        {
            let registry = subs.lock();
            for (id, entry) in registry.iter() {
                if !entry.options.allows(event.kind)
                    || !entry.topic.matches(&event)
                    || !entry.options.filter_matches(&event)
                {
                    continue;
                }
                match &entry.sink {
                    Sink::Channel(tx) => {
                        if tx.send(event.clone()).is_err() {
                            unreachable.push(id.clone());
                        }
                    }
                    Sink::Callback(callback) => callback(event.clone()),
                }
            }
        }
        if !unreachable.is_empty() {
            let mut registry = subs.lock();
            for id in unreachable {
                registry.remove(&id);
                debug!(store = store_name, subscription = %id, "dropped unreachable subscriber");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_model::{EntityKind, EventKind};

    fn node_event(id: &str) -> Event {
        Event::mutation(EventKind::Create, EntityKind::Node, id, "node", None)
    }

    #[test]
    fn events_reach_matching_channel_subscribers() {
        let bus = SubscriptionBus::start("t");
        let (_, subscriber) = bus.subscribe(
            Topic::Entity {
                kind: EntityKind::Node,
                id: "x".to_owned(),
            },
            SubscribeOptions::default(),
        );
        bus.dispatch(node_event("x"));
        bus.dispatch(node_event("y"));
        let got = subscriber.recv_timeout(1_000);
        assert!(got.is_ok_and(|e| e.entity_id.as_deref() == Some("x")));
        // The non-matching event was never queued for this subscriber.
        assert!(subscriber.try_recv().is_none());
        bus.shutdown();
    }

    #[test]
    fn dropped_receivers_are_unsubscribed_on_next_dispatch() {
        let bus = SubscriptionBus::start("t");
        let (_, subscriber) = bus.subscribe(Topic::Any, SubscribeOptions::default());
        assert_eq!(bus.len(), 1);
        drop(subscriber);
        bus.dispatch(node_event("x"));
        // Wait for the worker to notice the dead channel.
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while bus.len() != 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(bus.len(), 0);
        bus.shutdown();
    }

    #[test]
    fn callback_sinks_observe_events_in_dispatch_order() {
        let bus = SubscriptionBus::start("t");
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _id = bus.subscribe_with(
            Topic::Kind(EntityKind::Node),
            SubscribeOptions::default(),
            Arc::new(move |event: Event| {
                if let Some(id) = event.entity_id {
                    sink.lock().push(id);
                }
            }),
        );
        for id in ["a", "b", "c"] {
            bus.dispatch(node_event(id));
        }
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while seen.lock().len() < 3 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*seen.lock(), ["a", "b", "c"]);
        bus.shutdown();
    }

    #[test]
    fn unsubscribe_is_immediate_and_reports_unknown_ids() {
        let bus = SubscriptionBus::start("t");
        let (id, subscriber) = bus.subscribe(Topic::Any, SubscribeOptions::default());
        assert!(bus.unsubscribe(&id).is_ok());
        assert!(matches!(
            bus.unsubscribe(&id),
            Err(StoreError::SubscriptionNotFound(_))
        ));
        bus.dispatch(node_event("x"));
        bus.shutdown();
        assert!(subscriber.try_recv().is_none());
    }
}
