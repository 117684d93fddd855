//! The event channel: a multi-subscriber broadcast of state transitions.
//!
//! Subscribing returns an [`EventStream`]; dropping the stream unsubscribes.
//! Events are queued per subscriber in emission order and never replayed to
//! late subscribers.

use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
    Stream, StreamExt,
};
use omni_core::events::OmniEvent;
use parking_lot::Mutex;
use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Weak,
    },
    task::{Context, Poll},
};
use tracing::trace;

struct Subscriber {
    id: usize,
    tx: UnboundedSender<OmniEvent>,
}

/// Registry of active event subscribers
#[derive(Clone, Default)]
pub struct EventListeners {
    inner: Arc<Mutex<Vec<Subscriber>>>,
    next_id: Arc<AtomicUsize>,
}

impl EventListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its event stream
    pub fn subscribe(&self) -> EventStream {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = unbounded();
        self.inner.lock().push(Subscriber { id, tx });
        trace!(target: "pubsub", id, "added event subscriber");
        EventStream { id, rx, listeners: Arc::downgrade(&self.inner) }
    }

    /// Delivers the event to every live subscriber, pruning closed ones
    pub fn notify(&self, event: OmniEvent) {
        let mut subscribers = self.inner.lock();
        subscribers.retain(|subscriber| subscriber.tx.unbounded_send(event.clone()).is_ok());
        trace!(target: "pubsub", event = event.name(), subscribers = subscribers.len(), "notified");
    }

    /// Number of live subscribers
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// A subscription to bridge events; unsubscribes on drop
pub struct EventStream {
    id: usize,
    rx: UnboundedReceiver<OmniEvent>,
    listeners: Weak<Mutex<Vec<Subscriber>>>,
}

impl Stream for EventStream {
    type Item = OmniEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_next_unpin(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|subscriber| subscriber.id != self.id);
            trace!(target: "pubsub", id = self.id, "removed event subscriber");
        }
    }
}
