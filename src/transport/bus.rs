//! Fan-out of transport events to scoped subscribers.
//!
//! A [`Subscription`] removes itself from the bus when dropped, so any code
//! path that lets go of it (normal end, error, teardown, panic unwind) also
//! unsubscribes.

use crate::transport::events::TransportEvent;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<(u64, mpsc::UnboundedSender<TransportEvent>)>,
}

/// Event bus owned by a transport implementation.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, tx));
        log::trace!("transport subscriber {} registered", id);
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
            rx,
        }
    }

    /// Deliver an event to every live subscriber. Returns the number reached.
    pub fn publish(&self, event: TransportEvent) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
        inner.subscribers.len()
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .subscribers
            .len()
    }
}

/// Receiving end of a bus registration. Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<BusInner>>,
    rx: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Subscription {
    /// Wait for the next event. `None` once the transport is gone.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }

    /// Take an already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            let mut inner = bus.lock().unwrap_or_else(|e| e.into_inner());
            inner.subscribers.retain(|(id, _)| *id != self.id);
            log::trace!("transport subscriber {} released", self.id);
        }
    }
}
