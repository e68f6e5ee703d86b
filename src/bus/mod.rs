/**
 * A minimal publish/subscribe bus for protocol events.
 *
 * Handlers are called one after another, in registration order, on the thread
 * that publishes. The handler list is snapshotted before delivery so a handler
 * may register or unregister without deadlocking.
 */
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::pubip::intake::Event;

type Handler = Arc<dyn Fn(&Event<'_>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<Vec<(HandlerId, Handler)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        id
    }

    /**
     * Remove a handler.
     *
     * @return false if the handler was not registered
     */
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub fn publish(&self, event: &Event<'_>) {
        let snapshot: Vec<Handler> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in snapshot {
            handler(event);
        }
    }

    #[cfg(test)]
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::pubip::decoder::tests::TestMessage;
    use crate::pubip::intake::EventKind;

    #[test]
    fn test_publish_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = Arc::clone(&order);
            bus.register(move |_event| order.lock().unwrap().push(n));
        }

        let msg = TestMessage::new(401);
        bus.publish(&Event {
            kind: EventKind::Response,
            message: &msg,
            account: None,
        });

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unregister() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = bus.register(move |_event| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(bus.handler_count(), 1);

        assert!(bus.unregister(id));
        assert!(!bus.unregister(id));

        let msg = TestMessage::new(401);
        bus.publish(&Event {
            kind: EventKind::RegisterFail,
            message: &msg,
            account: None,
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
