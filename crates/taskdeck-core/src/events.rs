//! Engine event bus.
//!
//! Components that react to state changes (the renderer, derived views
//! like a completion counter) subscribe here instead of being called by
//! name. Delivery is synchronous and in subscription order; callbacks
//! must not subscribe or emit re-entrantly.

use std::cell::RefCell;

/// Notifications emitted by the sync core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The authoritative collection or the active filters changed; the
    /// board should reconcile.
    CollectionChanged,
    /// A mutation's remote call succeeded; its optimistic write stands.
    MutationCommitted { seq: u64 },
    /// A mutation's remote call failed. `rolled_back` is false when a
    /// newer operation had superseded it and local state was left
    /// alone.
    MutationFailed {
        seq: u64,
        message: String,
        rolled_back: bool,
    },
}

type Subscriber = Box<dyn Fn(&EngineEvent)>;

/// Synchronous, single-threaded publish/subscribe fan-out.
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<Vec<Subscriber>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, f: impl Fn(&EngineEvent) + 'static) {
        self.subscribers.borrow_mut().push(Box::new(f));
    }

    pub fn emit(&self, event: &EngineEvent) {
        for subscriber in self.subscribers.borrow().iter() {
            subscriber(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}
