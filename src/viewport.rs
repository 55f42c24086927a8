//! Viewport change notifications
//!
//! Stands in for global `load`/`resize` listeners. Subscriptions are
//! explicit handles that can be dropped again, so repeated overlays do not
//! accumulate listeners.

/// A layout-affecting viewport signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportEvent {
    /// Initial load finished
    Load,
    /// Viewport size changed
    Resize,
}

/// Handle for one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Debug)]
struct Subscription {
    id: SubscriptionId,
    events: Vec<ViewportEvent>,
}

/// Registry of viewport subscriptions
#[derive(Debug, Default)]
pub struct ViewportBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl ViewportBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the given events
    pub fn subscribe(&mut self, events: &[ViewportEvent]) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            events: events.to_vec(),
        });
        id
    }

    /// Drop a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Subscribers interested in `event`, in subscription order
    pub fn dispatch(&self, event: ViewportEvent) -> Vec<SubscriptionId> {
        self.subscriptions
            .iter()
            .filter(|s| s.events.contains(&event))
            .map(|s| s.id)
            .collect()
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
