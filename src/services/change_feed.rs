//! In-process change feed shared by every client of a local backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use crate::services::backend::Subscription;
use crate::types::bookmark::BookmarkFilter;
use crate::types::change::ChangeEvent;

struct Subscriber {
    filter: BookmarkFilter,
    sender: mpsc::UnboundedSender<ChangeEvent>,
}

/// Fans change events out to the subscriptions whose filter matches.
#[derive(Default)]
pub struct ChangeFeed {
    next_id: AtomicU64,
    subscribers: Arc<Mutex<HashMap<u64, Subscriber>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber. Closing (or dropping) the returned subscription
    /// unregisters it.
    pub fn subscribe(&self, filter: BookmarkFilter) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, receiver) = mpsc::unbounded_channel();

        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.insert(id, Subscriber { filter, sender });
        }
        debug!(subscription = id, "change subscription opened");

        let registry = Arc::clone(&self.subscribers);
        Subscription::new(id, receiver, move || {
            if let Ok(mut subscribers) = registry.lock() {
                subscribers.remove(&id);
            }
            debug!(subscription = id, "change subscription closed");
        })
    }

    /// Delivers `event` to every matching subscriber, pruning ones whose
    /// receiving end has gone away.
    pub fn publish(&self, event: &ChangeEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        subscribers.retain(|_, sub| {
            if !sub.filter.matches_owner(&event.owner) {
                return true;
            }
            sub.sender.send(event.clone()).is_ok()
        });
    }

    /// Number of currently registered subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}
