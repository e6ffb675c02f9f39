use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::websockets::DrawEvent;

/// Number of events kept for late joiners unless configured otherwise
pub const DEFAULT_MAX_HISTORY: usize = 1000;

/// Bounded, ordered log of draw events with oldest-first eviction.
///
/// Cloning is cheap and every clone shares the same buffer.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Arc<RwLock<VecDeque<DrawEvent>>>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }

    /// Appends to the tail, evicting from the head while over capacity.
    /// Returns how many events were evicted.
    pub async fn append(&self, event: DrawEvent) -> usize {
        let mut events = self.events.write().await;
        events.push_back(event);

        let mut evicted = 0;
        while events.len() > self.capacity {
            events.pop_front();
            evicted += 1;
        }

        if evicted > 0 {
            debug!(evicted = evicted, len = events.len(), "Evicted oldest history entries");
        }
        evicted
    }

    /// Empties the log
    pub async fn reset(&self) {
        let mut events = self.events.write().await;
        let dropped = events.len();
        events.clear();
        debug!(dropped = dropped, "History reset");
    }

    /// Copy of the whole log in insertion order
    pub async fn snapshot(&self) -> Vec<DrawEvent> {
        self.events.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}
