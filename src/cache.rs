use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::HackerNewsItem;

/// Process-lifetime item store, safe to share between fetch workers.
pub trait ItemCache: Send + Sync {
    fn get(&self, id: u64) -> Option<HackerNewsItem>;
    fn set(&self, id: u64, item: HackerNewsItem);
}

/// In-memory cache. Entries are overwritten but never evicted.
#[derive(Debug, Default)]
pub struct MemCache {
    items: Mutex<HashMap<u64, HackerNewsItem>>,
}

impl MemCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemCache for MemCache {
    fn get(&self, id: u64) -> Option<HackerNewsItem> {
        // A poisoned lock reads as a miss; the caller falls back to the network.
        if let Ok(items) = self.items.lock() {
            items.get(&id).cloned()
        } else {
            None
        }
    }

    fn set(&self, id: u64, item: HackerNewsItem) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(id, item);
        }
    }
}
