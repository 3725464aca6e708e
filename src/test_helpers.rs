//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::client::RemoteClient;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::hn_client::ItemService;
use crate::models::{HackerNewsItem, ItemType};

const TICK: Duration = Duration::from_millis(2);

// Sleeps in ticks so a cancelled context ends the call early.
fn wait(ctx: &Context, delay: Duration) -> Result<()> {
    let mut waited = Duration::ZERO;
    while waited < delay {
        if let Some(err) = ctx.err() {
            return Err(err);
        }
        thread::sleep(TICK);
        waited += TICK;
    }
    match ctx.err() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Scripted [`RemoteClient`] that records every call and the peak number of calls in flight.
#[derive(Default)]
pub struct FakeRemote {
    bodies: HashMap<String, String>,
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, suffix: &str, body: &str) -> Self {
        self.bodies.insert(suffix.to_string(), body.to_string());
        self
    }

    pub fn with_failure(mut self, suffix: &str, message: &str) -> Self {
        self.failures.insert(suffix.to_string(), message.to_string());
        self
    }

    pub fn with_delay(mut self, suffix: &str, delay: Duration) -> Self {
        self.delays.insert(suffix.to_string(), delay);
        self
    }

    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Serves `{"id":N,"title":"story N"}` for every id.
    pub fn with_items(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        for id in ids {
            self = self.with_body(
                &format!("item/{}.json", id),
                &format!(r#"{{"id":{},"title":"story {}"}}"#, id, id),
            );
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl RemoteClient for FakeRemote {
    fn get(&self, ctx: &Context, suffix: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(suffix.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(suffix).copied().unwrap_or(self.default_delay);
        let result = wait(ctx, delay).and_then(|()| {
            if let Some(message) = self.failures.get(suffix) {
                return Err(Error::Remote(message.clone()));
            }
            match self.bodies.get(suffix) {
                Some(body) => Ok(body.clone().into_bytes()),
                None => Err(Error::Status(reqwest::StatusCode::NOT_FOUND)),
            }
        });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Scripted [`ItemService`] for driving the pipeline without a remote or cache.
#[derive(Default)]
pub struct FakeService {
    lists: HashMap<ItemType, Vec<u64>>,
    items: HashMap<u64, HackerNewsItem>,
    failures: HashMap<u64, String>,
    delays: HashMap<u64, Duration>,
    calls: Mutex<Vec<u64>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, item_type: ItemType, ids: Vec<u64>) -> Self {
        self.lists.insert(item_type, ids);
        self
    }

    /// Serves an item titled `story N` for every id.
    pub fn with_items(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        for id in ids {
            let item = HackerNewsItem {
                id,
                title: format!("story {}", id),
                ..Default::default()
            };
            self.items.insert(id, item);
        }
        self
    }

    pub fn with_failure(mut self, id: u64, message: &str) -> Self {
        self.failures.insert(id, message.to_string());
        self
    }

    pub fn with_delay(mut self, id: u64, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    /// IDs passed to `get_item`, in call order.
    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ItemService for FakeService {
    fn get_items(&self, ctx: &Context, item_type: ItemType) -> Result<Vec<u64>> {
        if item_type == ItemType::Item {
            return Err(Error::InvalidItemType(item_type.to_string()));
        }
        wait(ctx, Duration::ZERO)?;
        Ok(self.lists.get(&item_type).cloned().unwrap_or_default())
    }

    fn get_item(&self, ctx: &Context, id: u64) -> Result<HackerNewsItem> {
        self.calls.lock().unwrap().push(id);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(&id).copied().unwrap_or_default();
        let result = wait(ctx, delay).and_then(|()| {
            if let Some(message) = self.failures.get(&id) {
                return Err(Error::Remote(message.clone()));
            }
            self.items
                .get(&id)
                .cloned()
                .ok_or(Error::Status(reqwest::StatusCode::NOT_FOUND))
        });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
