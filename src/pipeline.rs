//! Bounded concurrent fetching of a page of stories.
//!
//! A dispatcher feeds `(id, index)` requests into an unbuffered intake channel, a fixed pool of
//! workers drains it through [`ItemService::get_item`], and the caller reassembles results by
//! index so the output order always matches the ID order.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{debug, warn};

use crate::context::Context;
use crate::hn_client::ItemService;
use crate::models::HackerNewsItem;

struct WorkRequest {
    id: u64,
    index: usize,
}

struct WorkResult {
    item: HackerNewsItem,
    index: usize,
}

/// Fetches `ids[tab][start..end]` with at most `workers` concurrent lookups.
///
/// Returns exactly `end - start` items in ID order. An item that fails to load is replaced by
/// [`HackerNewsItem::placeholder`] carrying the error message; this includes failures caused by
/// `ctx` being cancelled.
///
/// Caller beware: an out-of-range `tab`, or a range that does not fit inside that tab's IDs,
/// yields an empty `Vec` rather than an error, and nothing is fetched.
pub fn fetch_stories<S>(
    ctx: &Context,
    service: &S,
    ids: &[Vec<u64>],
    workers: usize,
    tab: usize,
    start: usize,
    end: usize,
) -> Vec<HackerNewsItem>
where
    S: ItemService + ?Sized,
{
    let Some(tab_ids) = ids.get(tab) else {
        return Vec::new();
    };
    if start > end || end - start > tab_ids.len() || end > tab_ids.len() {
        return Vec::new();
    }

    let count = end - start;
    if count == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, count);
    debug!(tab, start, end, workers, "fetching stories");

    let (work_tx, work_rx) = mpsc::sync_channel::<WorkRequest>(0);
    let (result_tx, result_rx) = mpsc::sync_channel::<WorkResult>(0);
    let work_rx = Arc::new(Mutex::new(work_rx));

    thread::scope(|s| {
        for _ in 0..workers {
            let intake = Arc::clone(&work_rx);
            let results = result_tx.clone();
            s.spawn(move || worker(ctx, service, intake, results));
        }
        // Only workers hold the intake receiver and the result senders from here on. The
        // results channel closes once the last worker exits, which ends the collection loop.
        drop(work_rx);
        drop(result_tx);

        let batch = &tab_ids[start..end];
        s.spawn(move || dispatch(batch, start, work_tx));

        let mut slots: Vec<Option<HackerNewsItem>> = vec![None; count];
        for result in result_rx {
            slots[result.index - start] = Some(result.item);
        }

        // Each dispatched request yields exactly one result before the channel closes.
        let items: Vec<HackerNewsItem> = slots.into_iter().flatten().collect();
        debug_assert_eq!(items.len(), count);
        items
    })
}

fn dispatch(batch: &[u64], start: usize, intake: SyncSender<WorkRequest>) {
    for (offset, &id) in batch.iter().enumerate() {
        let request = WorkRequest {
            id,
            index: start + offset,
        };
        // Every worker is gone; nobody is left to serve the rest.
        if intake.send(request).is_err() {
            break;
        }
    }
}

fn worker<S>(
    ctx: &Context,
    service: &S,
    intake: Arc<Mutex<Receiver<WorkRequest>>>,
    results: SyncSender<WorkResult>,
) where
    S: ItemService + ?Sized,
{
    loop {
        let request = match intake.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => break,
        };
        let Ok(request) = request else {
            break;
        };

        let item = match service.get_item(ctx, request.id) {
            Ok(item) => item,
            Err(e) => {
                warn!(id = request.id, error = %e, "could not get item");
                HackerNewsItem::placeholder(e)
            }
        };

        let result = WorkResult {
            item,
            index: request.index,
        };
        if results.send(result).is_err() {
            break;
        }
    }
}

/// Owns the service and worker count used to page through a tab's IDs.
#[derive(Clone)]
pub struct FetchPipeline {
    service: Arc<dyn ItemService>,
    workers: usize,
}

impl FetchPipeline {
    pub fn new(service: Arc<dyn ItemService>, workers: usize) -> Self {
        Self { service, workers }
    }

    pub fn service(&self) -> &Arc<dyn ItemService> {
        &self.service
    }

    /// See [`fetch_stories`].
    pub fn fetch(
        &self,
        ctx: &Context,
        ids: &[Vec<u64>],
        tab: usize,
        start: usize,
        end: usize,
    ) -> Vec<HackerNewsItem> {
        fetch_stories(ctx, self.service.as_ref(), ids, self.workers, tab, start, end)
    }

    /// Page `page` (zero-based) of `per_page` stories. The last page may be short.
    pub fn fetch_page(
        &self,
        ctx: &Context,
        ids: &[Vec<u64>],
        tab: usize,
        page: usize,
        per_page: usize,
    ) -> Vec<HackerNewsItem> {
        let available = ids.get(tab).map_or(0, Vec::len);
        let start = per_page.saturating_mul(page);
        if start >= available {
            return Vec::new();
        }
        let end = start.saturating_add(per_page).min(available);
        self.fetch(ctx, ids, tab, start, end)
    }
}
