use std::sync::Arc;

use tracing::debug;

use crate::cache::ItemCache;
use crate::client::RemoteClient;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::models::{single_item_suffix, HackerNewsItem, ItemType};

/// What the presentation layer needs from the API.
pub trait ItemService: Send + Sync {
    /// IDs of the stories in a list, in the order the API returns them.
    fn get_items(&self, ctx: &Context, item_type: ItemType) -> Result<Vec<u64>>;

    /// One item, served from the cache when possible.
    fn get_item(&self, ctx: &Context, id: u64) -> Result<HackerNewsItem>;
}

pub struct HackerNewsClient {
    client: Arc<dyn RemoteClient>,
    cache: Arc<dyn ItemCache>,
}

impl HackerNewsClient {
    pub fn new(client: Arc<dyn RemoteClient>, cache: Arc<dyn ItemCache>) -> Self {
        Self { client, cache }
    }
}

/// Suffix for a story list. The single-item endpoint is rejected here.
fn list_suffix(item_type: ItemType) -> Result<&'static str> {
    match item_type {
        ItemType::Item => Err(Error::InvalidItemType(item_type.to_string())),
        list => Ok(list.suffix()),
    }
}

impl ItemService for HackerNewsClient {
    fn get_items(&self, ctx: &Context, item_type: ItemType) -> Result<Vec<u64>> {
        let suffix = list_suffix(item_type)?;
        let body = self.client.get(ctx, suffix)?;
        let ids: Vec<u64> = serde_json::from_slice(&body)?;

        debug!(%item_type, count = ids.len(), "fetched story ids");
        Ok(ids)
    }

    fn get_item(&self, ctx: &Context, id: u64) -> Result<HackerNewsItem> {
        if let Some(item) = self.cache.get(id) {
            debug!(id, "cache hit");
            return Ok(item);
        }

        let body = self.client.get(ctx, &single_item_suffix(id))?;
        // The API answers `null` for an ID it has no item for.
        let item = match serde_json::from_slice::<Option<HackerNewsItem>>(&body)? {
            Some(item) => item,
            None => {
                debug!(id, "no such item");
                HackerNewsItem {
                    id,
                    ..Default::default()
                }
            }
        };

        self.cache.set(id, item.clone());
        Ok(item)
    }
}
