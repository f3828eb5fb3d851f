use std::sync::Arc;

use shared::{
    domain::{Collection, ContentId, ContentItem, UserId},
    error::StoreError,
};
use tracing::{info, warn};

use crate::ContentStore;

/// Result of a load. `item` and `error` both absent means the record does not exist.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub item: Option<T>,
    pub error: Option<StoreError>,
}

impl<T> Loaded<T> {
    pub fn found(item: T) -> Self {
        Self {
            item: Some(item),
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            item: None,
            error: None,
        }
    }

    pub fn failed(error: StoreError) -> Self {
        Self {
            item: None,
            error: Some(error),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.item.is_none() && self.error.is_none()
    }
}

pub struct ContentLoader {
    store: Arc<dyn ContentStore>,
}

impl ContentLoader {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn load_by_id(&self, collection: Collection, id: &ContentId) -> Loaded<ContentItem> {
        match self.store.fetch_by_id(collection, id).await {
            Ok(rows) => match rows.into_iter().next() {
                Some(item) => Loaded::found(item),
                None => {
                    info!(%collection, item_id = %id, "loader: no such item");
                    Loaded::not_found()
                }
            },
            Err(error) => {
                warn!(%collection, item_id = %id, "loader: fetch failed: {error}");
                Loaded::failed(error)
            }
        }
    }

    /// Everything `author_id` has written in `collection`; an empty list is not an error.
    pub async fn load_by_author(
        &self,
        collection: Collection,
        author_id: &UserId,
    ) -> Loaded<Vec<ContentItem>> {
        match self.store.fetch_by_author(collection, author_id).await {
            Ok(items) => Loaded::found(items),
            Err(error) => {
                warn!(%collection, author_id = %author_id, "loader: fetch by author failed: {error}");
                Loaded::failed(error)
            }
        }
    }
}
