use std::sync::Arc;

use shared::{
    domain::{Collection, ContentId, LikeSet, UserId},
    error::StoreError,
    protocol::ContentFields,
};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::{
    presentation::like_count_label,
    status::{InteractionStatus, StatusBoard},
    ContentStore,
};

/// A toggle whose optimistic value is already visible but not yet confirmed remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an optimistic toggle must be confirmed"]
pub struct PendingToggle {
    pub user: UserId,
    pub previous: LikeSet,
    pub next: LikeSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Confirmed { likes: LikeSet },
    /// The remote write failed and the pre-toggle set was restored.
    RolledBack { likes: LikeSet, error: StoreError },
}

impl ToggleOutcome {
    pub fn likes(&self) -> &LikeSet {
        match self {
            Self::Confirmed { likes } | Self::RolledBack { likes, .. } => likes,
        }
    }
}

/// Like-set of one content item with optimistic updates and rollback on failure.
pub struct ReactionStore {
    store: Arc<dyn ContentStore>,
    collection: Collection,
    item_id: ContentId,
    likes: watch::Sender<LikeSet>,
    status: StatusBoard,
    in_flight: Mutex<()>,
}

impl ReactionStore {
    pub fn new(
        store: Arc<dyn ContentStore>,
        collection: Collection,
        item_id: ContentId,
        initial: LikeSet,
        status: StatusBoard,
    ) -> Self {
        let (likes, _) = watch::channel(initial);
        Self {
            store,
            collection,
            item_id,
            likes,
            status,
            in_flight: Mutex::new(()),
        }
    }

    pub fn likes(&self) -> LikeSet {
        self.likes.borrow().clone()
    }

    pub fn has_liked(&self, user: &UserId) -> bool {
        self.likes.borrow().contains(user)
    }

    pub fn count_label(&self) -> String {
        like_count_label(self.likes.borrow().len())
    }

    /// Every local change to the like-set, optimistic values and rollbacks included.
    pub fn subscribe(&self) -> watch::Receiver<LikeSet> {
        self.likes.subscribe()
    }

    /// First phase: publish the toggled set locally before anything goes over the wire.
    pub fn apply_optimistic(&self, user: &UserId) -> PendingToggle {
        let previous = self.likes();
        let next = previous.toggled(user);
        self.likes.send_replace(next.clone());
        debug!(
            collection = %self.collection,
            item_id = %self.item_id,
            user_id = %user,
            likes = next.len(),
            "reactions: optimistic toggle applied"
        );
        PendingToggle {
            user: user.clone(),
            previous,
            next,
        }
    }

    /// Second phase: write the whole like-set remotely, rolling back if the store refuses it.
    pub async fn confirm(&self, pending: PendingToggle) -> ToggleOutcome {
        let fields = ContentFields::likes(pending.next.clone());
        match self
            .store
            .update(self.collection, &self.item_id, &fields)
            .await
        {
            Ok(()) => {
                self.status.clear();
                info!(
                    collection = %self.collection,
                    item_id = %self.item_id,
                    likes = pending.next.len(),
                    "reactions: like-set saved"
                );
                ToggleOutcome::Confirmed {
                    likes: pending.next,
                }
            }
            Err(error) => {
                warn!(
                    collection = %self.collection,
                    item_id = %self.item_id,
                    user_id = %pending.user,
                    "reactions: like-set update failed, rolling back: {error}"
                );
                self.likes.send_replace(pending.previous.clone());
                self.status.set(InteractionStatus::error(error.to_string()));
                ToggleOutcome::RolledBack {
                    likes: pending.previous,
                    error,
                }
            }
        }
    }

    /// Toggles `user` in the like-set. Concurrent calls run one after another.
    pub async fn toggle(&self, user: &UserId) -> ToggleOutcome {
        let _in_flight = self.in_flight.lock().await;
        let pending = self.apply_optimistic(user);
        self.confirm(pending).await
    }
}

#[cfg(test)]
#[path = "tests/reactions_tests.rs"]
mod tests;
