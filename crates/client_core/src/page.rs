use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Collection, ContentId, ContentItem},
    error::StoreError,
};
use tracing::{debug, info};

use crate::{
    config::Settings,
    deletion::{DeletionFlow, DeletionOutcome, Navigator, DEFAULT_REDIRECT_DELAY},
    loader::{ContentLoader, Loaded},
    presentation::{comment_count_label, created_on},
    reactions::{ReactionStore, ToggleOutcome},
    sanitize::{render, SafeMarkup},
    session::Session,
    status::{InteractionStatus, StatusBoard},
    tags::{TagExpansion, DEFAULT_TAG_PREVIEW_LIMIT},
    ContentStore,
};

/// Collaborators and tunables shared by every page the host opens.
#[derive(Clone)]
pub struct PageContext {
    pub store: Arc<dyn ContentStore>,
    pub navigator: Arc<dyn Navigator>,
    pub redirect_delay: Duration,
    pub tag_preview_limit: usize,
}

impl PageContext {
    pub fn new(store: Arc<dyn ContentStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            tag_preview_limit: DEFAULT_TAG_PREVIEW_LIMIT,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn ContentStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            redirect_delay: settings.redirect_delay(),
            tag_preview_limit: settings.tag_preview_limit,
            ..Self::new(store, navigator)
        }
    }
}

struct ItemView {
    body: SafeMarkup,
    reactions: ReactionStore,
    deletion: DeletionFlow,
    tags: TagExpansion,
}

/// Detail view of one article or event.
///
/// Every control on the page reports through the same [`StatusBoard`]. Closing
/// or dropping the page cancels a pending redirect and clears the status.
pub struct ContentPage {
    collection: Collection,
    item_id: ContentId,
    loaded: Loaded<ContentItem>,
    status: StatusBoard,
    view: Option<ItemView>,
}

impl ContentPage {
    pub async fn open(ctx: &PageContext, collection: Collection, item_id: ContentId) -> Self {
        let status = StatusBoard::new();
        let loaded = ContentLoader::new(ctx.store.clone())
            .load_by_id(collection, &item_id)
            .await;

        if let Some(error) = &loaded.error {
            status.set(InteractionStatus::error(error.to_string()));
        }

        let view = loaded.item.as_ref().map(|item| ItemView {
            body: render(&item.body),
            reactions: ReactionStore::new(
                ctx.store.clone(),
                collection,
                item.id.clone(),
                item.likes.clone(),
                status.clone(),
            ),
            deletion: DeletionFlow::new(
                ctx.store.clone(),
                collection,
                item.id.clone(),
                status.clone(),
                ctx.navigator.clone(),
            )
            .with_redirect_delay(ctx.redirect_delay),
            tags: TagExpansion::new(item.tag_list().to_vec(), ctx.tag_preview_limit),
        });

        info!(
            %collection,
            item_id = %item_id,
            found = view.is_some(),
            "page: opened"
        );
        Self {
            collection,
            item_id,
            loaded,
            status,
            view,
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn item(&self) -> Option<&ContentItem> {
        self.loaded.item.as_ref()
    }

    pub fn load_error(&self) -> Option<&StoreError> {
        self.loaded.error.as_ref()
    }

    pub fn is_missing(&self) -> bool {
        self.loaded.is_not_found()
    }

    /// "This article doesn't exist" when the store has no such record.
    pub fn missing_message(&self) -> Option<String> {
        self.is_missing()
            .then(|| format!("This {} doesn't exist", self.collection.noun()))
    }

    pub fn body(&self) -> Option<&SafeMarkup> {
        self.view.as_ref().map(|view| &view.body)
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Edit and remove controls are offered only to the item's author.
    pub fn can_manage(&self, session: &Session) -> bool {
        self.item().is_some_and(|item| session.owns(item))
    }

    pub fn reactions(&self) -> Option<&ReactionStore> {
        self.view.as_ref().map(|view| &view.reactions)
    }

    pub fn like_label(&self) -> Option<String> {
        self.reactions().map(ReactionStore::count_label)
    }

    pub fn comment_label(&self) -> Option<String> {
        self.item().map(|item| comment_count_label(item.comments.len()))
    }

    pub fn created_on(&self) -> Option<String> {
        self.item().map(|item| created_on(&item.created_at))
    }

    pub fn tags(&self) -> Option<&TagExpansion> {
        self.view.as_ref().map(|view| &view.tags)
    }

    pub fn tags_mut(&mut self) -> Option<&mut TagExpansion> {
        self.view.as_mut().map(|view| &mut view.tags)
    }

    pub fn redirect_pending(&self) -> bool {
        self.view
            .as_ref()
            .is_some_and(|view| view.deletion.redirect_pending())
    }

    /// Likes or unlikes the item as the session's user and keeps the loaded
    /// item's like-set in step with the outcome. Signed-out users and removed
    /// items get an error status and nothing is sent.
    pub async fn toggle_like(&mut self, session: &Session) -> Option<ToggleOutcome> {
        let view = self.view.as_ref()?;
        if !view.deletion.can_remove() {
            self.status.set(InteractionStatus::error(format!(
                "This {} has been removed",
                self.collection.noun()
            )));
            return None;
        }
        let Some(user) = session.user_id() else {
            self.status.set(InteractionStatus::error(format!(
                "You must be signed in to like this {}",
                self.collection.noun()
            )));
            return None;
        };

        let outcome = view.reactions.toggle(user).await;
        if let Some(item) = self.loaded.item.as_mut() {
            item.likes = outcome.likes().clone();
        }
        Some(outcome)
    }

    /// Removes the item if the session owns it.
    pub async fn remove(&mut self, session: &Session) -> Option<DeletionOutcome> {
        let owned = self.can_manage(session);
        let view = self.view.as_mut()?;
        if !owned {
            debug!(item_id = %self.item_id, "page: remove refused for non-owner");
            self.status.set(InteractionStatus::error(format!(
                "Only the author can remove this {}",
                self.collection.noun()
            )));
            return None;
        }
        Some(view.deletion.remove().await)
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for ContentPage {
    fn drop(&mut self) {
        if let Some(view) = &mut self.view {
            view.deletion.teardown();
        }
        self.status.clear();
        debug!(collection = %self.collection, item_id = %self.item_id, "page: closed");
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
