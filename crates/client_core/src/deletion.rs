use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Collection, ContentId},
    error::StoreError,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    status::{InteractionStatus, StatusBoard},
    ContentStore,
};

pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(5000);

/// Where the view goes once a removed item's page is no longer meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Full-page replace to the home route.
    Home,
    /// One step back in history.
    Back,
}

impl RedirectTarget {
    pub fn for_collection(collection: Collection) -> Self {
        match collection {
            Collection::Articles => Self::Home,
            Collection::Events => Self::Back,
        }
    }

    pub fn route(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Back => "..",
        }
    }
}

/// Navigation collaborator supplied by the hosting view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: RedirectTarget);
}

/// A pending navigation. Dropping it cancels the navigation if it has not fired yet.
#[derive(Debug)]
pub struct ScheduledRedirect {
    target: RedirectTarget,
    task: JoinHandle<()>,
}

impl ScheduledRedirect {
    fn spawn(navigator: Arc<dyn Navigator>, target: RedirectTarget, delay: Duration) -> Self {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(route = target.route(), "deletion: redirecting");
            navigator.navigate(target);
        });
        Self { target, task }
    }

    pub fn target(&self) -> RedirectTarget {
        self.target
    }

    pub fn has_fired(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for ScheduledRedirect {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            debug!(route = self.target.route(), "deletion: pending redirect cancelled");
        }
        self.task.abort();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Removed {
        redirect: RedirectTarget,
        delay: Duration,
    },
    Failed(StoreError),
    /// The item was already removed through this flow; nothing was sent.
    AlreadyRemoved,
}

/// Deletes one item and owns the redirect that follows a successful delete.
pub struct DeletionFlow {
    store: Arc<dyn ContentStore>,
    collection: Collection,
    item_id: ContentId,
    status: StatusBoard,
    navigator: Arc<dyn Navigator>,
    redirect_delay: Duration,
    redirect: Option<ScheduledRedirect>,
    removed: bool,
}

impl DeletionFlow {
    pub fn new(
        store: Arc<dyn ContentStore>,
        collection: Collection,
        item_id: ContentId,
        status: StatusBoard,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            collection,
            item_id,
            status,
            navigator,
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            redirect: None,
            removed: false,
        }
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// False once the item has been removed; the remove control should be disabled then.
    pub fn can_remove(&self) -> bool {
        !self.removed
    }

    pub fn redirect_pending(&self) -> bool {
        self.redirect
            .as_ref()
            .is_some_and(|redirect| !redirect.has_fired())
    }

    pub fn success_message(&self) -> String {
        format!("The {} was successfully removed", self.collection.noun())
    }

    pub async fn remove(&mut self) -> DeletionOutcome {
        if self.removed {
            debug!(item_id = %self.item_id, "deletion: ignoring repeated remove");
            return DeletionOutcome::AlreadyRemoved;
        }

        if let Err(error) = self.store.delete(self.collection, &self.item_id).await {
            warn!(
                collection = %self.collection,
                item_id = %self.item_id,
                "deletion: remove failed: {error}"
            );
            self.status.set(InteractionStatus::error(error.to_string()));
            return DeletionOutcome::Failed(error);
        }

        self.removed = true;
        self.status.set(InteractionStatus::success(self.success_message()));

        let target = RedirectTarget::for_collection(self.collection);
        self.redirect = Some(ScheduledRedirect::spawn(
            self.navigator.clone(),
            target,
            self.redirect_delay,
        ));
        info!(
            collection = %self.collection,
            item_id = %self.item_id,
            delay_ms = self.redirect_delay.as_millis() as u64,
            "deletion: item removed, redirect scheduled"
        );

        DeletionOutcome::Removed {
            redirect: target,
            delay: self.redirect_delay,
        }
    }

    /// Releases the pending redirect; called when the hosting view goes away.
    pub fn teardown(&mut self) {
        if let Some(redirect) = self.redirect.take() {
            redirect.cancel();
        }
    }
}

impl Drop for DeletionFlow {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "tests/deletion_tests.rs"]
mod tests;
