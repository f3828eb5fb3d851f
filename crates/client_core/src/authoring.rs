use std::sync::Arc;

use chrono::NaiveDate;
use shared::{
    domain::{normalize_tags, Collection, ContentId, ContentItem},
    error::{StoreError, ValidationError},
    protocol::ContentFields,
};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
    loader::Loaded,
    session::{AuthUser, Session},
    status::{InteractionStatus, StatusBoard},
    ContentStore,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("you must be signed in to do that")]
    SignedOut,
    #[error(transparent)]
    Remote(#[from] StoreError),
}

/// Article form contents. `tags` is the raw comma-separated input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub tags: String,
    pub image: Option<String>,
}

impl ArticleDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("content", &self.content)?;
        Ok(())
    }

    /// Lowercased, trimmed, sorted and deduplicated tags.
    pub fn tag_list(&self) -> Vec<String> {
        let mut tags = normalize_tags(self.tags.split(','));
        tags.sort();
        tags.dedup();
        tags
    }

    fn fields(&self, author: &AuthUser) -> ContentFields {
        ContentFields {
            title: Some(self.title.clone()),
            content: Some(self.content.clone()),
            tags: Some(self.tag_list()),
            author_id: Some(author.id.clone()),
            nickname: Some(author.display_name()),
            image: self.image.clone(),
            ..ContentFields::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub website_url: String,
}

impl EventDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require("description", &self.description)?;
        validate_website_url(&self.website_url)?;
        if self.end_date < self.start_date {
            return Err(ValidationError::DateOrder);
        }
        Ok(())
    }

    fn fields(&self) -> ContentFields {
        ContentFields {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            price: Some(self.price),
            start_date: Some(self.start_date),
            end_date: Some(self.end_date),
            website_url: Some(self.website_url.trim().to_string()),
            ..ContentFields::default()
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// Accepts absolute http(s) URLs that name a host.
pub fn validate_website_url(raw: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https links are allowed"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(url)
}

/// Whether the edit form may be shown for a loaded item.
pub fn can_edit(session: &Session, loaded: &Loaded<ContentItem>) -> bool {
    loaded
        .item
        .as_ref()
        .is_some_and(|item| session.owns(item))
}

/// Submits authored content and reports failures on the page's status board.
pub struct Authoring {
    store: Arc<dyn ContentStore>,
    status: StatusBoard,
}

impl Authoring {
    pub fn new(store: Arc<dyn ContentStore>, status: StatusBoard) -> Self {
        Self { store, status }
    }

    pub async fn create_article(
        &self,
        session: &Session,
        draft: &ArticleDraft,
    ) -> Result<(), SubmitError> {
        let author = self.author(session)?;
        self.check(draft.validate())?;
        let fields = draft.fields(author);
        self.report(
            self.store.insert(Collection::Articles, &fields).await,
            Collection::Articles,
            None,
        )
    }

    pub async fn update_article(
        &self,
        session: &Session,
        id: &ContentId,
        draft: &ArticleDraft,
    ) -> Result<(), SubmitError> {
        let author = self.author(session)?;
        self.check(draft.validate())?;
        let fields = draft.fields(author);
        self.report(
            self.store.update(Collection::Articles, id, &fields).await,
            Collection::Articles,
            Some(id),
        )
    }

    pub async fn update_event(
        &self,
        session: &Session,
        id: &ContentId,
        draft: &EventDraft,
    ) -> Result<(), SubmitError> {
        self.author(session)?;
        self.check(draft.validate())?;
        self.report(
            self.store
                .update(Collection::Events, id, &draft.fields())
                .await,
            Collection::Events,
            Some(id),
        )
    }

    fn author<'s>(&self, session: &'s Session) -> Result<&'s AuthUser, SubmitError> {
        session.user().ok_or_else(|| self.reject(SubmitError::SignedOut))
    }

    fn check(&self, validation: Result<(), ValidationError>) -> Result<(), SubmitError> {
        validation.map_err(|err| self.reject(err.into()))
    }

    /// Shows a client-side rejection on the status board; nothing was sent.
    fn reject(&self, err: SubmitError) -> SubmitError {
        self.status.set(InteractionStatus::error(err.to_string()));
        err
    }

    fn report(
        &self,
        result: Result<(), StoreError>,
        collection: Collection,
        id: Option<&ContentId>,
    ) -> Result<(), SubmitError> {
        let item_id = id.map(ContentId::as_str).unwrap_or("new");
        match result {
            Ok(()) => {
                info!(%collection, item_id, "authoring: saved");
                Ok(())
            }
            Err(error) => {
                warn!(%collection, item_id, "authoring: save failed: {error}");
                self.status.set(InteractionStatus::error(error.to_string()));
                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/authoring_tests.rs"]
mod tests;
