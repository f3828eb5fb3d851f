use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use shared::{
    domain::{Collection, ContentId, ContentItem, UserId},
    error::{StoreError, StoreErrorBody},
    protocol::{decode_rows, ContentFields},
};
use tracing::{debug, warn};
use url::Url;

pub mod authoring;
pub mod config;
pub mod deletion;
pub mod loader;
pub mod page;
pub mod presentation;
pub mod reactions;
pub mod sanitize;
pub mod session;
pub mod status;
pub mod tags;

pub use deletion::{DeletionFlow, DeletionOutcome, Navigator, RedirectTarget};
pub use loader::{ContentLoader, Loaded};
pub use page::{ContentPage, PageContext};
pub use reactions::{PendingToggle, ReactionStore, ToggleOutcome};
pub use sanitize::{render, SafeMarkup};
pub use session::{AuthUser, Session};
pub use status::{InteractionStatus, StatusBoard, StatusKind};
pub use tags::TagExpansion;

const REST_PATH: &str = "rest/v1";
const ARTICLE_SELECT: &str = "*,comments(*)";
const DEFAULT_SELECT: &str = "*";

/// The remote relational store holding the `articles` and `events` collections.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Rows whose `id` matches. Articles come with their nested comments.
    async fn fetch_by_id(
        &self,
        collection: Collection,
        id: &ContentId,
    ) -> Result<Vec<ContentItem>, StoreError>;
    async fn fetch_by_author(
        &self,
        collection: Collection,
        author_id: &UserId,
    ) -> Result<Vec<ContentItem>, StoreError>;
    async fn insert(&self, collection: Collection, fields: &ContentFields)
        -> Result<(), StoreError>;
    /// Applies a partial field set to the row keyed by `id`.
    async fn update(
        &self,
        collection: Collection,
        id: &ContentId,
        fields: &ContentFields,
    ) -> Result<(), StoreError>;
    async fn delete(&self, collection: Collection, id: &ContentId) -> Result<(), StoreError>;
}

/// `ContentStore` over a PostgREST endpoint.
pub struct RestContentStore {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    access_token: Option<String>,
}

impl RestContentStore {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
            api_key: None,
            access_token: None,
        }
    }

    pub fn from_settings(settings: &config::Settings) -> Result<Self, config::ConfigError> {
        let mut store = Self::new(settings.store_url()?);
        store.api_key = settings.api_key.clone();
        store.access_token = settings.access_token.clone();
        Ok(store)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Bearer token of the signed-in user; requests fall back to the api key without one.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self, collection: Collection) -> String {
        format!(
            "{}/{REST_PATH}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            collection.table()
        )
    }

    fn request(&self, method: Method, collection: Collection) -> RequestBuilder {
        let mut builder = self.http.request(method, self.table_url(collection));
        if let Some(api_key) = &self.api_key {
            builder = builder.header("apikey", api_key);
        }
        if let Some(token) = self.access_token.as_ref().or(self.api_key.as_ref()) {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn select(
        &self,
        collection: Collection,
        column: &str,
        value: &str,
        select: &str,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let response = self
            .request(Method::GET, collection)
            .query(&[eq_filter(column, value), ("select".to_string(), select.to_string())])
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        let rows: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        decode_rows(collection, rows).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn eq_filter(column: &str, value: &str) -> (String, String) {
    (column.to_string(), format!("eq.{value}"))
}

fn transport_error(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

/// Converts non-2xx responses into `StoreError::Remote`, keeping the store's message.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<StoreErrorBody>(&raw).unwrap_or_else(|_| {
        let message = if raw.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            raw.trim().to_string()
        };
        StoreErrorBody::new(message)
    });
    warn!(
        status = status.as_u16(),
        code = body.code.as_deref().unwrap_or_default(),
        "store: request rejected: {}",
        body.message
    );
    Err(StoreError::remote(status.as_u16(), body))
}

#[async_trait]
impl ContentStore for RestContentStore {
    async fn fetch_by_id(
        &self,
        collection: Collection,
        id: &ContentId,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let select = match collection {
            Collection::Articles => ARTICLE_SELECT,
            Collection::Events => DEFAULT_SELECT,
        };
        let rows = self
            .select(collection, "id", id.as_str(), select)
            .await?;
        debug!(%collection, item_id = %id, rows = rows.len(), "store: fetched by id");
        Ok(rows)
    }

    async fn fetch_by_author(
        &self,
        collection: Collection,
        author_id: &UserId,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let rows = self
            .select(collection, "author_id", author_id.as_str(), DEFAULT_SELECT)
            .await?;
        debug!(%collection, author_id = %author_id, rows = rows.len(), "store: fetched by author");
        Ok(rows)
    }

    async fn insert(
        &self,
        collection: Collection,
        fields: &ContentFields,
    ) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, collection)
            .header("Prefer", "return=minimal")
            .json(fields)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn update(
        &self,
        collection: Collection,
        id: &ContentId,
        fields: &ContentFields,
    ) -> Result<(), StoreError> {
        let response = self
            .request(Method::PATCH, collection)
            .query(&[eq_filter("id", id.as_str())])
            .header("Prefer", "return=minimal")
            .json(fields)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &ContentId) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, collection)
            .query(&[eq_filter("id", id.as_str())])
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
