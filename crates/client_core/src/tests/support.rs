use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::{
    domain::{Collection, ContentId, ContentItem, ContentKind, LikeSet, UserId},
    error::StoreError,
    protocol::ContentFields,
};
use tokio::sync::Notify;

use crate::{
    deletion::{Navigator, RedirectTarget},
    ContentStore,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoreCall {
    FetchById(Collection, ContentId),
    FetchByAuthor(Collection, UserId),
    Insert(Collection, ContentFields),
    Update(Collection, ContentId, ContentFields),
    Delete(Collection, ContentId),
}

/// In-memory store that records every call and can be told to fail or to hold updates.
#[derive(Default)]
pub(crate) struct MemoryStore {
    rows: Mutex<HashMap<(Collection, ContentId), ContentItem>>,
    calls: Mutex<Vec<StoreCall>>,
    fail_with: Mutex<Option<StoreError>>,
    update_gate: Option<Arc<Notify>>,
}

impl MemoryStore {
    pub(crate) fn with_items(items: impl IntoIterator<Item = ContentItem>) -> Self {
        let store = Self::default();
        {
            let mut rows = store.rows.lock().expect("rows");
            for item in items {
                rows.insert((item.collection(), item.id.clone()), item);
            }
        }
        store
    }

    /// Updates wait on the returned `Notify` before completing.
    pub(crate) fn hold_updates(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.update_gate = Some(gate.clone());
        (self, gate)
    }

    pub(crate) fn fail_with(&self, err: StoreError) {
        *self.fail_with.lock().expect("fail_with") = Some(err);
    }

    pub(crate) fn succeed(&self) {
        *self.fail_with.lock().expect("fail_with") = None;
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("calls").clone()
    }

    pub(crate) fn item(&self, collection: Collection, id: &str) -> Option<ContentItem> {
        self.rows
            .lock()
            .expect("rows")
            .get(&(collection, ContentId::from(id)))
            .cloned()
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls.lock().expect("calls").push(call);
        match self.fail_with.lock().expect("fail_with").clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_by_id(
        &self,
        collection: Collection,
        id: &ContentId,
    ) -> Result<Vec<ContentItem>, StoreError> {
        self.record(StoreCall::FetchById(collection, id.clone()))?;
        let rows = self.rows.lock().expect("rows");
        Ok(rows.get(&(collection, id.clone())).cloned().into_iter().collect())
    }

    async fn fetch_by_author(
        &self,
        collection: Collection,
        author_id: &UserId,
    ) -> Result<Vec<ContentItem>, StoreError> {
        self.record(StoreCall::FetchByAuthor(collection, author_id.clone()))?;
        let rows = self.rows.lock().expect("rows");
        let mut items: Vec<ContentItem> = rows
            .iter()
            .filter(|((c, _), item)| *c == collection && item.author_id == *author_id)
            .map(|(_, item)| item.clone())
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn insert(
        &self,
        collection: Collection,
        fields: &ContentFields,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::Insert(collection, fields.clone()))
    }

    async fn update(
        &self,
        collection: Collection,
        id: &ContentId,
        fields: &ContentFields,
    ) -> Result<(), StoreError> {
        if let Some(gate) = &self.update_gate {
            gate.notified().await;
        }
        self.record(StoreCall::Update(collection, id.clone(), fields.clone()))?;
        let mut rows = self.rows.lock().expect("rows");
        if let Some(item) = rows.get_mut(&(collection, id.clone())) {
            if let Some(likes) = &fields.likes {
                item.likes = likes.clone();
            }
            if let Some(title) = &fields.title {
                item.title = title.clone();
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &ContentId) -> Result<(), StoreError> {
        self.record(StoreCall::Delete(collection, id.clone()))?;
        self.rows.lock().expect("rows").remove(&(collection, id.clone()));
        Ok(())
    }
}

/// Navigator that remembers where it was sent.
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    visits: Mutex<Vec<RedirectTarget>>,
}

impl RecordingNavigator {
    pub(crate) fn visits(&self) -> Vec<RedirectTarget> {
        self.visits.lock().expect("visits").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: RedirectTarget) {
        self.visits.lock().expect("visits").push(target);
    }
}

pub(crate) fn remote_error(message: &str) -> StoreError {
    StoreError::Remote {
        status: 403,
        code: Some("42501".to_string()),
        message: message.to_string(),
    }
}

pub(crate) fn sample_article(id: &str, author: &str) -> ContentItem {
    ContentItem {
        id: ContentId::from(id),
        author_id: UserId::from(author),
        display_name: "ada".to_string(),
        title: "Borrowing without tears".to_string(),
        body: "<p>Lifetimes <script>steal()</script>explained</p>".to_string(),
        tags: Some((0..10).map(|i| format!("tag{i}")).collect()),
        likes: LikeSet::new([UserId::from("fan-1")]),
        comments: Vec::new(),
        created_at: "2024-02-01T09:30:00Z".parse().expect("timestamp"),
        kind: ContentKind::Article { image: None },
    }
}

pub(crate) fn sample_event(id: &str, author: &str) -> ContentItem {
    ContentItem {
        kind: ContentKind::Event(shared::domain::EventDetails {
            price: Some(10.0),
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            end_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 2),
            website_url: Some("https://example.com".to_string()),
        }),
        tags: None,
        ..sample_article(id, author)
    }
}
