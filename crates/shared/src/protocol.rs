use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    normalize_tags, Collection, Comment, ContentId, ContentItem, ContentKind, EventDetails,
    LikeSet, UserId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRow {
    pub id: ContentId,
    pub author_id: UserId,
    #[serde(default)]
    pub nickname: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub likes: Option<LikeSet>,
    #[serde(default)]
    pub comments: Option<Vec<Comment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
    pub id: ContentId,
    pub author_id: UserId,
    #[serde(default)]
    pub nickname: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, rename = "websiteUrl")]
    pub website_url: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub likes: Option<LikeSet>,
    pub created_at: DateTime<Utc>,
}

impl From<ArticleRow> for ContentItem {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            display_name: row.nickname.unwrap_or_default(),
            title: row.title,
            body: row.content.unwrap_or_default(),
            tags: row.tags.map(normalize_tags),
            likes: row.likes.unwrap_or_default(),
            comments: row.comments.unwrap_or_default(),
            created_at: row.created_at,
            kind: ContentKind::Article { image: row.image },
        }
    }
}

impl From<EventRow> for ContentItem {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            display_name: row.nickname.unwrap_or_default(),
            title: row.title,
            body: row.description.unwrap_or_default(),
            tags: row.tags.map(normalize_tags),
            likes: row.likes.unwrap_or_default(),
            comments: Vec::new(),
            created_at: row.created_at,
            kind: ContentKind::Event(EventDetails {
                price: row.price,
                start_date: row.start_date,
                end_date: row.end_date,
                website_url: row.website_url,
            }),
        }
    }
}

/// Decodes a JSON array of rows from `collection` into content items.
pub fn decode_rows(
    collection: Collection,
    rows: serde_json::Value,
) -> Result<Vec<ContentItem>, serde_json::Error> {
    Ok(match collection {
        Collection::Articles => serde_json::from_value::<Vec<ArticleRow>>(rows)?
            .into_iter()
            .map(ContentItem::from)
            .collect(),
        Collection::Events => serde_json::from_value::<Vec<EventRow>>(rows)?
            .into_iter()
            .map(ContentItem::from)
            .collect(),
    })
}

/// Field set sent on insert, or a partial field set sent on update.
/// Unset fields are omitted from the request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<LikeSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, rename = "startDate", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, rename = "websiteUrl", skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

impl ContentFields {
    /// Replaces the whole like-set of an item.
    pub fn likes(likes: LikeSet) -> Self {
        Self {
            likes: Some(likes),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_article_rows_with_nested_comments() {
        let rows = json!([{
            "id": 7,
            "author_id": "user-1",
            "nickname": "ada",
            "title": "Hello",
            "content": "<p>hi</p>",
            "tags": [" Rust", "web "],
            "likes": ["user-2", "user-2", "user-3"],
            "comments": [{"id": 1, "content": "nice", "article_id": 7}],
            "created_at": "2024-03-05T10:15:00.123456+00:00"
        }]);

        let items = decode_rows(Collection::Articles, rows).expect("decode");
        let item = &items[0];
        assert_eq!(item.id.as_str(), "7");
        assert_eq!(item.display_name, "ada");
        assert_eq!(item.body, "<p>hi</p>");
        assert_eq!(item.tag_list(), ["rust".to_string(), "web".to_string()]);
        assert_eq!(item.likes.len(), 2);
        assert_eq!(item.comments.len(), 1);
        assert_eq!(item.comments[0].extra.get("article_id"), Some(&json!(7)));
        assert_eq!(item.collection(), Collection::Articles);
    }

    #[test]
    fn decodes_event_rows_with_camel_case_details() {
        let rows = json!([{
            "id": "e1",
            "author_id": "user-1",
            "nickname": "ada",
            "title": "Meetup",
            "description": "<b>come</b>",
            "price": 12.5,
            "startDate": "2024-06-01",
            "endDate": "2024-06-02",
            "websiteUrl": "https://example.com/meetup",
            "likes": null,
            "created_at": "2024-03-05T10:15:00Z"
        }]);

        let items = decode_rows(Collection::Events, rows).expect("decode");
        let item = &items[0];
        assert!(item.likes.is_empty());
        assert_eq!(item.tags, None);
        match &item.kind {
            ContentKind::Event(details) => {
                assert_eq!(details.price, Some(12.5));
                assert_eq!(details.start_date, NaiveDate::from_ymd_opt(2024, 6, 1));
                assert_eq!(
                    details.website_url.as_deref(),
                    Some("https://example.com/meetup")
                );
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn like_update_serializes_only_the_like_set() {
        let fields = ContentFields::likes(LikeSet::new([UserId::from("u1")]));
        assert_eq!(
            serde_json::to_value(&fields).expect("json"),
            json!({"likes": ["u1"]})
        );
    }
}
