use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Row keys arrive either as text (uuid) or as integers (bigint identity).
#[derive(Deserialize)]
#[serde(untagged)]
enum WireKey {
    Text(String),
    Number(i64),
}

impl From<WireKey> for String {
    fn from(value: WireKey) -> Self {
        match value {
            WireKey::Text(text) => text,
            WireKey::Number(number) => number.to_string(),
        }
    }
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                WireKey::deserialize(deserializer).map(|key| Self(key.into()))
            }
        }
    };
}

id_newtype!(ContentId);
id_newtype!(UserId);
id_newtype!(CommentId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Articles,
    Events,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Self::Articles => "articles",
            Self::Events => "events",
        }
    }

    /// Singular noun used in user-facing messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Articles => "article",
            Self::Events => "event",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "articles" | "article" => Ok(Self::Articles),
            "events" | "event" => Ok(Self::Events),
            other => Err(format!("unknown collection '{other}'")),
        }
    }
}

/// Users who liked an item. A user appears at most once; insertion order is kept
/// for display but two sets compare equal regardless of order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct LikeSet(Vec<UserId>);

impl LikeSet {
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Self {
        let mut likes = Vec::new();
        for user in users {
            if !likes.contains(&user) {
                likes.push(user);
            }
        }
        Self(likes)
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.0.contains(user)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }

    /// The set with `user` removed when present, appended otherwise.
    pub fn toggled(&self, user: &UserId) -> Self {
        if self.contains(user) {
            Self(self.0.iter().filter(|id| *id != user).cloned().collect())
        } else {
            let mut likes = self.0.clone();
            likes.push(user.clone());
            Self(likes)
        }
    }
}

impl PartialEq for LikeSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|user| other.contains(user))
    }
}

impl Eq for LikeSet {}

impl From<Vec<UserId>> for LikeSet {
    fn from(value: Vec<UserId>) -> Self {
        Self::new(value)
    }
}

impl From<LikeSet> for Vec<UserId> {
    fn from(value: LikeSet) -> Self {
        value.0
    }
}

/// Lowercases and trims tags, dropping blanks. Order is preserved.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields owned by the comment collaborator that this crate does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDetails {
    pub price: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub website_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentKind {
    Article { image: Option<String> },
    Event(EventDetails),
}

/// An article or event as loaded from the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub id: ContentId,
    pub author_id: UserId,
    /// Author nickname captured when the item was written.
    pub display_name: String,
    pub title: String,
    pub body: String,
    pub tags: Option<Vec<String>>,
    pub likes: LikeSet,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub kind: ContentKind,
}

impl ContentItem {
    pub fn collection(&self) -> Collection {
        match self.kind {
            ContentKind::Article { .. } => Collection::Articles,
            ContentKind::Event(_) => Collection::Events,
        }
    }

    pub fn tag_list(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }
}
