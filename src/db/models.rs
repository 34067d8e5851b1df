//! Database Models - domain structs for content items and contact messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Content item kind. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Article,
    ShowcaseEntry,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Article => "article",
            ItemKind::ShowcaseEntry => "showcase-entry",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "article" => Some(ItemKind::Article),
            "showcase-entry" => Some(ItemKind::ShowcaseEntry),
            _ => None,
        }
    }
}

/// A labelled external link attached to a showcase entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub label: String,
    pub url: String,
}

/// Optional link block for showcase entries. `references` defaults to empty
/// rather than being left absent, so consumers never see a missing list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectLinks {
    pub website: Option<String>,
    pub github: Option<String>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

/// Content item (article or showcase entry).
///
/// `created_at`/`updated_at` are author-supplied, not backend-generated;
/// the list ordering keys on `created_at` descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub kind: ItemKind,
    pub title: String,
    pub slug: String,
    pub banner_image: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published: bool,
    pub tags: Vec<String>,
    pub links: Option<ProjectLinks>,
}

/// Raw row shape as stored: `kind` is TEXT, `links` is JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub slug: String,
    pub banner_image: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published: bool,
    pub tags: Vec<String>,
    pub links: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown item kind: {0}")]
    UnknownKind(String),
    #[error("malformed links payload: {0}")]
    BadLinks(#[from] serde_json::Error),
}

impl TryFrom<PostRow> for Post {
    type Error = ModelError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let kind = ItemKind::parse(&row.kind).ok_or(ModelError::UnknownKind(row.kind))?;
        let links = row
            .links
            .map(serde_json::from_value::<ProjectLinks>)
            .transpose()?;
        Ok(Post {
            id: row.id,
            kind,
            title: row.title,
            slug: row.slug,
            banner_image: row.banner_image,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            published: row.published,
            tags: row.tags,
            links,
        })
    }
}

/// New content item for creation; carries all fields including timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub kind: ItemKind,
    pub title: String,
    pub slug: String,
    pub banner_image: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub links: Option<ProjectLinks>,
}

/// Full-record update keyed by id. `kind` and `created_at` stay fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePost {
    pub title: String,
    pub slug: String,
    pub banner_image: Option<String>,
    pub content: String,
    pub updated_at: DateTime<Utc>,
    pub published: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub links: Option<ProjectLinks>,
}

/// Request shape of the paginated content query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    pub published_only: bool,
    pub limit: i64,
    pub cursor: Option<String>,
}

/// One page of the paginated content query. `is_done == true` means no
/// further pages exist regardless of `continue_cursor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub page: Vec<Post>,
    pub is_done: bool,
    pub continue_cursor: Option<String>,
}

/// Contact form message.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// New contact message for insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}
