//! Post queries: keyset pagination, lookups, and mutations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{FeedPage, ModelError, NewPost, Post, PostRow, UpdatePost};

#[derive(Debug, thiserror::Error)]
pub enum PostStoreError {
    #[error("malformed pagination cursor")]
    BadCursor,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
}

const SELECT_COLUMNS: &str = "id, kind, title, slug, banner_image, content, \
     created_at, updated_at, published, tags, links";

// ============================================================================
// Cursor
// ============================================================================

/// Encode a keyset position as an opaque continuation token.
///
/// The token is the creation timestamp in microseconds plus the row id,
/// which together form the strict ordering key of the feed.
pub fn encode_cursor(created_at: DateTime<Utc>, id: Uuid) -> String {
    format!("{}.{}", created_at.timestamp_micros(), id.simple())
}

/// Decode a continuation token back into its keyset position.
pub fn decode_cursor(token: &str) -> Option<(DateTime<Utc>, Uuid)> {
    let (micros, id) = token.split_once('.')?;
    let micros: i64 = micros.parse().ok()?;
    let created_at = DateTime::from_timestamp_micros(micros)?;
    let id = Uuid::parse_str(id).ok()?;
    Some((created_at, id))
}

// ============================================================================
// Queries
// ============================================================================

/// Fetch one page of posts ordered by `(created_at, id)` descending.
///
/// `cursor = None` means the first page. One extra row is fetched to decide
/// whether further pages exist; `continue_cursor` points at the last row of
/// the returned page.
pub async fn list_page(
    pool: &PgPool,
    published_only: bool,
    limit: i64,
    cursor: Option<&str>,
) -> Result<FeedPage, PostStoreError> {
    let limit = limit.clamp(1, 100);
    let (after_created_at, after_id) = match cursor {
        Some(token) => {
            let (ts, id) = decode_cursor(token).ok_or(PostStoreError::BadCursor)?;
            (Some(ts), Some(id))
        }
        None => (None, None),
    };

    let rows: Vec<PostRow> = sqlx::query_as(&format!(
        r#"
        SELECT {SELECT_COLUMNS}
        FROM posts
        WHERE (NOT $1 OR published)
          AND ($2::timestamptz IS NULL OR (created_at, id) < ($2, $3::uuid))
        ORDER BY created_at DESC, id DESC
        LIMIT $4
        "#
    ))
    .bind(published_only)
    .bind(after_created_at)
    .bind(after_id)
    .bind(limit + 1)
    .fetch_all(pool)
    .await?;

    let is_done = rows.len() as i64 <= limit;
    let mut rows = rows;
    rows.truncate(limit as usize);

    let continue_cursor = if is_done {
        None
    } else {
        rows.last().map(|row| encode_cursor(row.created_at, row.id))
    };

    let page = rows
        .into_iter()
        .map(Post::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeedPage {
        page,
        is_done,
        continue_cursor,
    })
}

pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Post>, PostStoreError> {
    let row: Option<PostRow> =
        sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.map(Post::try_from).transpose().map_err(Into::into)
}

/// Slug is free text and not guaranteed unique; the newest match wins.
pub async fn get_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Post>, PostStoreError> {
    let row: Option<PostRow> = sqlx::query_as(&format!(
        "SELECT {SELECT_COLUMNS} FROM posts WHERE slug = $1 \
         ORDER BY created_at DESC, id DESC LIMIT 1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;
    row.map(Post::try_from).transpose().map_err(Into::into)
}

pub async fn insert(pool: &PgPool, new: &NewPost) -> Result<Post, PostStoreError> {
    let links = new
        .links
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(ModelError::from)?;

    let row: PostRow = sqlx::query_as(&format!(
        r#"
        INSERT INTO posts (kind, title, slug, banner_image, content,
                           created_at, updated_at, published, tags, links)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {SELECT_COLUMNS}
        "#
    ))
    .bind(new.kind.as_str())
    .bind(&new.title)
    .bind(&new.slug)
    .bind(&new.banner_image)
    .bind(&new.content)
    .bind(new.created_at)
    .bind(new.updated_at)
    .bind(new.published)
    .bind(&new.tags)
    .bind(links)
    .fetch_one(pool)
    .await?;

    row.try_into().map_err(Into::into)
}

/// Full-record patch keyed by id. Returns `None` when no row matches.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &UpdatePost,
) -> Result<Option<Post>, PostStoreError> {
    let links = patch
        .links
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(ModelError::from)?;

    let row: Option<PostRow> = sqlx::query_as(&format!(
        r#"
        UPDATE posts
        SET title = $1, slug = $2, banner_image = $3, content = $4,
            updated_at = $5, published = $6, tags = $7, links = $8
        WHERE id = $9
        RETURNING {SELECT_COLUMNS}
        "#
    ))
    .bind(&patch.title)
    .bind(&patch.slug)
    .bind(&patch.banner_image)
    .bind(&patch.content)
    .bind(patch.updated_at)
    .bind(patch.published)
    .bind(&patch.tags)
    .bind(links)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(Post::try_from).transpose().map_err(Into::into)
}

/// Returns the number of rows removed (0 or 1).
pub async fn delete_by_id(pool: &PgPool, id: Uuid) -> Result<u64, PostStoreError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Deprecated deletion path kept for compatibility with old tooling.
/// Titles are not unique, so this removes every matching row.
pub async fn delete_by_title(pool: &PgPool, title: &str) -> Result<u64, PostStoreError> {
    let result = sqlx::query("DELETE FROM posts WHERE title = $1")
        .bind(title)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let created_at = DateTime::from_timestamp_micros(1_700_000_000_123_456).unwrap();
        let id = Uuid::new_v4();
        let token = encode_cursor(created_at, id);
        let (decoded_ts, decoded_id) = decode_cursor(&token).unwrap();
        assert_eq!(decoded_ts, created_at);
        assert_eq!(decoded_id, id);
    }

    #[test]
    fn test_cursor_rejects_garbage() {
        assert!(decode_cursor("").is_none());
        assert!(decode_cursor("no-separator").is_none());
        assert!(decode_cursor("abc.def").is_none());
        assert!(decode_cursor("123456789.not-a-uuid").is_none());
        assert!(decode_cursor(".").is_none());
    }

    #[test]
    fn test_cursor_tokens_order_with_creation_time() {
        let id = Uuid::nil();
        let older = encode_cursor(DateTime::from_timestamp_micros(1_000).unwrap(), id);
        let newer = encode_cursor(DateTime::from_timestamp_micros(2_000).unwrap(), id);
        assert_ne!(older, newer);
    }
}
