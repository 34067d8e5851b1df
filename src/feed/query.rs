//! The query seam between the feed store and the backend.

use std::future::Future;
use std::sync::Arc;

use once_cell::sync::Lazy;
use sqlx::PgPool;

use crate::db::models::{FeedPage, FeedRequest};
use crate::db::posts;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[derive(Debug, Clone, thiserror::Error)]
#[error("content query failed: {0}")]
pub struct QueryError(pub String);

/// Paginated content query. Implementations must return pages ordered by
/// descending creation time and honor the cursor contract: `None` means the
/// first page, and a returned `continue_cursor` is passed back verbatim.
pub trait ContentQuery: Send + Sync + 'static {
    fn fetch(
        &self,
        request: FeedRequest,
    ) -> impl Future<Output = Result<FeedPage, QueryError>> + Send;
}

/// Query implementation that goes straight to the database, sharing the same
/// keyset query the list route uses.
#[derive(Debug, Clone)]
pub struct DbContentQuery {
    pool: Arc<PgPool>,
}

impl DbContentQuery {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

impl ContentQuery for DbContentQuery {
    async fn fetch(&self, request: FeedRequest) -> Result<FeedPage, QueryError> {
        posts::list_page(
            self.pool.as_ref(),
            request.published_only,
            request.limit,
            request.cursor.as_deref(),
        )
        .await
        .map_err(|e| QueryError(e.to_string()))
    }
}

/// Query implementation that talks to a running instance of this service
/// over HTTP (`GET /api/posts`).
#[derive(Debug, Clone)]
pub struct HttpContentQuery {
    base_url: String,
}

impl HttpContentQuery {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

impl ContentQuery for HttpContentQuery {
    async fn fetch(&self, request: FeedRequest) -> Result<FeedPage, QueryError> {
        let mut req = HTTP_CLIENT
            .get(format!("{}/api/posts", self.base_url))
            .query(&[
                ("publishedOnly", request.published_only.to_string()),
                ("limit", request.limit.to_string()),
            ]);
        if let Some(cursor) = &request.cursor {
            req = req.query(&[("cursor", cursor.as_str())]);
        }

        let response = req.send().await.map_err(|e| QueryError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(QueryError(format!("unexpected status {status}")));
        }
        response
            .json::<FeedPage>()
            .await
            .map_err(|e| QueryError(e.to_string()))
    }
}
