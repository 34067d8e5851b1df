/**
 * Post Routes
 * CRUD and cursor-paginated listing for content items
 */
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{
    self,
    models::{NewPost, UpdatePost},
    posts::{self, PostStoreError},
};
use crate::routes::{ErrorResponse, SuccessResponse};
use crate::validate;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/posts
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListQuery {
    #[serde(default)]
    pub published_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub cursor: Option<String>,
}

fn default_limit() -> i64 {
    10
}

/// Request body for POST /api/posts/delete-by-title
#[derive(Debug, Deserialize)]
pub struct DeleteByTitleRequest {
    pub title: String,
}

/// Response for POST /api/posts/delete-by-title
#[derive(Debug, Serialize)]
pub struct DeleteByTitleResponse {
    pub success: bool,
    pub deleted: u64,
}

// ============================================================================
// Helpers
// ============================================================================

/// Sanitize HTML content using ammonia
fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

fn internal_error(context: &str, err: PostStoreError) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!(error = %err, "{context}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Database error")),
    )
}

fn db_unavailable() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new("Database not available")),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/posts - Cursor-paginated list, newest first.
/// Response: { page, isDone, continueCursor }
pub async fn list_posts(Query(query): Query<PostListQuery>) -> impl IntoResponse {
    // Reject malformed cursors before touching the pool so callers get a
    // useful 400 instead of a 500.
    if let Some(cursor) = query.cursor.as_deref() {
        if posts::decode_cursor(cursor).is_none() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Invalid cursor")),
            )
                .into_response();
        }
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match posts::list_page(
        pool.as_ref(),
        query.published_only,
        query.limit,
        query.cursor.as_deref(),
    )
    .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(PostStoreError::BadCursor) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid cursor")),
        )
            .into_response(),
        Err(e) => internal_error("failed to list posts", e).into_response(),
    }
}

/// GET /api/posts/:id
pub async fn get_post(Path(id): Path<Uuid>) -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match posts::get_by_id(pool.as_ref(), id).await {
        Ok(Some(post)) => (StatusCode::OK, Json(post)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response(),
        Err(e) => internal_error("failed to fetch post by id", e).into_response(),
    }
}

/// GET /api/posts/slug/:slug
///
/// Slug is free text (no format guarantee); lookups match it verbatim and
/// the newest item wins when several share one.
pub async fn get_post_by_slug(Path(slug): Path<String>) -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match posts::get_by_slug(pool.as_ref(), &slug).await {
        Ok(Some(post)) => (StatusCode::OK, Json(post)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response(),
        Err(e) => internal_error("failed to fetch post by slug", e).into_response(),
    }
}

/// POST /api/posts - Create a content item
pub async fn create_post(Json(payload): Json<NewPost>) -> impl IntoResponse {
    if let Err(e) = validate::validate_item(
        &payload.title,
        &payload.slug,
        &payload.tags,
        payload.links.as_ref(),
    ) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let payload = NewPost {
        content: sanitize_html(&payload.content),
        ..payload
    };

    match posts::insert(pool.as_ref(), &payload).await {
        Ok(post) => (StatusCode::CREATED, Json(post)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to create post");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to create post")),
            )
                .into_response()
        }
    }
}

/// PATCH /api/posts/:id - Full-record update
///
/// Runs the same validation as the create path; `kind` and `createdAt` are
/// immutable and not part of the payload.
pub async fn update_post(
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePost>,
) -> impl IntoResponse {
    if let Err(e) = validate::validate_item(
        &payload.title,
        &payload.slug,
        &payload.tags,
        payload.links.as_ref(),
    ) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let payload = UpdatePost {
        content: sanitize_html(&payload.content),
        ..payload
    };

    match posts::update(pool.as_ref(), id, &payload).await {
        Ok(Some(post)) => (StatusCode::OK, Json(post)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response(),
        Err(e) => internal_error("failed to update post", e).into_response(),
    }
}

/// DELETE /api/posts/:id
pub async fn delete_post(Path(id): Path<Uuid>) -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match posts::delete_by_id(pool.as_ref(), id).await {
        Ok(0) => (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response(),
        Ok(_) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => internal_error("failed to delete post", e).into_response(),
    }
}

/// POST /api/posts/delete-by-title - Deprecated deletion path
///
/// Titles are not unique, so this can remove several unrelated items at
/// once. Prefer DELETE /api/posts/:id. A missing title is a no-op, not an
/// error.
pub async fn delete_posts_by_title(Json(payload): Json<DeleteByTitleRequest>) -> impl IntoResponse {
    tracing::warn!(
        title = %payload.title,
        "delete-by-title is deprecated; use DELETE /api/posts/:id"
    );

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match posts::delete_by_title(pool.as_ref(), &payload.title).await {
        Ok(deleted) => (
            StatusCode::OK,
            Json(DeleteByTitleResponse {
                success: true,
                deleted,
            }),
        )
            .into_response(),
        Err(e) => internal_error("failed to delete posts by title", e).into_response(),
    }
}
