//! The feed store: accumulated items, pagination cursor, loading/error flags.

use std::collections::HashSet;

use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::db::models::{FeedPage, FeedRequest, Post};

/// Page size requested per fetch.
pub const DEFAULT_PAGE_SIZE: i64 = 15;

/// A fetch the subscription worker should perform. The epoch ties the
/// eventual page delivery back to the store generation that requested it,
/// so a page from before a `reset` cannot leak into the fresh state.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub epoch: u64,
    pub request: FeedRequest,
}

/// Read-only view of the store handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<Post>,
    pub is_loading: bool,
    pub has_more: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
struct FeedState {
    items: Vec<Post>,
    cursor: Option<String>,
    has_more: bool,
    is_loading: bool,
    error: Option<String>,
    epoch: u64,
}

impl FeedState {
    fn fresh(epoch: u64) -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            has_more: true,
            is_loading: false,
            error: None,
            epoch,
        }
    }
}

/// Accumulates a deduplicated, ordered list of published items from a
/// paginated backend query.
///
/// Owned by whoever wires the application together and shared with consuming
/// views via `Arc`; only the subscription worker's `apply_page` mutates the
/// list.
#[derive(Debug)]
pub struct FeedStore {
    state: RwLock<FeedState>,
    page_size: i64,
    params_tx: watch::Sender<Option<PendingFetch>>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: i64) -> Self {
        let (params_tx, _) = watch::channel(None);
        Self {
            state: RwLock::new(FeedState::fresh(0)),
            page_size,
            params_tx,
        }
    }

    /// Receiver side of the query-parameter channel, consumed by the
    /// subscription worker.
    pub fn watch_params(&self) -> watch::Receiver<Option<PendingFetch>> {
        self.params_tx.subscribe()
    }

    /// Clear the feed back to its initial state. Idempotent; subsequent
    /// loads restart pagination from the beginning.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        let next_epoch = state.epoch + 1;
        *state = FeedState::fresh(next_epoch);
        // Withdraw any published parameters so the worker goes idle.
        self.params_tx.send_replace(None);
    }

    /// Request the next page. No-op unless `has_more` is set and no fetch is
    /// already in flight; retrying after an error is allowed.
    pub async fn load_more(&self) {
        let mut state = self.state.write().await;
        if !state.has_more || state.is_loading {
            return;
        }
        state.is_loading = true;
        let fetch = PendingFetch {
            epoch: state.epoch,
            request: FeedRequest {
                published_only: true,
                limit: self.page_size,
                cursor: state.cursor.clone(),
            },
        };
        self.params_tx.send_replace(Some(fetch));
    }

    /// Pure lookup into the accumulated items; no network effect.
    pub async fn get_by_id(&self, id: Uuid) -> Option<Post> {
        let state = self.state.read().await;
        state.items.iter().find(|post| post.id == id).cloned()
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.read().await;
        FeedSnapshot {
            items: state.items.clone(),
            is_loading: state.is_loading,
            has_more: state.has_more,
            error: state.error.clone(),
        }
    }

    pub async fn items(&self) -> Vec<Post> {
        self.state.read().await.items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn has_more(&self) -> bool {
        self.state.read().await.has_more
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub(crate) async fn cursor(&self) -> Option<String> {
        self.state.read().await.cursor.clone()
    }

    /// Deliver a page result. `None` models a failed fetch.
    ///
    /// A failed fetch records the error and clears the loading flag but
    /// leaves previously loaded items and the cursor untouched. A successful
    /// page is merged by id: items already present are skipped, so duplicate
    /// delivery of the same page neither duplicates nor reorders entries.
    pub async fn apply_page(&self, epoch: u64, result: Option<FeedPage>) {
        let mut state = self.state.write().await;
        if epoch != state.epoch {
            // Stale delivery from before a reset.
            return;
        }

        match result {
            None => {
                state.error = Some("Failed to load posts".to_string());
                state.is_loading = false;
            }
            Some(page) => {
                let existing: HashSet<Uuid> = state.items.iter().map(|post| post.id).collect();
                state
                    .items
                    .extend(page.page.into_iter().filter(|post| !existing.contains(&post.id)));

                state.cursor = if page.is_done {
                    None
                } else {
                    page.continue_cursor
                };
                state.has_more = !page.is_done;
                state.is_loading = false;
                state.error = None;
            }
        }
    }
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ItemKind;
    use chrono::Utc;

    fn post(id: Uuid, title: &str) -> Post {
        Post {
            id,
            kind: ItemKind::Article,
            title: title.to_string(),
            slug: title.to_string(),
            banner_image: None,
            content: "<p>body</p>".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            published: true,
            tags: vec![],
            links: None,
        }
    }

    fn page(posts: Vec<Post>, is_done: bool, cursor: Option<&str>) -> FeedPage {
        FeedPage {
            page: posts,
            is_done,
            continue_cursor: cursor.map(String::from),
        }
    }

    async fn pending(store: &FeedStore) -> Option<PendingFetch> {
        store.watch_params().borrow().clone()
    }

    #[tokio::test]
    async fn test_first_page_load() {
        let store = FeedStore::new();
        let a = post(Uuid::new_v4(), "a");
        let b = post(Uuid::new_v4(), "b");

        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        assert_eq!(fetch.request.limit, DEFAULT_PAGE_SIZE);
        assert!(fetch.request.published_only);
        assert!(fetch.request.cursor.is_none());
        assert!(store.is_loading().await);

        store
            .apply_page(fetch.epoch, Some(page(vec![a.clone(), b.clone()], false, Some("c1"))))
            .await;

        let snap = store.snapshot().await;
        assert_eq!(snap.items, vec![a, b]);
        assert!(snap.has_more);
        assert!(!snap.is_loading);
        assert!(snap.error.is_none());
        assert_eq!(store.cursor().await.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_second_page_deduplicates_overlap() {
        let store = FeedStore::new();
        let a = post(Uuid::new_v4(), "a");
        let b = post(Uuid::new_v4(), "b");
        let c = post(Uuid::new_v4(), "c");

        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store
            .apply_page(fetch.epoch, Some(page(vec![a.clone(), b.clone()], false, Some("c1"))))
            .await;

        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        assert_eq!(fetch.request.cursor.as_deref(), Some("c1"));
        store
            .apply_page(fetch.epoch, Some(page(vec![b.clone(), c.clone()], true, None)))
            .await;

        let snap = store.snapshot().await;
        assert_eq!(snap.items, vec![a, b, c]);
        assert!(!snap.has_more);
        assert!(store.cursor().await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_page_delivery_is_idempotent() {
        let store = FeedStore::new();
        let a = post(Uuid::new_v4(), "a");
        let b = post(Uuid::new_v4(), "b");

        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        let dup = page(vec![a.clone(), b.clone()], false, Some("c1"));
        store.apply_page(fetch.epoch, Some(dup.clone())).await;
        store.apply_page(fetch.epoch, Some(dup)).await;

        assert_eq!(store.items().await, vec![a, b]);
    }

    #[tokio::test]
    async fn test_load_more_noop_while_loading() {
        let store = FeedStore::new();
        store.load_more().await;
        let first = pending(&store).await;

        // Second call while the fetch is in flight must not publish new
        // parameters or touch the cursor.
        store.load_more().await;
        assert_eq!(pending(&store).await, first);
        assert!(store.is_loading().await);
        assert!(store.cursor().await.is_none());
    }

    #[tokio::test]
    async fn test_load_more_noop_when_exhausted() {
        let store = FeedStore::new();
        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store
            .apply_page(fetch.epoch, Some(page(vec![], true, None)))
            .await;
        assert!(!store.has_more().await);

        let mut rx = store.watch_params();
        rx.borrow_and_update();
        store.load_more().await;
        assert!(!rx.has_changed().unwrap());
        assert!(!store.is_loading().await);
    }

    #[tokio::test]
    async fn test_failed_first_load() {
        let store = FeedStore::new();
        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store.apply_page(fetch.epoch, None).await;

        let snap = store.snapshot().await;
        assert!(snap.items.is_empty());
        assert_eq!(snap.error.as_deref(), Some("Failed to load posts"));
        assert!(!snap.is_loading);
        assert!(snap.has_more);
    }

    #[tokio::test]
    async fn test_failure_preserves_loaded_items_and_cursor() {
        let store = FeedStore::new();
        let a = post(Uuid::new_v4(), "a");

        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store
            .apply_page(fetch.epoch, Some(page(vec![a.clone()], false, Some("c1"))))
            .await;

        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store.apply_page(fetch.epoch, None).await;

        let snap = store.snapshot().await;
        assert_eq!(snap.items, vec![a]);
        assert_eq!(store.cursor().await.as_deref(), Some("c1"));
        assert!(snap.error.is_some());
        assert!(!snap.is_loading);
    }

    #[tokio::test]
    async fn test_retry_after_error_is_allowed() {
        let store = FeedStore::new();
        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store.apply_page(fetch.epoch, None).await;

        let a = post(Uuid::new_v4(), "a");
        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store
            .apply_page(fetch.epoch, Some(page(vec![a.clone()], true, None)))
            .await;

        let snap = store.snapshot().await;
        assert_eq!(snap.items, vec![a]);
        assert!(snap.error.is_none());
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let store = FeedStore::new();
        let a = post(Uuid::new_v4(), "a");
        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store
            .apply_page(fetch.epoch, Some(page(vec![a], false, Some("c1"))))
            .await;

        store.reset().await;
        let once = store.snapshot().await;
        store.reset().await;
        let twice = store.snapshot().await;

        assert_eq!(once, twice);
        assert!(once.items.is_empty());
        assert!(once.has_more);
        assert!(!once.is_loading);
        assert!(once.error.is_none());
        assert!(store.cursor().await.is_none());
        assert!(pending(&store).await.is_none());
    }

    #[tokio::test]
    async fn test_stale_delivery_after_reset_is_ignored() {
        let store = FeedStore::new();
        store.load_more().await;
        let stale = pending(&store).await.unwrap();

        store.reset().await;
        store
            .apply_page(stale.epoch, Some(page(vec![post(Uuid::new_v4(), "a")], false, Some("c1"))))
            .await;

        let snap = store.snapshot().await;
        assert!(snap.items.is_empty());
        assert!(store.cursor().await.is_none());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = FeedStore::new();
        let a = post(Uuid::new_v4(), "a");
        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store
            .apply_page(fetch.epoch, Some(page(vec![a.clone()], true, None)))
            .await;

        assert_eq!(store.get_by_id(a.id).await, Some(a));
        assert_eq!(store.get_by_id(Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn test_order_preserved_across_pages() {
        let store = FeedStore::new();
        let posts: Vec<Post> = (0..6).map(|i| post(Uuid::new_v4(), &format!("p{i}"))).collect();

        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store
            .apply_page(fetch.epoch, Some(page(posts[0..3].to_vec(), false, Some("c1"))))
            .await;
        store.load_more().await;
        let fetch = pending(&store).await.unwrap();
        store
            .apply_page(fetch.epoch, Some(page(posts[3..6].to_vec(), true, None)))
            .await;

        assert_eq!(store.items().await, posts);
    }
}
