//! Subscription worker: re-queries whenever the store publishes new
//! parameters and delivers each page back into the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::query::ContentQuery;
use super::store::FeedStore;

/// Upper bound on a single page fetch. A request that exceeds it resolves as
/// a failed page arrival instead of leaving the store loading forever.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle to the worker task. Dropping it (or calling `unsubscribe`) tears
/// the subscription down; the worker also exits on its own once the store is
/// dropped and the parameter channel closes.
#[derive(Debug)]
pub struct FeedSubscription {
    handle: JoinHandle<()>,
}

impl FeedSubscription {
    pub fn spawn<Q: ContentQuery>(store: Arc<FeedStore>, query: Q) -> Self {
        Self::spawn_with_timeout(store, query, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn spawn_with_timeout<Q: ContentQuery>(
        store: Arc<FeedStore>,
        query: Q,
        fetch_timeout: Duration,
    ) -> Self {
        let mut params = store.watch_params();
        let handle = tokio::spawn(async move {
            while params.changed().await.is_ok() {
                let pending = params.borrow_and_update().clone();
                let Some(pending) = pending else {
                    continue;
                };

                let outcome =
                    match tokio::time::timeout(fetch_timeout, query.fetch(pending.request)).await {
                        Ok(Ok(page)) => Some(page),
                        Ok(Err(e)) => {
                            tracing::warn!(error = %e, "content query failed");
                            None
                        }
                        Err(_) => {
                            tracing::warn!(
                                timeout_ms = fetch_timeout.as_millis() as u64,
                                "content query timed out"
                            );
                            None
                        }
                    };

                store.apply_page(pending.epoch, outcome).await;
            }
        });
        Self { handle }
    }

    pub fn unsubscribe(self) {
        self.handle.abort();
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
