/*!
 * Content Feed Module
 * Client-side store that incrementally loads, deduplicates, and exposes a
 * cursor-paginated list of published content items.
 *
 * The store never fetches directly: `load_more` only publishes new query
 * parameters, and a `FeedSubscription` worker re-queries whenever the
 * parameters change and delivers each page back into the store. At most one
 * request is in flight at a time; the `is_loading` flag is the sole
 * backpressure mechanism.
 */

pub mod query;
pub mod store;
pub mod subscription;

pub use query::{ContentQuery, DbContentQuery, HttpContentQuery, QueryError};
pub use store::{FeedSnapshot, FeedStore, PendingFetch, DEFAULT_PAGE_SIZE};
pub use subscription::FeedSubscription;
