use std::future::Future;
use std::pin::Pin;

use domain::event::error::SourceError;
use domain::event::query::{EventPage, EventQuery};

/// Secondary port for retrieving audit events from a remote audit service.
///
/// Uses `Pin<Box<dyn Future>>` return type (instead of RPITIT) so the trait
/// is dyn-compatible and can be held as `Arc<dyn EventSource>`.
pub trait EventSource: Send + Sync {
    /// Fetch one page of audit events for a cluster.
    ///
    /// The returned page's `start_key` is the continuation cursor; an
    /// empty cursor signals that no further pages exist.
    fn fetch_events<'a>(
        &'a self,
        cluster_id: &'a str,
        query: &'a EventQuery,
    ) -> Pin<Box<dyn Future<Output = Result<EventPage, SourceError>> + Send + 'a>>;
}
