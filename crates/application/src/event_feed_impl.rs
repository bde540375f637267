use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use domain::event::allowlist::is_database_event;
use domain::event::entity::AuditEvent;
use domain::event::error::SourceError;
use domain::event::query::{EventPage, EventQuery, TimeRange};
use ports::secondary::event_source::EventSource;

/// Default page size requested from the audit service.
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Where the feed stands with respect to fetching.
///
/// `Exhausted` and `Failed` absorb `fetch_more`; only a new `bind`
/// leaves them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    /// Not bound to a cluster/range yet.
    Idle,
    /// Initial page in flight.
    Processing,
    /// Continuation page in flight.
    Loading,
    /// A page landed and a continuation cursor is available.
    Ready,
    /// The last page has been received; the cursor is spent.
    Exhausted,
    /// The most recent fetch failed; the message is shown verbatim.
    Failed(String),
}

impl FetchState {
    /// Legacy presentation label: `""` when a load-more is possible,
    /// `"loading"` while a fetch is in flight, `"disabled"` when
    /// `fetch_more` would be a no-op.
    pub fn as_status_label(&self) -> &'static str {
        match self {
            Self::Idle | Self::Ready => "",
            Self::Processing | Self::Loading => "loading",
            Self::Exhausted | Self::Failed(_) => "disabled",
        }
    }
}

/// Outcome of the feed's current binding, derived from [`FetchState`].
///
/// Failure reporting lives in the one state machine; this view only
/// reshapes it for consumers that want a tri-state attempt signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Processing,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub status: AttemptStatus,
    pub status_text: Option<String>,
}

/// Read-only view of the feed for the presentation layer.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub cluster_id: String,
    pub range: TimeRange,
    pub events: Vec<AuditEvent>,
    pub fetch: FetchState,
}

impl FeedSnapshot {
    pub fn fetch_status_label(&self) -> &'static str {
        self.fetch.as_status_label()
    }

    pub fn attempt(&self) -> Attempt {
        match &self.fetch {
            FetchState::Idle | FetchState::Processing => Attempt {
                status: AttemptStatus::Processing,
                status_text: None,
            },
            FetchState::Failed(message) => Attempt {
                status: AttemptStatus::Failed,
                status_text: Some(message.clone()),
            },
            FetchState::Loading | FetchState::Ready | FetchState::Exhausted => Attempt {
                status: AttemptStatus::Success,
                status_text: None,
            },
        }
    }
}

struct FeedState {
    cluster_id: String,
    range: TimeRange,
    events: Vec<AuditEvent>,
    cursor: String,
    fetch: FetchState,
    /// Bumped on every bind; a completion whose generation no longer
    /// matches belongs to a superseded binding and is discarded.
    generation: u64,
}

/// Paginated accumulator of database audit events.
///
/// Owns the fetch state machine: `bind` replaces the accumulation for a
/// new `(cluster, range)` pair, `fetch_more` appends the next page. All
/// pages are re-filtered through the database allow-list even though the
/// audit service is asked to filter server-side. Port failures never
/// escape: they are folded into `FetchState::Failed` with the service
/// message intact.
///
/// One logical owner is assumed; the internal lock exists so that a
/// completion arriving after a re-bind can be detected and dropped, not
/// to serve concurrent callers.
pub struct EventFeedService {
    source: Arc<dyn EventSource>,
    page_limit: usize,
    state: Mutex<FeedState>,
}

impl EventFeedService {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            page_limit: DEFAULT_PAGE_LIMIT,
            state: Mutex::new(FeedState {
                cluster_id: String::new(),
                range: TimeRange::new(0, 0),
                events: Vec::new(),
                cursor: String::new(),
                fetch: FetchState::Idle,
                generation: 0,
            }),
        }
    }

    /// Override the page size requested per fetch.
    #[must_use]
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// (Re)bind the feed to a cluster and time window and fetch the
    /// first page.
    ///
    /// The accumulation is reset before the request goes out. If a fetch
    /// from a previous binding is still outstanding, its response will be
    /// discarded when it lands.
    pub async fn bind(&self, cluster_id: &str, range: TimeRange) {
        let (generation, cluster, query) = {
            let mut state = self.lock();
            state.generation += 1;
            state.cluster_id = cluster_id.to_string();
            state.range = range.clone();
            state.events.clear();
            state.cursor.clear();
            state.fetch = FetchState::Processing;
            (
                state.generation,
                state.cluster_id.clone(),
                EventQuery::first_page(range, self.page_limit),
            )
        };

        let result = self.source.fetch_events(&cluster, &query).await;
        self.apply(generation, result, false);
    }

    /// Re-fetch the already-bound cluster with a new time window.
    ///
    /// Shorthand for `bind` with the current cluster: the accumulation
    /// is replaced, never extended across windows.
    pub async fn set_range(&self, range: TimeRange) {
        let cluster = self.lock().cluster_id.clone();
        self.bind(&cluster, range).await;
    }

    /// Fetch the next page and append it to the accumulation.
    ///
    /// A no-op unless the feed is `Ready`: calls while a fetch is in
    /// flight, after exhaustion, or after a failure are ignored rather
    /// than treated as errors.
    pub async fn fetch_more(&self) {
        let (generation, cluster, query) = {
            let mut state = self.lock();
            if state.fetch != FetchState::Ready {
                return;
            }
            state.fetch = FetchState::Loading;
            (
                state.generation,
                state.cluster_id.clone(),
                EventQuery::next_page(state.range.clone(), state.cursor.clone(), self.page_limit),
            )
        };

        let result = self.source.fetch_events(&cluster, &query).await;
        self.apply(generation, result, true);
    }

    /// Read-only snapshot of the accumulation and fetch state.
    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.lock();
        FeedSnapshot {
            cluster_id: state.cluster_id.clone(),
            range: state.range.clone(),
            events: state.events.clone(),
            fetch: state.fetch.clone(),
        }
    }

    fn apply(&self, generation: u64, result: Result<EventPage, SourceError>, append: bool) {
        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(
                generation,
                current = state.generation,
                "discarding audit page from a superseded binding"
            );
            return;
        }

        match result {
            Ok(page) => {
                let received = page.events.len();
                let exhausted = page.is_last();
                let accepted: Vec<AuditEvent> = page
                    .events
                    .into_iter()
                    .filter(|event| is_database_event(&event.code))
                    .collect();
                tracing::debug!(
                    received,
                    accepted = accepted.len(),
                    exhausted,
                    "audit page applied"
                );

                if append {
                    state.events.extend(accepted);
                } else {
                    state.events = accepted;
                }
                state.cursor = page.start_key;
                state.fetch = if exhausted {
                    FetchState::Exhausted
                } else {
                    FetchState::Ready
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, cluster_id = %state.cluster_id, "audit event fetch failed");
                state.fetch = FetchState::Failed(e.to_string());
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU32, Ordering};

    use domain::event::entity::EventCode;
    use domain::event::error::SourceError;
    use domain::event::query::EventPage;
    use tokio::sync::oneshot;

    struct Scripted {
        gate: Option<oneshot::Receiver<()>>,
        result: Result<EventPage, SourceError>,
    }

    struct ScriptedSource {
        responses: Mutex<VecDeque<Scripted>>,
        queries: Mutex<Vec<EventQuery>>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                queries: Mutex::new(Vec::new()),
                calls: AtomicU32::new(0),
            }
        }

        fn push(&self, result: Result<EventPage, SourceError>) {
            self.responses.lock().unwrap().push_back(Scripted { gate: None, result });
        }

        /// Queue a response that is held back until the sender fires.
        fn push_gated(&self, result: Result<EventPage, SourceError>) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.responses.lock().unwrap().push_back(Scripted {
                gate: Some(rx),
                result,
            });
            tx
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EventSource for ScriptedSource {
        fn fetch_events<'a>(
            &'a self,
            _cluster_id: &'a str,
            query: &'a EventQuery,
        ) -> Pin<Box<dyn Future<Output = Result<EventPage, SourceError>> + Send + 'a>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.queries.lock().unwrap().push(query.clone());
                let scripted = self
                    .responses
                    .lock()
                    .unwrap()
                    .pop_front()
                    .expect("unexpected fetch");
                if let Some(gate) = scripted.gate {
                    let _ = gate.await;
                }
                scripted.result
            })
        }
    }

    fn event(id: &str, code: EventCode) -> AuditEvent {
        AuditEvent {
            id: id.to_string(),
            code,
            timestamp_ns: 1_700_000_000_000_000_000,
            user: "alice".to_string(),
            raw: serde_json::Map::new(),
        }
    }

    fn db_event(id: &str) -> AuditEvent {
        event(id, EventCode::DatabaseSessionQuery)
    }

    fn page(events: Vec<AuditEvent>, start_key: &str) -> EventPage {
        EventPage {
            events,
            start_key: start_key.to_string(),
        }
    }

    fn ids(snapshot: &FeedSnapshot) -> Vec<&str> {
        snapshot.events.iter().map(|e| e.id.as_str()).collect()
    }

    #[tokio::test]
    async fn bind_accumulates_first_page() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(vec![db_event("e1"), db_event("e2")], "k1")));
        let feed = EventFeedService::new(source.clone());

        feed.bind("cluster1", TimeRange::new(0, 100)).await;

        let snap = feed.snapshot();
        assert_eq!(ids(&snap), ["e1", "e2"]);
        assert_eq!(snap.fetch, FetchState::Ready);
        assert_eq!(snap.cluster_id, "cluster1");
    }

    #[tokio::test]
    async fn fetch_more_appends_and_exhausts_on_empty_cursor() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(vec![db_event("e1"), db_event("e2")], "k1")));
        source.push(Ok(page(vec![db_event("e3")], "")));
        let feed = EventFeedService::new(source.clone());

        feed.bind("cluster1", TimeRange::new(0, 100)).await;
        feed.fetch_more().await;

        let snap = feed.snapshot();
        assert_eq!(ids(&snap), ["e1", "e2", "e3"]);
        assert_eq!(snap.fetch, FetchState::Exhausted);

        // The continuation request resumed at the first page's cursor.
        let queries = source.queries.lock().unwrap();
        assert_eq!(queries[1].start_key.as_deref(), Some("k1"));
    }

    #[tokio::test]
    async fn fetch_more_after_exhaustion_is_a_no_op() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(vec![db_event("e1")], "")));
        let feed = EventFeedService::new(source.clone());

        feed.bind("cluster1", TimeRange::new(0, 100)).await;
        assert_eq!(feed.snapshot().fetch, FetchState::Exhausted);

        feed.fetch_more().await;

        assert_eq!(source.calls(), 1);
        let snap = feed.snapshot();
        assert_eq!(ids(&snap), ["e1"]);
        assert_eq!(snap.fetch, FetchState::Exhausted);
    }

    #[tokio::test]
    async fn pages_are_refiltered_through_the_allow_list() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(
            vec![
                db_event("e1"),
                event("e2", EventCode::Unrecognized("SSH_SESSION_STARTED".to_string())),
                event("e3", EventCode::DatabaseSessionUserCreate),
            ],
            "k1",
        )));
        source.push(Ok(page(
            vec![
                event("e4", EventCode::Unrecognized("APP_ACCESS".to_string())),
                db_event("e5"),
            ],
            "",
        )));
        let feed = EventFeedService::new(source);

        feed.bind("cluster1", TimeRange::new(0, 100)).await;
        assert_eq!(ids(&feed.snapshot()), ["e1"]);

        feed.fetch_more().await;
        assert_eq!(ids(&feed.snapshot()), ["e1", "e5"]);
    }

    #[tokio::test]
    async fn bind_failure_surfaces_the_message_verbatim() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Err(SourceError::Service("timeout".to_string())));
        let feed = EventFeedService::new(source);

        feed.bind("cluster1", TimeRange::new(0, 100)).await;

        let snap = feed.snapshot();
        assert!(snap.events.is_empty());
        assert_eq!(snap.fetch, FetchState::Failed("timeout".to_string()));

        let attempt = snap.attempt();
        assert_eq!(attempt.status, AttemptStatus::Failed);
        assert_eq!(attempt.status_text.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn fetch_more_failure_keeps_accumulated_events() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(vec![db_event("e1"), db_event("e2")], "k1")));
        source.push(Err(SourceError::Service("backend unavailable".to_string())));
        let feed = EventFeedService::new(source.clone());

        feed.bind("cluster1", TimeRange::new(0, 100)).await;
        feed.fetch_more().await;

        let snap = feed.snapshot();
        assert_eq!(ids(&snap), ["e1", "e2"]);
        assert_eq!(
            snap.fetch,
            FetchState::Failed("backend unavailable".to_string())
        );

        // Failed absorbs further fetch_more calls until a re-bind.
        feed.fetch_more().await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn fetch_more_while_loading_issues_no_second_request() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(vec![db_event("e1")], "k1")));
        let gate = source.push_gated(Ok(page(vec![db_event("e2")], "")));
        let feed = Arc::new(EventFeedService::new(source.clone()));

        feed.bind("cluster1", TimeRange::new(0, 100)).await;

        let in_flight = tokio::spawn({
            let feed = Arc::clone(&feed);
            async move { feed.fetch_more().await }
        });
        while feed.snapshot().fetch != FetchState::Loading {
            tokio::task::yield_now().await;
        }

        // Second call while the first is outstanding: silently ignored.
        feed.fetch_more().await;
        assert_eq!(source.calls(), 2);

        gate.send(()).unwrap();
        in_flight.await.unwrap();
        assert_eq!(ids(&feed.snapshot()), ["e1", "e2"]);
    }

    #[tokio::test]
    async fn rebind_discards_the_stale_in_flight_response() {
        let source = Arc::new(ScriptedSource::new());
        let gate = source.push_gated(Ok(page(vec![db_event("old")], "k-old")));
        source.push(Ok(page(vec![db_event("new")], "")));
        let feed = Arc::new(EventFeedService::new(source.clone()));

        let first_bind = tokio::spawn({
            let feed = Arc::clone(&feed);
            async move { feed.bind("cluster1", TimeRange::new(0, 100)).await }
        });
        while source.calls() == 0 {
            tokio::task::yield_now().await;
        }

        // New binding supersedes the outstanding one.
        feed.bind("cluster1", TimeRange::new(100, 200)).await;
        assert_eq!(ids(&feed.snapshot()), ["new"]);

        // The first binding's response lands late and must not apply.
        gate.send(()).unwrap();
        first_bind.await.unwrap();

        let snap = feed.snapshot();
        assert_eq!(ids(&snap), ["new"]);
        assert_eq!(snap.range, TimeRange::new(100, 200));
        assert_eq!(snap.fetch, FetchState::Exhausted);
    }

    #[tokio::test]
    async fn rebind_recovers_from_failure() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Err(SourceError::Service("timeout".to_string())));
        source.push(Ok(page(vec![db_event("e1")], "")));
        let feed = EventFeedService::new(source);

        feed.bind("cluster1", TimeRange::new(0, 100)).await;
        assert!(matches!(feed.snapshot().fetch, FetchState::Failed(_)));

        feed.bind("cluster1", TimeRange::new(0, 200)).await;
        let snap = feed.snapshot();
        assert_eq!(ids(&snap), ["e1"]);
        assert_eq!(snap.fetch, FetchState::Exhausted);
    }

    #[tokio::test]
    async fn rebind_replaces_rather_than_appends() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(vec![db_event("e1"), db_event("e2")], "")));
        source.push(Ok(page(vec![db_event("e3")], "")));
        let feed = EventFeedService::new(source);

        feed.bind("cluster1", TimeRange::new(0, 100)).await;
        feed.bind("cluster1", TimeRange::new(50, 150)).await;

        assert_eq!(ids(&feed.snapshot()), ["e3"]);
    }

    #[tokio::test]
    async fn set_range_rebinds_the_current_cluster() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(vec![db_event("e1")], "")));
        source.push(Ok(page(vec![db_event("e2")], "")));
        let feed = EventFeedService::new(source);

        feed.bind("cluster1", TimeRange::new(0, 100)).await;
        feed.set_range(TimeRange::new(100, 200)).await;

        let snap = feed.snapshot();
        assert_eq!(snap.cluster_id, "cluster1");
        assert_eq!(ids(&snap), ["e2"]);
        assert_eq!(snap.range, TimeRange::new(100, 200));
    }

    #[tokio::test]
    async fn first_page_request_has_no_cursor() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Ok(page(vec![], "")));
        let feed = EventFeedService::new(source.clone()).with_page_limit(25);

        feed.bind("cluster1", TimeRange::new(0, 100)).await;

        let queries = source.queries.lock().unwrap();
        assert_eq!(queries[0].start_key, None);
        assert_eq!(queries[0].limit, 25);
        assert_eq!(queries[0].filter_by, "db");
    }

    #[test]
    fn status_labels_match_the_presentation_contract() {
        assert_eq!(FetchState::Ready.as_status_label(), "");
        assert_eq!(FetchState::Processing.as_status_label(), "loading");
        assert_eq!(FetchState::Loading.as_status_label(), "loading");
        assert_eq!(FetchState::Exhausted.as_status_label(), "disabled");
        assert_eq!(
            FetchState::Failed("x".to_string()).as_status_label(),
            "disabled"
        );
    }

    #[test]
    fn snapshot_of_an_unbound_feed_is_idle_and_empty() {
        let source = Arc::new(ScriptedSource::new());
        let feed = EventFeedService::new(source);

        let snap = feed.snapshot();
        assert!(snap.events.is_empty());
        assert_eq!(snap.fetch, FetchState::Idle);
        assert_eq!(snap.attempt().status, AttemptStatus::Processing);
    }
}
