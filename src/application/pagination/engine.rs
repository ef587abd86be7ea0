//! Pagination engine
//!
//! Holds the page/size/items state of one list and keeps it in sync with a
//! remote collection through an injected [`PageFetcher`].
//!
//! Every change of page or size schedules one debounced fetch cycle. A cycle:
//! 1. bails out if another cycle is in flight,
//! 2. marks the list loading and clears the previous error,
//! 3. re-validates the page against the last known page count,
//! 4. loads the page, retrying with exponential backoff,
//! 5. commits items and totals, clamping the page if the collection shrank.
//!
//! Failures never escape the engine. They are observed through `error`,
//! `last_error` and the status sink, with `items` emptied.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::pagination::{
    page_for_new_size, validate_page_number, validate_page_size, ItemRange, DEFAULT_PAGE,
    DEFAULT_PAGE_SIZE,
};
use crate::domain::ports::{PageFetcher, SharedStatusSink};
use crate::shared::types::{PaginatedResponse, PaginationError};
use crate::shared::utills::{debounce, retry_with_backoff, Debounced, RetryConfig};

use super::state::PaginationState;

/// Default quiet period before a page/size change triggers a load.
pub const DEFAULT_FETCH_DEBOUNCE: Duration = Duration::from_millis(100);

/// Construction parameters of a [`PaginationEngine`].
#[derive(Clone)]
pub struct EngineOptions {
    /// Label used in logs, metrics and status events
    pub name: String,
    pub initial_page: u32,
    pub initial_page_size: u32,
    pub retry: RetryConfig,
    pub debounce: Duration,
    /// Restrict page sizes; `None` accepts any positive size
    pub allowed_page_sizes: Option<Vec<u32>>,
    pub status_sink: Option<SharedStatusSink>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            name: "list".to_string(),
            initial_page: DEFAULT_PAGE,
            initial_page_size: DEFAULT_PAGE_SIZE,
            retry: RetryConfig::default(),
            debounce: DEFAULT_FETCH_DEBOUNCE,
            allowed_page_sizes: None,
            status_sink: None,
        }
    }
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("name", &self.name)
            .field("initial_page", &self.initial_page)
            .field("initial_page_size", &self.initial_page_size)
            .field("retry", &self.retry)
            .field("debounce", &self.debounce)
            .field("allowed_page_sizes", &self.allowed_page_sizes)
            .field("status_sink", &self.status_sink.is_some())
            .finish()
    }
}

/// Stateful controller for one paginated list.
///
/// `T` is the item type, `A` the extra arguments forwarded to the fetcher
/// on every call. Must be created inside a Tokio runtime; the first page
/// load starts immediately. Dropping the engine cancels pending loads.
pub struct PaginationEngine<T, A = ()> {
    inner: Arc<EngineInner<T, A>>,
}

struct EngineInner<T, A> {
    name: String,
    fetcher: Arc<dyn PageFetcher<T, A>>,
    args: Mutex<A>,
    initial_page: u32,
    initial_page_size: u32,
    retry: RetryConfig,
    allowed_page_sizes: Option<Vec<u32>>,
    sink: Option<SharedStatusSink>,
    state: watch::Sender<PaginationState<T>>,
    /// Bumped by `reset` and by `set_position` mid-flight; completions of
    /// older cycles are discarded
    generation: AtomicU64,
    /// Spawned cycles that have not finished yet
    running: AtomicUsize,
    closed: AtomicBool,
    trigger: Debounced<()>,
}

impl<T, A> PaginationEngine<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    pub fn new<F>(fetcher: F, args: A, options: EngineOptions) -> Self
    where
        F: PageFetcher<T, A> + 'static,
    {
        let initial_page = options.initial_page.max(1);
        let initial_page_size = match &options.allowed_page_sizes {
            Some(allowed) => validate_page_size(options.initial_page_size, allowed),
            None => options.initial_page_size.max(1),
        };
        let (state, _) = watch::channel(PaginationState::new(initial_page, initial_page_size));

        let inner = Arc::new_cyclic(|weak: &Weak<EngineInner<T, A>>| {
            let weak = weak.clone();
            let trigger = debounce(
                move |()| {
                    if let Some(inner) = weak.upgrade() {
                        inner.spawn_cycle();
                    }
                },
                options.debounce,
            );

            EngineInner {
                name: options.name,
                fetcher: Arc::new(fetcher),
                args: Mutex::new(args),
                initial_page,
                initial_page_size,
                retry: options.retry,
                allowed_page_sizes: options.allowed_page_sizes,
                sink: options.status_sink,
                state,
                generation: AtomicU64::new(0),
                running: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                trigger,
            }
        });

        debug!(list = %inner.name, initial_page, initial_page_size, "Pagination engine created");
        inner.spawn_cycle();

        Self { inner }
    }

    // ── Read surface ──────────────────────────────────────────

    /// Snapshot of the whole state.
    pub fn state(&self) -> PaginationState<T> {
        self.inner.state.borrow().clone()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<PaginationState<T>> {
        self.inner.state.subscribe()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn current_page(&self) -> u32 {
        self.inner.state.borrow().current_page
    }

    pub fn page_size(&self) -> u32 {
        self.inner.state.borrow().page_size
    }

    pub fn total_items(&self) -> u64 {
        self.inner.state.borrow().total_items
    }

    pub fn total_pages(&self) -> u32 {
        self.inner.state.borrow().total_pages()
    }

    pub fn items(&self) -> Vec<T> {
        self.inner.state.borrow().items.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn attempts(&self) -> u32 {
        self.inner.state.borrow().attempts
    }

    pub fn last_error(&self) -> Option<PaginationError> {
        self.inner.state.borrow().last_error.clone()
    }

    pub fn item_range(&self) -> ItemRange {
        self.inner.state.borrow().item_range()
    }

    pub fn page_numbers(&self, max_visible: u32) -> Vec<u32> {
        self.inner.state.borrow().page_numbers(max_visible)
    }

    pub fn has_next_page(&self) -> bool {
        self.inner.state.borrow().has_next_page()
    }

    pub fn has_previous_page(&self) -> bool {
        self.inner.state.borrow().has_previous_page()
    }

    // ── Commands ──────────────────────────────────────────────

    /// Navigate to `page`. Ignored while loading or when already there.
    pub fn go_to_page(&self, page: u32) {
        let changed = self.inner.state.send_if_modified(|s| {
            if s.loading || page == s.current_page {
                return false;
            }
            let target = validate_page_number(page, s.total_pages().max(1));
            if target == s.current_page {
                return false;
            }
            s.current_page = target;
            true
        });

        if changed {
            debug!(list = %self.inner.name, page, "Page changed");
            self.inner.schedule();
        }
    }

    pub fn next_page(&self) {
        let (has_next, page) = {
            let s = self.inner.state.borrow();
            (s.has_next_page(), s.current_page)
        };
        if has_next {
            self.go_to_page(page + 1);
        }
    }

    pub fn previous_page(&self) {
        let page = self.current_page();
        if page > 1 {
            self.go_to_page(page - 1);
        }
    }

    /// Switch page size, keeping the first visible item on screen.
    /// Ignored while loading or when the size does not change.
    pub fn change_page_size(&self, size: u32) {
        let Some(size) = self.inner.accept_page_size(size) else {
            return;
        };

        let changed = self.inner.state.send_if_modified(|s| {
            if s.loading || size == s.page_size {
                return false;
            }
            s.current_page = page_for_new_size(s.current_page, s.page_size, size);
            s.page_size = size;
            true
        });

        if changed {
            debug!(list = %self.inner.name, page_size = size, "Page size changed");
            self.inner.schedule();
        }
    }

    /// Move to `page`/`size` on behalf of an external owner of the
    /// position, such as the URL. Applied even while loading: the running
    /// load is superseded and its result discarded, and the new position
    /// is loaded once it finishes.
    pub fn set_position(&self, page: u32, size: u32) {
        let Some(size) = self.inner.accept_page_size(size) else {
            return;
        };
        let page = page.max(1);

        let mut in_flight = false;
        let changed = self.inner.state.send_if_modified(|s| {
            if s.current_page == page && s.page_size == size {
                return false;
            }
            in_flight = s.loading;
            s.current_page = page;
            s.page_size = size;
            true
        });

        if changed {
            if in_flight {
                self.inner.generation.fetch_add(1, Ordering::SeqCst);
                debug!(
                    list = %self.inner.name,
                    page,
                    page_size = size,
                    "Position set, running load superseded"
                );
            } else {
                debug!(list = %self.inner.name, page, page_size = size, "Position set");
            }
            self.inner.schedule();
        }
    }

    /// Reload the current page now.
    pub fn refresh(&self) {
        self.inner.trigger.cancel();
        self.inner.spawn_cycle();
    }

    /// Replace the forwarded fetch arguments, then reload.
    pub fn refresh_with(&self, args: A) {
        *self.inner.args.lock().unwrap_or_else(PoisonError::into_inner) = args;
        self.refresh();
    }

    /// Clear diagnostics and reload, for "try again" buttons.
    pub fn retry(&self) {
        self.inner.state.send_modify(|s| {
            s.attempts = 0;
            s.last_error = None;
            s.error = None;
        });
        self.inner.publish_error(None);
        self.refresh();
    }

    /// Back to the initial page and size with no data. A running cycle is
    /// left to finish but its result is discarded.
    pub fn reset(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let (page, size) = (self.inner.initial_page, self.inner.initial_page_size);

        self.inner.state.send_modify(|s| {
            s.current_page = page;
            s.page_size = size;
            s.items.clear();
            s.total_items = 0;
            s.error = None;
            s.last_error = None;
            s.attempts = 0;
        });

        info!(list = %self.inner.name, "Pagination reset");
        self.inner.publish_error(None);
        self.inner.schedule();
    }

    /// Resolve once no load is running or scheduled.
    pub async fn settled(&self) {
        let mut rx = self.inner.state.subscribe();
        let poll = self.inner.trigger.wait().max(Duration::from_millis(1));
        loop {
            let loading = rx.borrow_and_update().loading;
            if !loading && !self.inner.is_busy() {
                return;
            }
            tokio::select! {
                _ = rx.changed() => {}
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }
}

impl<T, A> Drop for PaginationEngine<T, A> {
    fn drop(&mut self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.trigger.cancel();
    }
}

impl<T, A> fmt::Debug for PaginationEngine<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("PaginationEngine")
            .field("name", &self.inner.name)
            .field("current_page", &state.current_page)
            .field("page_size", &state.page_size)
            .field("total_items", &state.total_items)
            .field("loading", &state.loading)
            .field("error", &state.error)
            .finish()
    }
}

impl<T, A> EngineInner<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    fn accept_page_size(&self, size: u32) -> Option<u32> {
        match &self.allowed_page_sizes {
            Some(allowed) => Some(validate_page_size(size, allowed)),
            None if size > 0 => Some(size),
            None => None,
        }
    }

    fn is_busy(&self) -> bool {
        self.running.load(Ordering::SeqCst) > 0 || self.trigger.is_pending()
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    /// Debounced reaction to a page/size change.
    fn schedule(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        self.trigger.call(());
    }

    fn spawn_cycle(self: &Arc<Self>) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(list = %self.name, "No Tokio runtime, page load skipped");
                return;
            }
        };

        self.running.fetch_add(1, Ordering::SeqCst);
        let inner = self.clone();
        handle.spawn(async move {
            inner.run_cycle().await;
            inner.running.fetch_sub(1, Ordering::SeqCst);
        });
    }

    async fn run_cycle(&self) {
        let started = self.state.send_if_modified(|s| {
            if s.loading {
                return false;
            }
            s.loading = true;
            s.error = None;
            s.last_error = None;
            s.attempts = 0;
            true
        });
        if !started {
            debug!(list = %self.name, "Fetch already in flight, trigger ignored");
            return;
        }
        self.publish_loading(true);

        let generation = self.generation.load(Ordering::SeqCst);
        let (page, page_size, total_pages) = {
            let s = self.state.borrow();
            (s.current_page, s.page_size, s.total_pages())
        };

        let valid_page = validate_page_number(page, total_pages);
        if valid_page != page {
            debug!(list = %self.name, page, valid_page, "Page out of range, correcting");
            self.state.send_modify(|s| {
                s.current_page = valid_page;
                s.loading = false;
            });
            self.publish_loading(false);
            self.schedule();
            return;
        }

        let args = self
            .args
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let result = retry_with_backoff(
            &self.retry,
            |attempt| self.load_page(attempt, page, page_size, args.clone()),
            |_| true,
            |_, err| self.record_failure(err, generation),
            &self.name,
        )
        .await;

        let stale = self.is_stale(generation);
        match result {
            Ok(response) if !stale => self.commit(response),
            Err(err) if !stale => {
                warn!(list = %self.name, page, page_size, error = %err, "Giving up on page load");
                self.state.send_modify(|s| s.loading = false);
            }
            _ => {
                debug!(list = %self.name, generation, "Discarding stale page load");
                self.state.send_modify(|s| s.loading = false);
            }
        }
        self.publish_loading(false);

        // Position moved while in flight (set_position, clamp or reset)
        let moved = self.state.borrow().position() != (page, page_size);
        if moved || stale {
            self.schedule();
        }
    }

    async fn load_page(
        &self,
        attempt: u32,
        page: u32,
        page_size: u32,
        args: A,
    ) -> Result<PaginatedResponse<T>, PaginationError> {
        self.state.send_modify(|s| s.attempts = attempt);
        metrics::counter!("pagination_fetch_attempts_total", "list" => self.name.clone())
            .increment(1);

        let started = Instant::now();
        let result = self.fetcher.fetch(page, page_size, args).await;
        metrics::histogram!("pagination_fetch_duration_seconds", "list" => self.name.clone())
            .record(started.elapsed().as_secs_f64());

        result.map_err(PaginationError::from)?.into_response()
    }

    fn record_failure(&self, err: &PaginationError, generation: u64) {
        metrics::counter!("pagination_fetch_failures_total", "list" => self.name.clone())
            .increment(1);
        if self.is_stale(generation) {
            return;
        }

        let message = err.to_string();
        self.state.send_modify(|s| {
            s.error = Some(message.clone());
            s.last_error = Some(err.clone());
            s.items.clear();
            s.total_items = 0;
        });
        self.publish_error(Some(&message));
    }

    fn commit(&self, response: PaginatedResponse<T>) {
        let PaginatedResponse { data, pagination } = response;
        let mut cleared_error = false;
        let mut clamped = None;

        self.state.send_modify(|s| {
            s.items = data;
            s.total_items = pagination.total_items;
            cleared_error = s.error.take().is_some();
            s.last_error = None;
            s.loading = false;

            let total_pages = s.total_pages();
            if total_pages > 0 && s.current_page > total_pages {
                clamped = Some((s.current_page, total_pages));
                s.current_page = total_pages;
            }
        });

        if cleared_error {
            self.publish_error(None);
        }
        if let Some((from, to)) = clamped {
            debug!(list = %self.name, from, to, "Collection shrank, clamping page");
        }
    }

    fn publish_loading(&self, loading: bool) {
        if let Some(sink) = &self.sink {
            sink.loading_changed(loading);
        }
    }

    fn publish_error(&self, error: Option<&str>) {
        if let Some(sink) = &self.sink {
            sink.error_changed(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::item::{Category, Item};
    use crate::domain::ports::StatusSink;
    use crate::infrastructure::catalog::{
        CallLog, CatalogFetcher, CatalogQuery, FailureMode, FlakyFetcher, InMemoryCatalog,
    };
    use crate::shared::types::{FetchError, PageEnvelope};

    type CatalogEngine = PaginationEngine<Item, CatalogQuery>;

    fn engine_with(
        catalog: Arc<InMemoryCatalog>,
        mode: FailureMode,
        latency: Duration,
        options: EngineOptions,
    ) -> (CatalogEngine, CallLog) {
        let fetcher =
            FlakyFetcher::new(CatalogFetcher::new(catalog), mode).with_latency(latency);
        let log = fetcher.call_log();
        (PaginationEngine::new(fetcher, CatalogQuery::default(), options), log)
    }

    fn engine(count: usize, mode: FailureMode, options: EngineOptions) -> (CatalogEngine, CallLog) {
        engine_with(
            Arc::new(InMemoryCatalog::seeded(count)),
            mode,
            Duration::ZERO,
            options,
        )
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl StatusSink for RecordingSink {
        fn loading_changed(&self, loading: bool) {
            self.events.lock().unwrap().push(format!("loading:{loading}"));
        }

        fn error_changed(&self, error: Option<&str>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error:{}", error.unwrap_or("none")));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn initial_load_fills_first_page() {
        let (engine, log) = engine(47, FailureMode::Never, EngineOptions::default());
        engine.settled().await;

        assert_eq!(engine.items().len(), 20);
        assert_eq!(engine.total_items(), 47);
        assert_eq!(engine.total_pages(), 3);
        assert!(!engine.loading());
        assert!(engine.error().is_none());
        assert_eq!(engine.attempts(), 1);
        assert_eq!(log.calls(), vec![(1, 20)]);
    }

    #[tokio::test(start_paused = true)]
    async fn go_to_current_page_does_not_fetch() {
        let (engine, log) = engine(47, FailureMode::Never, EngineOptions::default());
        engine.settled().await;

        engine.go_to_page(1);
        engine.settled().await;

        assert_eq!(engine.current_page(), 1);
        assert_eq!(log.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_navigation_coalesces_into_one_fetch() {
        let (engine, log) = engine(47, FailureMode::Never, EngineOptions::default());
        engine.settled().await;

        engine.go_to_page(2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.go_to_page(3);
        engine.settled().await;

        assert_eq!(log.calls(), vec![(1, 20), (3, 20)]);
        assert_eq!(engine.current_page(), 3);
        assert_eq!(engine.items().len(), 7);
        assert_eq!(
            engine.item_range(),
            ItemRange {
                start: 41,
                end: 47,
                showing: 7
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fails_twice_then_succeeds() {
        let (engine, log) = engine(47, FailureMode::FirstN(2), EngineOptions::default());
        engine.settled().await;

        assert_eq!(log.count(), 3);
        assert!(engine.error().is_none());
        assert!(engine.last_error().is_none());
        assert_eq!(engine.items().len(), 20);
        assert_eq!(engine.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_back_off_exponentially() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let fetcher = move |page: u32, size: u32, (): ()| {
            let calls = recorded.clone();
            async move {
                let attempt = {
                    let mut calls = calls.lock().unwrap();
                    calls.push(tokio::time::Instant::now());
                    calls.len()
                };
                if attempt <= 2 {
                    return Err::<PageEnvelope<u32>, FetchError>("service unavailable".into());
                }
                Ok(PageEnvelope::from(PaginatedResponse::new(
                    vec![page],
                    page,
                    size,
                    47,
                )))
            }
        };
        let engine = PaginationEngine::new(fetcher, (), EngineOptions::default());
        engine.settled().await;

        let calls = calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_millis(300));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(600));
        assert_eq!(engine.attempts(), 3);
        assert_eq!(engine.items(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_error() {
        let (engine, log) = engine(47, FailureMode::Always, EngineOptions::default());
        engine.settled().await;

        assert_eq!(log.count(), 3);
        assert!(!engine.loading());
        assert_eq!(
            engine.error().as_deref(),
            Some("Failed to load page: catalog service unavailable")
        );
        assert!(engine.items().is_empty());
        assert_eq!(engine.total_items(), 0);

        let last = engine.last_error().expect("last error recorded");
        assert!(last.is_transient());
        assert_eq!(
            last.source_error().map(|e| e.to_string()).as_deref(),
            Some("catalog service unavailable")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_response_is_retried_then_surfaced() {
        let (engine, log) = engine(47, FailureMode::Malformed, EngineOptions::default());
        engine.settled().await;

        assert_eq!(log.count(), 3);
        assert!(engine.items().is_empty());
        assert!(matches!(
            engine.last_error(),
            Some(PaginationError::MalformedResponse {
                missing: "pagination"
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn page_size_change_keeps_first_item_in_view() {
        let options = EngineOptions {
            initial_page: 3,
            initial_page_size: 10,
            ..EngineOptions::default()
        };
        let (engine, log) = engine(100, FailureMode::Never, options);
        engine.settled().await;
        assert_eq!(engine.item_range().start, 21);

        engine.change_page_size(20);
        assert_eq!(engine.current_page(), 2);
        assert_eq!(engine.page_size(), 20);

        engine.settled().await;
        assert_eq!(log.last(), Some((2, 20)));
        assert!(engine.item_range().start <= 21);
        assert_eq!(engine.items().len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_initial_page_self_corrects() {
        let options = EngineOptions {
            initial_page: 9,
            ..EngineOptions::default()
        };
        let (engine, log) = engine(47, FailureMode::Never, options);
        engine.settled().await;

        assert_eq!(log.calls(), vec![(9, 20), (3, 20)]);
        assert_eq!(engine.current_page(), 3);
        assert_eq!(engine.items().len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn shrinking_collection_clamps_page() {
        let catalog = Arc::new(InMemoryCatalog::seeded(47));
        let (engine, log) = engine_with(
            catalog.clone(),
            FailureMode::Never,
            Duration::ZERO,
            EngineOptions::default(),
        );
        engine.settled().await;
        engine.go_to_page(3);
        engine.settled().await;

        for item in catalog.query(&CatalogQuery::default()).iter().take(10) {
            catalog.remove(&item.id);
        }
        engine.refresh();
        engine.settled().await;

        assert_eq!(engine.total_items(), 37);
        assert_eq!(engine.current_page(), 2);
        assert_eq!(log.last(), Some((2, 20)));
        assert_eq!(engine.items().len(), 17);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_ignored_while_loading() {
        let (engine, log) = engine_with(
            Arc::new(InMemoryCatalog::seeded(47)),
            FailureMode::Never,
            Duration::from_secs(1),
            EngineOptions::default(),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(engine.loading());

        engine.go_to_page(2);
        engine.change_page_size(50);
        engine.settled().await;

        assert_eq!(engine.current_page(), 1);
        assert_eq!(engine.page_size(), 20);
        assert_eq!(log.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_recovers_after_exhaustion() {
        let (engine, log) = engine(47, FailureMode::FirstN(3), EngineOptions::default());
        engine.settled().await;
        assert_eq!(log.count(), 3);
        assert!(engine.error().is_some());

        engine.retry();
        assert!(engine.error().is_none());
        assert_eq!(engine.attempts(), 0);

        engine.settled().await;
        assert_eq!(log.count(), 4);
        assert!(engine.error().is_none());
        assert_eq!(engine.items().len(), 20);
        assert_eq!(engine.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_initial_position() {
        let (engine, log) = engine(47, FailureMode::Never, EngineOptions::default());
        engine.settled().await;
        engine.go_to_page(3);
        engine.settled().await;

        engine.reset();
        assert_eq!(engine.current_page(), 1);
        assert!(engine.items().is_empty());
        assert_eq!(engine.total_items(), 0);

        engine.settled().await;
        assert_eq!(log.last(), Some((1, 20)));
        assert_eq!(engine.items().len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_completion_after_reset_is_discarded() {
        let (engine, log) = engine_with(
            Arc::new(InMemoryCatalog::seeded(47)),
            FailureMode::Never,
            Duration::from_secs(1),
            EngineOptions::default(),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(engine.loading());

        engine.reset();
        tokio::time::sleep(Duration::from_millis(1040)).await;
        assert!(engine.items().is_empty());
        assert!(!engine.loading());

        engine.settled().await;
        assert_eq!(log.count(), 2);
        assert_eq!(engine.items().len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn position_set_mid_flight_discards_old_page() {
        let (engine, log) = engine_with(
            Arc::new(InMemoryCatalog::seeded(47)),
            FailureMode::Never,
            Duration::from_secs(1),
            EngineOptions::default(),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(engine.loading());

        engine.set_position(3, 20);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        // Page 1 resolved after the move; its rows must not show as page 3
        assert!(!engine.loading());
        assert_eq!(engine.current_page(), 3);
        assert!(engine.items().is_empty());

        engine.settled().await;
        assert_eq!(log.calls(), vec![(1, 20), (3, 20)]);
        assert_eq!(engine.items().len(), 7);
        assert_eq!(engine.item_range().start, 41);
    }

    #[tokio::test(start_paused = true)]
    async fn status_sink_sees_transitions() {
        let sink = Arc::new(RecordingSink::default());
        let options = EngineOptions {
            status_sink: Some(sink.clone()),
            ..EngineOptions::default()
        };
        let (engine, _log) = engine(47, FailureMode::FirstN(1), options);
        engine.settled().await;

        assert_eq!(
            *sink.events.lock().unwrap(),
            vec![
                "loading:true".to_string(),
                "error:Failed to load page: catalog service unavailable".to_string(),
                "error:none".to_string(),
                "loading:false".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_with_forwards_filters() {
        let (engine, _log) = engine(47, FailureMode::Never, EngineOptions::default());
        engine.settled().await;

        engine.refresh_with(CatalogQuery {
            category: Some(Category::Tools),
            search: None,
        });
        engine.settled().await;

        assert_eq!(engine.total_items(), 8);
        assert!(engine
            .items()
            .iter()
            .all(|item| item.category == Category::Tools));
    }

    #[tokio::test(start_paused = true)]
    async fn next_and_previous_respect_bounds() {
        let (engine, log) = engine(47, FailureMode::Never, EngineOptions::default());
        engine.settled().await;

        engine.previous_page();
        engine.settled().await;
        assert_eq!(log.count(), 1);

        engine.next_page();
        engine.settled().await;
        assert_eq!(engine.current_page(), 2);
        assert!(engine.has_previous_page());

        engine.next_page();
        engine.settled().await;
        assert_eq!(engine.current_page(), 3);
        assert!(!engine.has_next_page());

        engine.next_page();
        engine.settled().await;
        assert_eq!(log.count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn disallowed_page_size_falls_back() {
        let options = EngineOptions {
            allowed_page_sizes: Some(vec![10, 20, 50]),
            ..EngineOptions::default()
        };
        let (engine, log) = engine(47, FailureMode::Never, options);
        engine.settled().await;

        engine.change_page_size(33);
        engine.settled().await;

        assert_eq!(engine.page_size(), 10);
        assert_eq!(log.last(), Some((1, 10)));
    }

    #[tokio::test(start_paused = true)]
    async fn closure_fetcher_receives_page_and_size() {
        let fetcher = |page: u32, size: u32, (): ()| async move {
            let data: Vec<u32> = (0..size).map(|i| (page - 1) * size + i).collect();
            Ok::<_, FetchError>(PageEnvelope::from(PaginatedResponse::new(
                data, page, size, 100,
            )))
        };
        let engine = PaginationEngine::new(fetcher, (), EngineOptions::default());
        engine.settled().await;

        engine.go_to_page(2);
        engine.settled().await;
        assert_eq!(engine.items().first(), Some(&20));
        assert_eq!(engine.total_pages(), 5);
    }
}
