//! Page/size mirrored into the query string of a [`Location`]
//!
//! Local state changes first so the UI stays responsive; the URL write is
//! debounced so bursts of navigation collapse into one `replace`. Location
//! changes (back/forward, links) flow the other way through `sync_from_url`,
//! also while a write is still pending. Two guard flags keep the directions
//! from feeding each other. Notifications of this list's own writes, and
//! changes that leave this list's keys alone, are skipped.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::pagination::{
    generate_url_pagination_params, page_for_new_size, page_key, page_size_key,
    parse_url_pagination_params, to_query_map, validate_page_number, validate_page_size, QueryMap,
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZES,
};
use crate::domain::ports::{Location, LocationChange};
use crate::shared::utills::{debounce, Debounced};

/// Default quiet period before local changes are written to the URL.
pub const DEFAULT_URL_DEBOUNCE: Duration = Duration::from_millis(100);

/// Own writes remembered until their notification comes back.
const MAX_OWN_WRITES: usize = 16;

#[derive(Debug, Clone)]
pub struct UrlSyncOptions {
    /// Namespace for the query keys, for several lists on one page
    pub prefix: Option<String>,
    /// Size used when the URL carries none
    pub default_page_size: u32,
    pub allowed_page_sizes: Vec<u32>,
    pub debounce: Duration,
    /// Keep query keys that do not belong to this list
    pub preserve_query: bool,
}

impl Default for UrlSyncOptions {
    fn default() -> Self {
        Self {
            prefix: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            allowed_page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
            debounce: DEFAULT_URL_DEBOUNCE,
            preserve_query: true,
        }
    }
}

/// Page and size held by a [`UrlPagination`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlPosition {
    pub current_page: u32,
    pub page_size: u32,
}

/// URL-synchronized page/size pair.
///
/// Must be created inside a Tokio runtime to follow location changes.
/// Dropping it unsubscribes from the location and discards a pending write.
pub struct UrlPagination {
    pub(super) inner: Arc<UrlInner>,
    listener: Option<JoinHandle<()>>,
}

pub(super) struct UrlInner {
    location: Arc<dyn Location>,
    options: UrlSyncOptions,
    state: watch::Sender<UrlPosition>,
    /// Set while location changes are being applied to local state
    updating_from_url: AtomicBool,
    /// Set while this list replaces the location
    updating_url: AtomicBool,
    /// Entries written by this list whose notification has not arrived yet
    own_writes: Mutex<VecDeque<LocationChange>>,
    /// This list's keys as last seen in the location
    observed: Mutex<QueryMap>,
    writer: Debounced<()>,
}

impl UrlPagination {
    pub fn new(location: Arc<dyn Location>, options: UrlSyncOptions) -> Self {
        let default_page_size = if options.allowed_page_sizes.is_empty() {
            options.default_page_size.max(1)
        } else {
            validate_page_size(options.default_page_size, &options.allowed_page_sizes)
        };
        let (state, _) = watch::channel(UrlPosition {
            current_page: DEFAULT_PAGE,
            page_size: default_page_size,
        });

        let inner = Arc::new_cyclic(|weak: &Weak<UrlInner>| {
            let weak = weak.clone();
            let writer = debounce(
                move |()| {
                    if let Some(inner) = weak.upgrade() {
                        inner.write_url();
                    }
                },
                options.debounce,
            );
            UrlInner {
                location,
                options: UrlSyncOptions {
                    default_page_size,
                    ..options
                },
                state,
                updating_from_url: AtomicBool::new(false),
                updating_url: AtomicBool::new(false),
                own_writes: Mutex::new(VecDeque::new()),
                observed: Mutex::new(QueryMap::new()),
                writer,
            }
        });

        // Subscribe before the first read so no change slips in between
        let mut subscription = inner.location.subscribe();
        inner.sync_from_url();

        let listener = match Handle::try_current() {
            Ok(handle) => {
                let weak = Arc::downgrade(&inner);
                Some(handle.spawn(async move {
                    while let Some(change) = subscription.changed().await {
                        let Some(inner) = weak.upgrade() else {
                            break;
                        };
                        if inner.take_own_write(&change) || !inner.keys_moved(&change.query) {
                            continue;
                        }
                        inner.sync_from_url();
                    }
                }))
            }
            Err(_) => {
                warn!("No Tokio runtime, location changes will not be followed");
                None
            }
        };

        Self { inner, listener }
    }

    pub fn current_page(&self) -> u32 {
        self.inner.position().current_page
    }

    pub fn page_size(&self) -> u32 {
        self.inner.position().page_size
    }

    pub fn position(&self) -> UrlPosition {
        self.inner.position()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.inner.options.prefix.as_deref()
    }

    pub fn subscribe(&self) -> watch::Receiver<UrlPosition> {
        self.inner.state.subscribe()
    }

    pub fn go_to_page(&self, page: u32) {
        self.inner.go_to_page(page);
    }

    /// Switch page size, keeping the first visible item on screen.
    pub fn change_page_size(&self, size: u32) {
        self.inner.change_page_size(size);
    }

    /// Set page and, optionally, size in one step. The page is taken as
    /// given, not recomputed for the new size.
    pub fn update_pagination(&self, page: u32, page_size: Option<u32>) {
        self.inner.update_pagination(page, page_size);
    }

    /// Back to page 1 and the default size.
    pub fn reset(&self) {
        self.inner.reset();
    }

    /// The query keys this list writes for its current position, for
    /// building links by hand.
    pub fn get_url_params(&self) -> BTreeMap<String, String> {
        self.inner.url_params(self.inner.position())
    }

    /// Re-read page and size from the location.
    pub fn sync_from_url(&self) {
        self.inner.sync_from_url();
    }
}

impl Drop for UrlPagination {
    fn drop(&mut self) {
        self.inner.writer.cancel();
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

impl fmt::Debug for UrlPagination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlPagination")
            .field("prefix", &self.inner.options.prefix)
            .field("position", &self.inner.position())
            .finish()
    }
}

impl UrlInner {
    pub(super) fn position(&self) -> UrlPosition {
        *self.state.borrow()
    }

    fn prefix(&self) -> Option<&str> {
        self.options.prefix.as_deref()
    }

    fn accept_page_size(&self, size: u32) -> Option<u32> {
        if self.options.allowed_page_sizes.is_empty() {
            return (size > 0).then_some(size);
        }
        Some(validate_page_size(size, &self.options.allowed_page_sizes))
    }

    fn go_to_page(&self, page: u32) {
        let page = validate_page_number(page, u32::MAX);
        self.apply(|position| position.current_page = page);
    }

    fn change_page_size(&self, size: u32) {
        let Some(size) = self.accept_page_size(size) else {
            return;
        };
        self.apply(|position| {
            if position.page_size != size {
                position.current_page =
                    page_for_new_size(position.current_page, position.page_size, size);
                position.page_size = size;
            }
        });
    }

    pub(super) fn update_pagination(&self, page: u32, page_size: Option<u32>) {
        let page = validate_page_number(page, u32::MAX);
        let page_size = match page_size {
            Some(size) => match self.accept_page_size(size) {
                Some(size) => Some(size),
                None => return,
            },
            None => None,
        };
        self.apply(|position| {
            position.current_page = page;
            if let Some(size) = page_size {
                position.page_size = size;
            }
        });
    }

    fn reset(&self) {
        let defaults = UrlPosition {
            current_page: DEFAULT_PAGE,
            page_size: self.options.default_page_size,
        };
        self.state.send_if_modified(|position| {
            let changed = *position != defaults;
            *position = defaults;
            changed
        });
        debug!(prefix = ?self.prefix(), "URL pagination reset");
        self.schedule_write();
    }

    /// Apply a local change; schedule a URL write if anything moved.
    fn apply(&self, update: impl FnOnce(&mut UrlPosition)) {
        let changed = self.state.send_if_modified(|position| {
            let before = *position;
            update(position);
            *position != before
        });
        if changed {
            self.schedule_write();
        }
    }

    fn schedule_write(&self) {
        self.writer.call(());
    }

    /// Whether `change` is the notification of one of this list's own
    /// writes. Matching writes, and any older ones, are forgotten.
    fn take_own_write(&self, change: &LocationChange) -> bool {
        let mut own = self.own_writes.lock().unwrap_or_else(PoisonError::into_inner);
        match own.iter().position(|written| written == change) {
            Some(index) => {
                own.drain(..=index);
                true
            }
            None => false,
        }
    }

    fn own_keys(&self, query: &QueryMap) -> QueryMap {
        let prefix = self.prefix();
        [page_key(prefix), page_size_key(prefix)]
            .into_iter()
            .filter_map(|key| query.get(&key).cloned().map(|value| (key, value)))
            .collect()
    }

    /// Record this list's keys in `query`; true if they differ from the
    /// last ones seen.
    fn keys_moved(&self, query: &QueryMap) -> bool {
        let keys = self.own_keys(query);
        let mut observed = self.observed.lock().unwrap_or_else(PoisonError::into_inner);
        if *observed == keys {
            return false;
        }
        *observed = keys;
        true
    }

    fn remember_own_write(&self, change: LocationChange) {
        let mut own = self.own_writes.lock().unwrap_or_else(PoisonError::into_inner);
        if own.len() == MAX_OWN_WRITES {
            own.pop_front();
        }
        own.push_back(change);
    }

    fn url_params(&self, position: UrlPosition) -> BTreeMap<String, String> {
        let prefix = self.prefix();
        let mut params =
            generate_url_pagination_params(position.current_page, position.page_size, prefix);

        // Sizes are omitted relative to this list's default, not the global one
        let size_key = page_size_key(prefix);
        if position.page_size == self.options.default_page_size {
            params.remove(&size_key);
        } else {
            params.insert(size_key, position.page_size.to_string());
        }
        params
    }

    fn write_url(&self) {
        if self.updating_from_url.load(Ordering::SeqCst) {
            debug!(prefix = ?self.prefix(), "Sync from URL in progress, URL write deferred");
            self.writer.call(());
            return;
        }

        let prefix = self.prefix();
        let mut query = if self.options.preserve_query {
            self.location.query()
        } else {
            QueryMap::new()
        };
        query.remove(&page_key(prefix));
        query.remove(&page_size_key(prefix));
        query.extend(to_query_map(self.url_params(self.position())));

        let path = self.location.path();
        self.keys_moved(&query);
        self.remember_own_write(LocationChange {
            path: path.clone(),
            query: query.clone(),
        });
        self.updating_url.store(true, Ordering::SeqCst);
        self.location.replace(&path, query);
        self.updating_url.store(false, Ordering::SeqCst);
        debug!(prefix = ?prefix, path = %path, "URL updated");
    }

    fn sync_from_url(&self) {
        if self.updating_url.load(Ordering::SeqCst) {
            debug!(prefix = ?self.prefix(), "Location change ignored, URL write in progress");
            return;
        }
        self.updating_from_url.store(true, Ordering::SeqCst);

        let prefix = self.prefix();
        let query = self.location.query();
        self.keys_moved(&query);
        let parsed = parse_url_pagination_params(&query, prefix);
        let page = validate_page_number(parsed.page, u32::MAX);
        let page_size = if query.contains_key(&page_size_key(prefix)) {
            self.accept_page_size(parsed.page_size)
                .unwrap_or(self.options.default_page_size)
        } else {
            self.options.default_page_size
        };

        let target = UrlPosition {
            current_page: page,
            page_size,
        };
        let changed = self.state.send_if_modified(|position| {
            if *position == target {
                return false;
            }
            *position = target;
            true
        });
        if changed {
            debug!(prefix = ?prefix, page, page_size, "Position synced from URL");
        }

        self.updating_from_url.store(false, Ordering::SeqCst);
    }
}
