use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tracing::debug;

use crate::domain::{CacheKey, Record};
use crate::error::PokedexError;

pub type Records = Arc<Vec<Record>>;

type FetchResult = Result<Records, PokedexError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pending,
    Ready,
    Error,
}

#[derive(Debug, Clone)]
pub struct QueryState {
    pub key: CacheKey,
    pub status: QueryStatus,
    pub records: Records,
    /// `records` belong to an earlier key, shown while this one loads.
    pub is_placeholder: bool,
    pub error: Option<PokedexError>,
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

struct CacheEntry {
    status: QueryStatus,
    records: Records,
    previous_records: Records,
    error: Option<PokedexError>,
    in_flight: Option<InFlight>,
}

impl CacheEntry {
    fn pending(previous_records: Records) -> Self {
        Self {
            status: QueryStatus::Pending,
            records: Arc::default(),
            previous_records,
            error: None,
            in_flight: None,
        }
    }

    fn visible(&self) -> (Records, bool) {
        if self.status == QueryStatus::Ready || !self.records.is_empty() {
            (self.records.clone(), false)
        } else {
            (self.previous_records.clone(), true)
        }
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    displayed: Option<CacheKey>,
    next_fetch_id: u64,
}

impl CacheInner {
    fn displayed_records(&self) -> Records {
        self.displayed
            .and_then(|key| self.entries.get(&key))
            .map(|entry| entry.visible().0)
            .unwrap_or_default()
    }
}

/// Session-wide memo of fetch results keyed by [`CacheKey`].
///
/// One producer runs per key at a time; concurrent callers join it. A
/// completed fetch only ever writes its own key's slot, so a response for a
/// key the user already navigated away from cannot replace what is displayed.
/// Entries are never evicted.
#[derive(Default)]
pub struct QueryCache {
    inner: Mutex<CacheInner>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as displayed, runs or joins its fetch and returns the
    /// resulting state. Ready entries are served without calling `producer`;
    /// entries in error are produced again.
    pub async fn query<F, Fut>(&self, key: CacheKey, producer: F) -> QueryState
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Record>, PokedexError>> + Send + 'static,
    {
        if let Some((id, fetch)) = self.start(key, producer) {
            let result = fetch.await;
            self.complete(key, id, result);
        }
        self.snapshot(key)
    }

    /// Current state for `key` without waiting. Pending keys expose the
    /// previously displayed records as a placeholder.
    pub fn snapshot(&self, key: CacheKey) -> QueryState {
        let inner = self.lock();
        let Some(entry) = inner.entries.get(&key) else {
            return QueryState {
                key,
                status: QueryStatus::Pending,
                records: inner.displayed_records(),
                is_placeholder: true,
                error: None,
            };
        };
        let (records, is_placeholder) = entry.visible();
        QueryState {
            key,
            status: entry.status,
            records,
            is_placeholder,
            error: entry.error.clone(),
        }
    }

    /// Forces the next query for `key` to refetch; current records stay
    /// visible until the new result lands.
    pub fn invalidate(&self, key: CacheKey) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get_mut(&key)
            && entry.in_flight.is_none()
        {
            entry.status = QueryStatus::Pending;
            entry.error = None;
        }
    }

    pub fn displayed(&self) -> Option<CacheKey> {
        self.lock().displayed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn start<F, Fut>(&self, key: CacheKey, producer: F) -> Option<(u64, SharedFetch)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Record>, PokedexError>> + Send + 'static,
    {
        let mut inner = self.lock();
        let placeholder = if inner.displayed == Some(key) {
            Records::default()
        } else {
            inner.displayed_records()
        };
        inner.displayed = Some(key);

        if let Some(entry) = inner.entries.get(&key) {
            if entry.status == QueryStatus::Ready {
                debug!(%key, "cache.hit");
                return None;
            }
            if let Some(flight) = &entry.in_flight {
                debug!(%key, "cache.join");
                return Some((flight.id, flight.fetch.clone()));
            }
        }

        let id = inner.next_fetch_id;
        inner.next_fetch_id += 1;
        debug!(%key, id, "cache.fetch");
        let fetch = producer()
            .map(|result| result.map(Arc::new))
            .boxed()
            .shared();

        let entry = inner
            .entries
            .entry(key)
            .or_insert_with(|| CacheEntry::pending(placeholder.clone()));
        entry.status = QueryStatus::Pending;
        entry.error = None;
        if entry.records.is_empty() && !placeholder.is_empty() {
            entry.previous_records = placeholder;
        }
        entry.in_flight = Some(InFlight {
            id,
            fetch: fetch.clone(),
        });
        Some((id, fetch))
    }

    fn complete(&self, key: CacheKey, id: u64, result: FetchResult) {
        let mut inner = self.lock();
        let superseded = inner.displayed != Some(key);
        let Some(entry) = inner.entries.get_mut(&key) else {
            return;
        };
        // Every joined caller completes the same fetch; only the first one writes.
        if entry.in_flight.as_ref().map(|flight| flight.id) != Some(id) {
            return;
        }
        entry.in_flight = None;
        match result {
            Ok(records) => {
                entry.status = QueryStatus::Ready;
                entry.records = records;
                entry.previous_records = Records::default();
                entry.error = None;
            }
            Err(err) => {
                debug!(%key, error = %err, "cache.error");
                entry.status = QueryStatus::Error;
                entry.error = Some(err);
            }
        }
        if superseded {
            debug!(%key, "cache.superseded");
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
