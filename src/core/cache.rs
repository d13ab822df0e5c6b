//! Keyed get-or-fetch cache with TTL expiry and request coalescing.
//!
//! Each key owns one [`CacheEntry`]. A lookup either returns fresh data,
//! joins the fetch already in flight for that key, or starts a new one.
//! The check/mark-loading/store-future sequence runs without yielding, so
//! two overlapping callers can never both dispatch a request for the same
//! key.
//!
//! Failures never evict data: a failed refresh leaves the previous payload
//! and timestamp in place and records the error next to them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture, Shared};
use log::{debug, info, warn};

use crate::core::clock::Clock;
use crate::core::error::ApiError;

/// A pending fetch shared by every caller that asked while it was running.
pub type SharedFetch<T> = Shared<LocalBoxFuture<'static, Result<T, ApiError>>>;

type EntryMap<K, T> = RefCell<HashMap<K, CacheEntry<T>>>;

// ============================================================================
// CacheEntry
// ============================================================================

/// State for one key.
///
/// `in_flight` is `Some` exactly when `loading` is true.
pub struct CacheEntry<T> {
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    timestamp: Option<u64>,
    in_flight: Option<SharedFetch<T>>,
    /// Invalidated while loading; dropped once the fetch settles.
    invalidated: bool,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            timestamp: None,
            in_flight: None,
            invalidated: false,
        }
    }
}

impl<T: Clone> CacheEntry<T> {
    fn fresh_data(&self, now_ms: u64, ttl_ms: u64) -> Option<T> {
        let timestamp = self.timestamp?;
        if now_ms.saturating_sub(timestamp) < ttl_ms {
            self.data.clone()
        } else {
            None
        }
    }

    fn snapshot(&self) -> EntrySnapshot<T> {
        EntrySnapshot {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            timestamp: self.timestamp,
        }
    }
}

// ============================================================================
// EntrySnapshot
// ============================================================================

/// Read-only copy of an entry for rendering. Never triggers a fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub timestamp: Option<u64>,
}

impl<T> EntrySnapshot<T> {
    pub fn empty() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            timestamp: None,
        }
    }

    /// Milliseconds since the last successful fetch.
    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.timestamp.map(|ts| now_ms.saturating_sub(ts))
    }

    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.data.is_some() && self.age_ms(now_ms).is_some_and(|age| age < ttl_ms)
    }

    /// Last fetch failed and there is nothing to show.
    pub fn is_failed(&self) -> bool {
        self.error.is_some() && self.data.is_none()
    }

    /// Last fetch failed but older data is still available.
    pub fn is_stale(&self) -> bool {
        self.error.is_some() && self.data.is_some()
    }
}

impl<T> Default for EntrySnapshot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// KeyedCache
// ============================================================================

/// Map of keys to cache entries with shared in-flight fetches.
pub struct KeyedCache<K, T> {
    /// Used in log lines only ("category", "search").
    label: &'static str,
    entries: Rc<EntryMap<K, T>>,
    clock: Rc<dyn Clock>,
    ttl_ms: u64,
}

impl<K, T> KeyedCache<K, T>
where
    K: Eq + Hash + Clone + Display + 'static,
    T: Clone + 'static,
{
    pub fn new(label: &'static str, clock: Rc<dyn Clock>, ttl_ms: u64) -> Self {
        Self {
            label,
            entries: Rc::new(RefCell::new(HashMap::new())),
            clock,
            ttl_ms,
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Return cached data for `key`, or fetch it.
    ///
    /// `fetch` is invoked at most once, and only when the entry is neither
    /// fresh nor loading. It must not touch this cache.
    pub fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> LocalBoxFuture<'static, Result<T, ApiError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + 'static,
    {
        let now = self.clock.now_ms();
        let mut entries = self.entries.borrow_mut();
        let entry = entries.entry(key.clone()).or_default();

        if let Some(data) = entry.fresh_data(now, self.ttl_ms) {
            debug!("[cache] hit: {} {}", self.label, key);
            return future::ready(Ok(data)).boxed_local();
        }

        if let Some(in_flight) = &entry.in_flight {
            debug!("[cache] {} {} already loading, sharing request", self.label, key);
            return in_flight.clone().boxed_local();
        }

        info!("[cache] miss: fetching {} {}", self.label, key);
        entry.loading = true;
        entry.error = None;

        let shared = settle(
            self.label,
            Rc::downgrade(&self.entries),
            Rc::clone(&self.clock),
            key,
            fetch(),
        )
        .boxed_local()
        .shared();
        entry.in_flight = Some(shared.clone());

        shared.boxed_local()
    }

    /// Snapshot of `key`; empty if never fetched.
    pub fn peek(&self, key: &K) -> EntrySnapshot<T> {
        self.entries
            .borrow()
            .get(key)
            .map(CacheEntry::snapshot)
            .unwrap_or_default()
    }

    /// Reset `key` so the next lookup goes to the network.
    ///
    /// A fetch already in flight still completes and is delivered to its
    /// callers; the reset is applied when it settles.
    pub fn invalidate(&self, key: &K) {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };

        if entry.loading {
            debug!("[cache] {} {} invalidated while loading, deferring", self.label, key);
            entry.invalidated = true;
        } else {
            debug!("[cache] invalidated {} {}", self.label, key);
            entries.remove(key);
        }
    }

    /// Invalidate every key.
    pub fn clear(&self) {
        debug!("[cache] clearing all {} entries", self.label);
        self.entries.borrow_mut().retain(|_, entry| {
            if entry.loading {
                entry.invalidated = true;
                true
            } else {
                false
            }
        });
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Await the request, then write the outcome back into the entry.
///
/// Holds only a weak handle so a dropped cache does not keep its map alive.
async fn settle<K, T, Fut>(
    label: &'static str,
    entries: Weak<EntryMap<K, T>>,
    clock: Rc<dyn Clock>,
    key: K,
    request: Fut,
) -> Result<T, ApiError>
where
    K: Eq + Hash + Display,
    T: Clone,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let result = request.await;

    let Some(entries) = entries.upgrade() else {
        return result;
    };
    let mut map = entries.borrow_mut();
    let Some(entry) = map.get_mut(&key) else {
        return result;
    };

    entry.loading = false;
    entry.in_flight = None;
    match &result {
        Ok(data) => {
            entry.data = Some(data.clone());
            entry.timestamp = Some(clock.now_ms());
            entry.error = None;
            info!("[cache] stored {} {}", label, key);
        }
        Err(e) => {
            // Previous data and timestamp stay readable
            entry.error = Some(e.to_string());
            warn!("[cache] fetch failed for {} {}: {}", label, key, e);
        }
    }

    if entry.invalidated {
        map.remove(&key);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ManualClock;
    use futures::channel::oneshot;
    use std::cell::Cell;

    const TTL: u64 = 5 * 60 * 1000;

    type Payload = Rc<Vec<u32>>;
    type Fetch = LocalBoxFuture<'static, Result<Payload, ApiError>>;

    fn cache(clock: &ManualClock) -> KeyedCache<&'static str, Payload> {
        KeyedCache::new("test", Rc::new(clock.clone()), TTL)
    }

    /// Fetch that resolves immediately and counts invocations.
    fn counting(calls: Rc<Cell<usize>>, value: Result<Payload, ApiError>) -> impl FnOnce() -> Fetch {
        move || {
            calls.set(calls.get() + 1);
            future::ready(value).boxed_local()
        }
    }

    /// Fetch that resolves when the sender fires.
    fn gated(
        calls: Rc<Cell<usize>>,
        rx: oneshot::Receiver<Result<Payload, ApiError>>,
    ) -> impl FnOnce() -> Fetch {
        move || {
            calls.set(calls.get() + 1);
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(ApiError::Network("sender dropped".into())))
            }
            .boxed_local()
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let clock = ManualClock::new(1_000);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));
        let (tx, rx) = oneshot::channel();

        let first = cache.get_or_fetch("home", gated(calls.clone(), rx));
        let second = cache.get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![9]))));
        let third = cache.get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![9]))));

        assert_eq!(calls.get(), 1);
        assert!(cache.peek(&"home").loading);

        tx.send(Ok(Rc::new(vec![1, 2, 3]))).unwrap();
        let (a, b, c) = futures::join!(first, second, third);
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

        assert_eq!(*a, vec![1, 2, 3]);
        assert!(Rc::ptr_eq(&a, &b));
        assert!(Rc::ptr_eq(&b, &c));

        let snapshot = cache.peek(&"home");
        assert!(!snapshot.loading);
        assert_eq!(snapshot.timestamp, Some(1_000));
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn test_coalesced_callers_share_rejection() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));
        let (tx, rx) = oneshot::channel();

        let first = cache.get_or_fetch("home", gated(calls.clone(), rx));
        let second = cache.get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![]))));

        tx.send(Err(ApiError::Timeout)).unwrap();
        let (a, b) = futures::join!(first, second);

        assert_eq!(calls.get(), 1);
        assert_eq!(a.unwrap_err(), ApiError::Timeout);
        assert_eq!(b.unwrap_err(), ApiError::Timeout);

        let snapshot = cache.peek(&"home");
        assert!(snapshot.is_failed());
        assert_eq!(snapshot.error.as_deref(), Some("Request timed out"));
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_fetch() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));

        let first = cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![1]))))
            .await
            .unwrap();

        clock.advance(TTL - 1);
        let second = cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![2]))))
            .await
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_expired_entry_refetches_once() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));

        cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![1]))))
            .await
            .unwrap();

        clock.advance(TTL);
        let refreshed = cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![2]))))
            .await
            .unwrap();
        let again = cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![3]))))
            .await
            .unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(*refreshed, vec![2]);
        assert!(Rc::ptr_eq(&refreshed, &again));
        assert_eq!(cache.peek(&"home").timestamp, Some(TTL));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_data() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));

        cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![7]))))
            .await
            .unwrap();

        clock.advance(TTL + 1);
        let err = cache
            .get_or_fetch(
                "home",
                counting(calls.clone(), Err(ApiError::Network("offline".into()))),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Network("offline".into()));

        let snapshot = cache.peek(&"home");
        assert_eq!(snapshot.data.as_deref(), Some(&vec![7]));
        assert_eq!(snapshot.timestamp, Some(0));
        assert_eq!(snapshot.error.as_deref(), Some("Network error: offline"));
        assert!(snapshot.is_stale());
        assert!(!snapshot.is_failed());
    }

    #[tokio::test]
    async fn test_error_cleared_when_next_attempt_starts() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));

        let _ = cache
            .get_or_fetch("home", counting(calls.clone(), Err(ApiError::Timeout)))
            .await;
        assert!(cache.peek(&"home").error.is_some());

        let (tx, rx) = oneshot::channel();
        let pending = cache.get_or_fetch("home", gated(calls.clone(), rx));

        let snapshot = cache.peek(&"home");
        assert!(snapshot.loading);
        assert_eq!(snapshot.error, None);

        tx.send(Ok(Rc::new(vec![1]))).unwrap();
        pending.await.unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));

        cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![1]))))
            .await
            .unwrap();

        cache.invalidate(&"home");
        assert_eq!(cache.peek(&"home"), EntrySnapshot::empty());

        let fresh = cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![2]))))
            .await
            .unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(*fresh, vec![2]);
    }

    #[tokio::test]
    async fn test_invalidate_during_flight_is_deferred() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));
        let (tx, rx) = oneshot::channel();

        let first = cache.get_or_fetch("home", gated(calls.clone(), rx));
        cache.invalidate(&"home");

        // Still coalesced onto the original request
        let second = cache.get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![9]))));
        assert_eq!(calls.get(), 1);
        assert!(cache.peek(&"home").loading);

        tx.send(Ok(Rc::new(vec![1]))).unwrap();
        let (a, b) = futures::join!(first, second);
        assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));

        // Reset applied after settlement
        assert_eq!(cache.peek(&"home"), EntrySnapshot::empty());
        cache
            .get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![2]))))
            .await
            .unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_clear_drops_idle_and_defers_loading() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));

        cache
            .get_or_fetch("idle", counting(calls.clone(), Ok(Rc::new(vec![1]))))
            .await
            .unwrap();
        let (tx, rx) = oneshot::channel();
        let pending = cache.get_or_fetch("busy", gated(calls.clone(), rx));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek(&"idle"), EntrySnapshot::empty());
        assert!(cache.peek(&"busy").loading);

        tx.send(Ok(Rc::new(vec![2]))).unwrap();
        assert_eq!(*pending.await.unwrap(), vec![2]);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        let calls = Rc::new(Cell::new(0));

        let (home, top) = futures::join!(
            cache.get_or_fetch("home", counting(calls.clone(), Ok(Rc::new(vec![1])))),
            cache.get_or_fetch("top", counting(calls.clone(), Ok(Rc::new(vec![2])))),
        );
        assert_eq!(calls.get(), 2);
        assert_eq!(*home.unwrap(), vec![1]);
        assert_eq!(*top.unwrap(), vec![2]);

        cache.invalidate(&"home");
        assert!(cache.peek(&"top").data.is_some());
    }

    #[test]
    fn test_peek_never_fetches() {
        let clock = ManualClock::new(0);
        let cache = cache(&clock);
        assert_eq!(cache.peek(&"home"), EntrySnapshot::empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_snapshot_freshness() {
        let snapshot = EntrySnapshot {
            data: Some(1),
            loading: false,
            error: None,
            timestamp: Some(100),
        };
        assert!(snapshot.is_fresh(150, 100));
        assert!(!snapshot.is_fresh(200, 100));
        assert_eq!(snapshot.age_ms(150), Some(50));
        assert!(!EntrySnapshot::<u32>::empty().is_fresh(0, 100));
    }
}
