//! Fixed-window counters keyed by identity.
//!
//! # Design Decisions
//! - One active window per identity; boundary = first request + window length
//! - Check-then-act runs under the DashMap shard write lock for the key, so
//!   concurrent increments for one identity are linearized (no lost updates)
//! - Expired windows are replaced, never incremented
//! - Memory is bounded by `max_entries` (soft): a periodic sweep drops
//!   expired windows, and a full store evicts the window closest to expiry
//!   among a bounded sample of entries
//! - A full store sweeps on demand at most once per sweep interval, so new
//!   identities arriving at a full store cost O(sample), not O(entries)
//!
//! An evicted identity that comes back starts a fresh window. Under heavy
//! churn this can admit a caller that was over its limit; the store prefers
//! that to denying callers it no longer has evidence against.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;
use crate::observability::metrics;

/// Gap between on-demand sweeps when no interval is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Entries examined when choosing a window to evict from a full store.
pub const EVICTION_SAMPLE: usize = 32;

const NEVER_SWEPT: i64 = i64::MIN;

/// Snapshot of one identity's current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindowEntry {
    pub identity: String,
    pub count: u64,
    pub window_end: DateTime<Utc>,
}

impl RateWindowEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.window_end
    }
}

/// Counts of tracked windows, for the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub tracked: usize,
    pub active: usize,
    pub expired: usize,
}

#[derive(Debug)]
struct WindowState {
    count: u64,
    window_end: DateTime<Utc>,
}

impl WindowState {
    fn fresh(now: DateTime<Utc>, window: TimeDelta) -> Self {
        Self {
            count: 0,
            window_end: now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

/// Shared, cheaply cloneable store of fixed-window counters.
#[derive(Clone)]
pub struct WindowStore {
    inner: Arc<WindowStoreInner>,
}

struct WindowStoreInner {
    window: TimeDelta,
    max_entries: usize,
    sweep_interval: TimeDelta,
    /// Unix millis of the last sweep.
    last_sweep_ms: AtomicI64,
    entries: DashMap<String, WindowState>,
}

impl WindowStore {
    /// Create a store with the given window length and soft entry bound.
    pub fn new(window: Duration, max_entries: usize) -> Self {
        Self::with_sweep_interval(window, max_entries, DEFAULT_SWEEP_INTERVAL)
    }

    /// As [`WindowStore::new`], with the minimum gap between sweeps
    /// triggered by a full store.
    pub fn with_sweep_interval(window: Duration, max_entries: usize, sweep_interval: Duration) -> Self {
        Self {
            inner: Arc::new(WindowStoreInner {
                window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
                max_entries: max_entries.max(1),
                sweep_interval: TimeDelta::from_std(sweep_interval).unwrap_or(TimeDelta::MAX),
                last_sweep_ms: AtomicI64::new(NEVER_SWEPT),
                entries: DashMap::new(),
            }),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::with_sweep_interval(
            Duration::from_millis(config.window_ms),
            config.max_entries,
            Duration::from_secs(config.sweep_interval_secs),
        )
    }

    /// Window length.
    pub fn window(&self) -> TimeDelta {
        self.inner.window
    }

    /// Current window for `identity`, opening an empty one if none is active.
    pub fn get_or_init(&self, identity: &str, now: DateTime<Utc>) -> RateWindowEntry {
        self.update(identity, now, |_| {})
    }

    /// Count one request for `identity` at `now`.
    ///
    /// Opens a fresh window with `count = 1` when none exists or the current
    /// one has ended; otherwise increments in place.
    pub fn increment(&self, identity: &str, now: DateTime<Utc>) -> RateWindowEntry {
        self.update(identity, now, |state| {
            state.count = state.count.saturating_add(1);
        })
    }

    fn update<F>(&self, identity: &str, now: DateTime<Utc>, apply: F) -> RateWindowEntry
    where
        F: FnOnce(&mut WindowState),
    {
        if !self.inner.entries.contains_key(identity) && self.inner.entries.len() >= self.inner.max_entries {
            self.make_room(now);
        }

        let window = self.inner.window;
        let mut entry = self
            .inner
            .entries
            .entry(identity.to_string())
            .or_insert_with(|| WindowState::fresh(now, window));

        let state = entry.value_mut();
        if now >= state.window_end {
            *state = WindowState::fresh(now, window);
        }
        apply(state);

        RateWindowEntry {
            identity: identity.to_string(),
            count: state.count,
            window_end: state.window_end,
        }
    }

    /// Read a window without mutating it.
    pub fn get(&self, identity: &str) -> Option<RateWindowEntry> {
        self.inner.entries.get(identity).map(|state| RateWindowEntry {
            identity: identity.to_string(),
            count: state.count,
            window_end: state.window_end,
        })
    }

    /// Forget an identity. Returns true if it was tracked.
    pub fn reset(&self, identity: &str) -> bool {
        let removed = self.inner.entries.remove(identity).is_some();
        metrics::record_rate_limit_entries(self.inner.entries.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn summary(&self, now: DateTime<Utc>) -> WindowSummary {
        let mut active = 0;
        let mut expired = 0;
        for entry in self.inner.entries.iter() {
            if now >= entry.window_end {
                expired += 1;
            } else {
                active += 1;
            }
        }
        WindowSummary {
            tracked: active + expired,
            active,
            expired,
        }
    }

    /// Drop every window that has ended by `now`. Returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.inner.last_sweep_ms.store(now.timestamp_millis(), Ordering::Release);
        let before = self.inner.entries.len();
        self.inner.entries.retain(|_, state| now < state.window_end);
        let remaining = self.inner.entries.len();
        let removed = before.saturating_sub(remaining);

        if removed > 0 {
            metrics::record_eviction("expired", removed);
        }
        metrics::record_rate_limit_entries(remaining);
        tracing::debug!(removed, remaining, "rate limit sweep complete");
        removed
    }

    fn make_room(&self, now: DateTime<Utc>) {
        if self.claim_sweep(now) && self.sweep(now) > 0 && self.inner.entries.len() < self.inner.max_entries {
            return;
        }

        let oldest = self
            .inner
            .entries
            .iter()
            .take(EVICTION_SAMPLE)
            .min_by_key(|entry| entry.window_end)
            .map(|entry| (entry.key().clone(), entry.window_end));

        if let Some((key, window_end)) = oldest {
            if self
                .inner
                .entries
                .remove_if(&key, |_, state| state.window_end == window_end)
                .is_some()
            {
                tracing::warn!(
                    identity = %key,
                    max_entries = self.inner.max_entries,
                    "rate limit store full, evicted window closest to expiry"
                );
                metrics::record_eviction("capacity", 1);
            }
        }
    }

    /// True if this caller may run an on-demand sweep at `now`. At most one
    /// caller wins per sweep interval.
    fn claim_sweep(&self, now: DateTime<Utc>) -> bool {
        let now_ms = now.timestamp_millis();
        let last = self.inner.last_sweep_ms.load(Ordering::Acquire);
        if last != NEVER_SWEPT && now_ms.saturating_sub(last) < self.inner.sweep_interval.num_milliseconds() {
            return false;
        }
        self.inner
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Spawn a task that sweeps expired windows every `interval` until shutdown.
    pub fn spawn_sweeper(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.sweep(Utc::now());
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("rate limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ms(n: i64) -> TimeDelta {
        TimeDelta::milliseconds(n)
    }

    #[test]
    fn test_counts_within_window() {
        let store = WindowStore::new(Duration::from_millis(1000), 100);
        for n in 1..=5 {
            let entry = store.increment("u1", t0() + ms(n * 10));
            assert_eq!(entry.count, n as u64);
            assert_eq!(entry.window_end, t0() + ms(1010));
        }
    }

    #[test]
    fn test_window_resets_at_boundary() {
        let store = WindowStore::new(Duration::from_millis(1000), 100);
        for _ in 0..7 {
            store.increment("u1", t0());
        }

        // Exactly at window_end counts as a new window.
        let entry = store.increment("u1", t0() + ms(1000));
        assert_eq!(entry.count, 1);
        assert_eq!(entry.window_end, t0() + ms(2000));
    }

    #[test]
    fn test_get_or_init_does_not_count() {
        let store = WindowStore::new(Duration::from_millis(1000), 100);
        let entry = store.get_or_init("u1", t0());
        assert_eq!(entry.count, 0);

        store.increment("u1", t0());
        assert_eq!(store.get_or_init("u1", t0() + ms(1)).count, 1);
        assert_eq!(store.get_or_init("u1", t0() + ms(1000)).count, 0);
    }

    #[test]
    fn test_identities_are_independent() {
        let store = WindowStore::new(Duration::from_millis(1000), 100);
        store.increment("a", t0());
        store.increment("a", t0());
        let b = store.increment("b", t0() + ms(500));

        assert_eq!(b.count, 1);
        assert_eq!(b.window_end, t0() + ms(1500));
        assert_eq!(store.get("a").unwrap().count, 2);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = WindowStore::new(Duration::from_secs(60), 100);
        let now = Utc::now();
        let threads = 8;
        let per_thread = 250;

        std::thread::scope(|scope| {
            for _ in 0..threads {
                let store = store.clone();
                scope.spawn(move || {
                    for _ in 0..per_thread {
                        store.increment("shared", now);
                    }
                });
            }
        });

        assert_eq!(store.get("shared").unwrap().count, (threads * per_thread) as u64);
    }

    #[test]
    fn test_sweep_removes_expired() {
        let store = WindowStore::new(Duration::from_millis(1000), 100);
        store.increment("old", t0());
        store.increment("new", t0() + ms(900));

        assert_eq!(store.sweep(t0() + ms(1000)), 1);
        assert!(store.get("old").is_none());
        assert!(store.get("new").is_some());
    }

    #[test]
    fn test_full_store_sweeps_before_evicting() {
        let store = WindowStore::new(Duration::from_millis(1000), 2);
        store.increment("a", t0());
        store.increment("b", t0() + ms(500));

        store.increment("c", t0() + ms(1200));

        assert!(store.get("a").is_none());
        assert!(store.get("b").is_some());
        assert!(store.get("c").is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_full_store_evicts_closest_to_expiry() {
        let store = WindowStore::new(Duration::from_millis(1000), 2);
        store.increment("a", t0());
        store.increment("b", t0() + ms(100));
        store.increment("b", t0() + ms(150));

        store.increment("c", t0() + ms(200));

        assert!(store.get("a").is_none());
        assert_eq!(store.get("b").unwrap().count, 2);
        assert_eq!(store.get("c").unwrap().count, 1);

        // Evicted identity returns with a fresh window.
        store.increment("a", t0() + ms(300));
        assert_eq!(store.get("a").unwrap().count, 1);
    }

    #[test]
    fn test_full_store_sweeps_at_most_once_per_interval() {
        let store = WindowStore::with_sweep_interval(Duration::from_millis(1000), 2, Duration::from_secs(60));
        store.increment("a", t0());
        store.increment("b", t0());

        // Full, nothing expired: sweeps once, then evicts.
        store.increment("c", t0() + ms(100));
        assert_eq!(store.len(), 2);

        // b and c have expired, but the last sweep was 1.1s ago: evict only.
        store.increment("d", t0() + ms(1200));
        store.increment("e", t0() + ms(1300));
        assert_eq!(store.len(), 2);

        // Interval elapsed: the next new identity sweeps everything expired.
        store.increment("f", t0() + ms(61_000));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("f").unwrap().count, 1);
    }

    #[test]
    fn test_periodic_sweep_defers_on_demand_sweep() {
        let store = WindowStore::with_sweep_interval(Duration::from_millis(1000), 2, Duration::from_secs(60));
        store.increment("a", t0());
        store.increment("b", t0());
        store.sweep(t0() + ms(500));

        store.increment("c", t0() + ms(1500));
        // a and b both expired, yet only one was evicted.
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_summary_and_reset() {
        let store = WindowStore::new(Duration::from_millis(1000), 10);
        store.increment("a", t0());
        store.increment("b", t0() + ms(800));

        let summary = store.summary(t0() + ms(1000));
        assert_eq!(summary, WindowSummary { tracked: 2, active: 1, expired: 1 });

        assert!(store.reset("a"));
        assert!(!store.reset("a"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store = WindowStore::new(Duration::from_millis(10), 10);
        let (tx, rx) = broadcast::channel(1);
        let handle = store.spawn_sweeper(Duration::from_millis(5), rx);

        store.increment("a", Utc::now());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.is_empty());

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
