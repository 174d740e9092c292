//! Per-client fixed-window request counting.
//!
//! Windows are wall-clock minutes (`unix_seconds / 60`). A burst that straddles a
//! window boundary may therefore be admitted up to twice the nominal limit.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

/// Length of one rate-limit window in seconds.
const WINDOW_SECS: u64 = 60;

/// Returns the index of the current one-minute window.
pub fn current_window() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() / WINDOW_SECS)
        .unwrap_or(0)
}

/// Counts requests per `(client ip, window)` and rejects those over the limit.
///
/// Counters of earlier windows are purged lazily, on the first request of each new
/// window.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    counts: DashMap<(IpAddr, u64), u32>,
    last_cleaned: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter admitting `limit` requests per client and minute.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            counts: DashMap::new(),
            last_cleaned: AtomicU64::new(0),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Records a request from `ip` in the current window.
    ///
    /// Returns `false` once the client exceeded the limit for this window.
    pub fn allow(&self, ip: IpAddr) -> bool {
        self.allow_in_window(ip, current_window())
    }

    /// Records a request from `ip` in the given `window`.
    ///
    /// Windows never move backwards: a request carrying an older window than one
    /// already seen is counted in the newest window.
    pub fn allow_in_window(&self, ip: IpAddr, window: u64) -> bool {
        let newest = self.last_cleaned.fetch_max(window, Ordering::AcqRel);
        let window = if newest < window {
            self.counts.retain(|&(_, w), _| w >= window);
            window
        } else {
            newest
        };

        let mut count = self.counts.entry((ip, window)).or_insert(0);
        *count = count.saturating_add(1);
        *count <= self.limit
    }

    /// Number of `(client, window)` counters currently held.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
