//! Rolling-window counters for seasonal pattern detection.

use std::collections::HashMap;
use chrono::Timelike;
use perftune_core::{SeasonalKind, SeasonalPattern, Time};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::trace;

/// Window key for the hour of day of `time` (e.g. `hour-13`).
pub fn hour_of_day_key(time: &Time) -> String {
    format!("hour-{:02}", time.hour())
}

#[derive(Debug, Clone)]
struct WindowEntry {
    count: u64,
    updates: u64,
    last_touch: u64,
}

#[derive(Debug, Default)]
struct Windows {
    entries: HashMap<String, WindowEntry>,
    clock: u64,
}

/// Summary of one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    /// Window key
    pub key: String,
    /// Accumulated count (saturating)
    pub count: u64,
    /// Number of `add` calls folded into the window
    pub updates: u64,
}

/// Bounded map of window key to accumulated count.
///
/// When a new key arrives at capacity, the least recently updated window is
/// evicted. Counts saturate at `u64::MAX`.
pub struct RollingWindowCache {
    capacity: usize,
    windows: Mutex<Windows>,
}

impl RollingWindowCache {
    /// Create a cache holding at most `capacity` windows (minimum one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: Mutex::new(Windows::default()),
        }
    }

    /// Maximum number of windows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add `count` to the window `key`.
    pub async fn add(&self, key: &str, count: u64) {
        let mut windows = self.windows.lock().await;
        windows.clock += 1;
        let now = windows.clock;

        if !windows.entries.contains_key(key) && windows.entries.len() >= self.capacity {
            let evict = windows
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_touch)
                .map(|(k, _)| k.clone());
            if let Some(evict) = evict {
                trace!("Evicting rolling window {:?}", evict);
                windows.entries.remove(&evict);
            }
        }

        let entry = windows.entries.entry(key.to_string()).or_insert(WindowEntry {
            count: 0,
            updates: 0,
            last_touch: now,
        });
        entry.count = entry.count.saturating_add(count);
        entry.updates += 1;
        entry.last_touch = now;
    }

    /// Accumulated count for `key`.
    pub async fn get(&self, key: &str) -> Option<u64> {
        self.windows.lock().await.entries.get(key).map(|e| e.count)
    }

    /// Number of windows held.
    pub async fn len(&self) -> usize {
        self.windows.lock().await.entries.len()
    }

    /// Whether no window is held.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// All windows, sorted by key.
    pub async fn windows(&self) -> Vec<WindowSummary> {
        let windows = self.windows.lock().await;
        let mut out: Vec<WindowSummary> = windows
            .entries
            .iter()
            .map(|(key, entry)| WindowSummary {
                key: key.clone(),
                count: entry.count,
                updates: entry.updates,
            })
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// Windows whose count deviates from the mean by at least `threshold`
    /// (as a fraction of the mean). Needs two or more windows.
    pub async fn seasonal_patterns(&self, threshold: f64) -> Vec<SeasonalPattern> {
        let windows = self.windows().await;
        if windows.len() < 2 {
            return Vec::new();
        }

        let mean = windows.iter().map(|w| w.count as f64).sum::<f64>() / windows.len() as f64;
        if mean <= 0.0 {
            return Vec::new();
        }

        windows
            .into_iter()
            .filter_map(|w| {
                let ratio = w.count as f64 / mean;
                let kind = if ratio >= 1.0 + threshold {
                    SeasonalKind::Peak
                } else if ratio <= 1.0 - threshold {
                    SeasonalKind::Trough
                } else {
                    return None;
                };
                Some(SeasonalPattern {
                    window: w.key,
                    kind,
                    observed: w.count,
                    ratio_to_mean: ratio,
                })
            })
            .collect()
    }

    /// Drop all windows.
    pub async fn clear(&self) {
        self.windows.lock().await.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_accumulates_per_key() {
        let cache = RollingWindowCache::new(4);
        cache.add("hour-01", 10).await;
        cache.add("hour-01", 5).await;
        cache.add("hour-02", 1).await;

        assert_eq!(cache.get("hour-01").await, Some(15));
        assert_eq!(cache.get("hour-02").await, Some(1));
        assert_eq!(cache.get("hour-03").await, None);
    }

    #[tokio::test]
    async fn test_empty_key_and_huge_counts() {
        let cache = RollingWindowCache::new(2);
        cache.add("", 0).await;
        cache.add("", u64::MAX).await;
        cache.add("", u64::MAX).await;
        assert_eq!(cache.get("").await, Some(u64::MAX));
    }

    #[tokio::test]
    async fn test_evicts_least_recently_updated() {
        let cache = RollingWindowCache::new(2);
        cache.add("a", 1).await;
        cache.add("b", 1).await;
        cache.add("a", 1).await;
        cache.add("c", 1).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("b").await, None);
        assert_eq!(cache.get("a").await, Some(2));
        assert_eq!(cache.get("c").await, Some(1));
    }

    #[tokio::test]
    async fn test_seasonal_patterns() {
        let cache = RollingWindowCache::new(24);
        cache.add("hour-09", 100).await;
        cache.add("hour-10", 100).await;
        cache.add("hour-12", 400).await;
        cache.add("hour-03", 0).await;

        let patterns = cache.seasonal_patterns(0.5).await;
        // mean = 150: hour-12 is a peak, hour-03 a trough, the rest are within 50%
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].window, "hour-03");
        assert_eq!(patterns[0].kind, SeasonalKind::Trough);
        assert_eq!(patterns[1].window, "hour-12");
        assert_eq!(patterns[1].kind, SeasonalKind::Peak);
        assert!(patterns[1].ratio_to_mean > 2.6);
    }

    #[tokio::test]
    async fn test_no_patterns_without_data() {
        let cache = RollingWindowCache::new(24);
        assert!(cache.seasonal_patterns(0.5).await.is_empty());
        cache.add("hour-01", 0).await;
        cache.add("hour-02", 0).await;
        assert!(cache.seasonal_patterns(0.5).await.is_empty());
    }

    #[test]
    fn test_hour_of_day_key() {
        let time = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 7, 30, 0).unwrap();
        assert_eq!(hour_of_day_key(&time), "hour-07");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_fifty_concurrent_writers() {
        let cache = Arc::new(RollingWindowCache::new(16));
        let mut handles = Vec::new();

        for writer in 0..50u64 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let key = format!("window-{}", writer);
                for i in 0..200u64 {
                    cache.add(&key, i * 1_000_000).await;
                    assert!(cache.len().await <= 16);
                }
            }));
        }

        for handle in handles {
            handle.await.expect("writer panicked");
        }
        assert_eq!(cache.len().await, 16);
    }
}
