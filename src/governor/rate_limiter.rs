use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RateLimitEntry {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Fixed-window limiter keyed by caller identity: at most `max` calls per
/// `window`, with the count reset once the window has fully elapsed.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max: u32,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn check_at(&self, identity: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries.lock();

        match entries.get_mut(identity) {
            Some(entry) if now - entry.window_start <= self.window => {
                if entry.count >= self.max {
                    warn!("Rate limit reached for {} ({} calls)", identity, entry.count);
                    return false;
                }
                entry.count += 1;
                true
            }
            _ => {
                entries.insert(
                    identity.to_string(),
                    RateLimitEntry { count: 1, window_start: now },
                );
                true
            }
        }
    }

    /// Removes identities whose window has elapsed, returning how many were dropped.
    pub fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now - entry.window_start <= self.window);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
