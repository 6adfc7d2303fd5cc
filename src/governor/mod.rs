// Fetch governor: TTL caches and per-client rate limiting in front of the
// upstream sales and catalog services.

pub mod cache;
pub mod rate_limiter;

pub use cache::TtlCache;
pub use rate_limiter::RateLimiter;

use crate::config::GovernorConfig;
use crate::model::{CardReport, Sale};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub upstream_evicted: usize,
    pub reports_evicted: usize,
    pub rate_limits_evicted: usize,
}

/// Process-wide state shared by every request: one instance is built at
/// startup and handed to the request handlers.
#[derive(Debug)]
pub struct Governor {
    /// Raw upstream sales, keyed `<source>:<setName>:<cardNumber>`.
    upstream: TtlCache<Vec<Sale>>,
    /// Finished per-card analyses.
    reports: TtlCache<CardReport>,
    limiter: RateLimiter,
}

impl Governor {
    /// Empty maps and zeroed statistics.
    pub fn new(cfg: &GovernorConfig) -> Self {
        Self {
            upstream: TtlCache::new(Duration::seconds(cfg.upstream_ttl_seconds)),
            reports: TtlCache::new(Duration::seconds(cfg.analytics_ttl_seconds)),
            limiter: RateLimiter::new(
                Duration::seconds(cfg.rate_limit_window_seconds),
                cfg.rate_limit_max,
            ),
        }
    }

    pub fn upstream(&self) -> &TtlCache<Vec<Sale>> {
        &self.upstream
    }

    pub fn reports(&self) -> &TtlCache<CardReport> {
        &self.reports
    }

    pub fn check_rate_limit(&self, identity: &str) -> bool {
        self.check_rate_limit_at(identity, Utc::now())
    }

    pub fn check_rate_limit_at(&self, identity: &str, now: DateTime<Utc>) -> bool {
        self.limiter.check_at(identity, now)
    }

    /// Identities with a live rate-limit window.
    pub fn tracked_identities(&self) -> usize {
        self.limiter.len()
    }

    pub fn cleanup(&self) -> CleanupReport {
        self.cleanup_at(Utc::now())
    }

    /// Sweeps expired cache entries and elapsed rate-limit windows.
    pub fn cleanup_at(&self, now: DateTime<Utc>) -> CleanupReport {
        CleanupReport {
            upstream_evicted: self.upstream.cleanup_at(now),
            reports_evicted: self.reports.cleanup_at(now),
            rate_limits_evicted: self.limiter.cleanup_at(now),
        }
    }

    /// Empties every store and resets statistics.
    pub fn clear(&self) {
        self.upstream.clear();
        self.reports.clear();
        self.limiter.clear();
    }

    /// Runs `cleanup` every `period` until the returned task is aborted.
    pub fn spawn_cleanup(self: Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = self.cleanup();
                if report == CleanupReport::default() {
                    debug!("Governor sweep: nothing expired");
                } else {
                    info!(
                        "Governor sweep: {} upstream, {} reports, {} rate limits evicted",
                        report.upstream_evicted, report.reports_evicted, report.rate_limits_evicted
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Grade;

    fn sale(price: f64) -> Sale {
        Sale {
            listing_id: "1".into(),
            title: String::new(),
            price,
            date_sold: Utc::now(),
            is_auction: false,
            bids: None,
            condition: "raw".into(),
            grade: Grade::Raw,
        }
    }

    #[test]
    fn layers_use_their_own_ttl() {
        let governor = Governor::new(&GovernorConfig::default());
        assert_eq!(governor.upstream().ttl(), Duration::hours(24));
        assert_eq!(governor.reports().ttl(), Duration::minutes(30));
    }

    #[test]
    fn sweep_covers_caches_and_limiter() {
        let governor = Governor::new(&GovernorConfig::default());
        let t0 = Utc::now();
        governor.upstream().set_at("ebay:Base:4", vec![sale(10.0)], t0);
        assert!(governor.check_rate_limit_at("client", t0));
        assert_eq!(governor.tracked_identities(), 1);

        let report = governor.cleanup_at(t0 + Duration::minutes(2));
        assert_eq!(report.rate_limits_evicted, 1);
        assert_eq!(report.upstream_evicted, 0);

        let report = governor.cleanup_at(t0 + Duration::hours(25));
        assert_eq!(report.upstream_evicted, 1);
    }

    #[test]
    fn clear_resets_everything() {
        let governor = Governor::new(&GovernorConfig { rate_limit_max: 1, ..Default::default() });
        governor.upstream().set("k", vec![sale(1.0)]);
        governor.upstream().get("k");
        assert!(governor.check_rate_limit("client"));
        assert!(!governor.check_rate_limit("client"));

        governor.clear();
        assert_eq!(governor.upstream().len(), 0);
        assert_eq!(governor.upstream().stats().total_requests, 0);
        assert!(governor.check_rate_limit("client"));
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweep_evicts_expired_entries() {
        let governor = Arc::new(Governor::new(&GovernorConfig::default()));
        governor
            .upstream()
            .set_at("stale", vec![sale(1.0)], Utc::now() - Duration::hours(48));

        let handle = governor.clone().spawn_cleanup(std::time::Duration::from_secs(60));
        tokio::time::sleep(std::time::Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert_eq!(governor.upstream().len(), 0);
        handle.abort();
    }
}
