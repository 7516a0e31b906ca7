//! Limiter Sweep Background Task
//!
//! Rate limiters create one bucket per client key and never drop them on
//! their own. This task periodically evicts buckets whose client has been
//! idle for longer than `idle_windows` refill windows. An evicted client
//! starts again with a full bucket, which is what an idle bucket would have
//! refilled to anyway.

use crate::middleware::{ClientRateLimiter, REFILL_WINDOW};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_IDLE_WINDOWS: u32 = 2;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct LimiterSweepConfig {
    /// How often to sweep (default: 60 seconds)
    pub sweep_interval: Duration,

    /// Buckets idle for more than this many refill windows are evicted
    /// (default: 2)
    pub idle_windows: u32,
}

impl Default for LimiterSweepConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            idle_windows: DEFAULT_IDLE_WINDOWS,
        }
    }
}

impl LimiterSweepConfig {
    /// Create LimiterSweepConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `FOLIO_LIMITER_SWEEP_INTERVAL_SECS`: sweep period (default: 60)
    /// - `FOLIO_LIMITER_IDLE_WINDOWS`: idle multiple of the refill window (default: 2)
    pub fn from_env() -> Self {
        let sweep_interval = Duration::from_secs(
            std::env::var("FOLIO_LIMITER_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        );

        let idle_windows = std::env::var("FOLIO_LIMITER_IDLE_WINDOWS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_IDLE_WINDOWS);

        Self {
            sweep_interval,
            idle_windows,
        }
    }

    /// Idle time after which a bucket is evicted.
    pub fn max_idle(&self) -> Duration {
        REFILL_WINDOW * self.idle_windows
    }
}

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Default)]
pub struct LimiterSweepMetrics {
    /// Sweeps completed since startup
    pub sweeps: AtomicU64,

    /// Buckets evicted since startup
    pub evicted: AtomicU64,
}

impl LimiterSweepMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> LimiterSweepSnapshot {
        LimiterSweepSnapshot {
            sweeps: self.sweeps.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSweepSnapshot {
    pub sweeps: u64,
    pub evicted: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Run one sweep over every limiter. Returns the number of evicted buckets.
pub fn sweep_once(
    limiters: &[Arc<ClientRateLimiter>],
    config: &LimiterSweepConfig,
    metrics: &LimiterSweepMetrics,
) -> usize {
    let max_idle = config.max_idle();
    let mut total = 0;
    for limiter in limiters {
        let evicted = limiter.evict_idle(max_idle);
        if evicted > 0 {
            tracing::debug!(
                limiter = limiter.name(),
                evicted,
                remaining = limiter.tracked_clients(),
                "Evicted idle rate limit buckets"
            );
        }
        total += evicted;
    }
    metrics.sweeps.fetch_add(1, Ordering::Relaxed);
    metrics.evicted.fetch_add(total as u64, Ordering::Relaxed);
    total
}

/// Sweep the given limiters every `sweep_interval` until shutdown.
///
/// Returns the metrics collected during the task's lifetime.
pub async fn limiter_sweep_task(
    limiters: Vec<Arc<ClientRateLimiter>>,
    config: LimiterSweepConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<LimiterSweepMetrics> {
    let metrics = Arc::new(LimiterSweepMetrics::new());

    let mut sweep_interval = interval(config.sweep_interval);
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        max_idle_secs = config.max_idle().as_secs(),
        limiters = limiters.len(),
        "Limiter sweep task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Limiter sweep task shutting down");
                    break;
                }
            }

            _ = sweep_interval.tick() => {
                sweep_once(&limiters, &config, &metrics);
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        sweeps = snapshot.sweeps,
        evicted = snapshot.evicted,
        "Limiter sweep task completed"
    );

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let previous = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.as_deref() {
                Some(value) => std::env::set_var(self.key, value),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = LimiterSweepConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.max_idle(), Duration::from_secs(120));
    }

    #[test]
    fn test_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _interval = EnvVarGuard::set("FOLIO_LIMITER_SWEEP_INTERVAL_SECS", Some("15"));
        let _windows = EnvVarGuard::set("FOLIO_LIMITER_IDLE_WINDOWS", Some("5"));

        let config = LimiterSweepConfig::from_env();
        assert_eq!(config.sweep_interval, Duration::from_secs(15));
        assert_eq!(config.max_idle(), Duration::from_secs(300));
    }

    #[test]
    fn test_zero_interval_falls_back() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _interval = EnvVarGuard::set("FOLIO_LIMITER_SWEEP_INTERVAL_SECS", Some("0"));
        let _windows = EnvVarGuard::set("FOLIO_LIMITER_IDLE_WINDOWS", None);

        let config = LimiterSweepConfig::from_env();
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.idle_windows, DEFAULT_IDLE_WINDOWS);
    }

    #[test]
    fn test_sweep_keeps_recent_clients() {
        let limiter = Arc::new(ClientRateLimiter::new("public", 30));
        limiter.allow("10.0.0.1").expect("allowed");
        limiter.allow("10.0.0.2").expect("allowed");

        let metrics = LimiterSweepMetrics::new();
        let evicted = sweep_once(&[limiter.clone()], &LimiterSweepConfig::default(), &metrics);
        assert_eq!(evicted, 0);
        assert_eq!(limiter.tracked_clients(), 2);
        assert_eq!(metrics.snapshot(), LimiterSweepSnapshot { sweeps: 1, evicted: 0 });
    }

    #[test]
    fn test_sweep_evicts_idle_clients_across_limiters() {
        let global = Arc::new(ClientRateLimiter::new("global", 60));
        let auth = Arc::new(ClientRateLimiter::new("auth", 5));
        global.allow("a").expect("allowed");
        global.allow("b").expect("allowed");
        auth.allow("a").expect("allowed");

        let config = LimiterSweepConfig {
            idle_windows: 0,
            ..LimiterSweepConfig::default()
        };
        let metrics = LimiterSweepMetrics::new();
        let evicted = sweep_once(&[global.clone(), auth.clone()], &config, &metrics);

        assert_eq!(evicted, 3);
        assert_eq!(global.tracked_clients(), 0);
        assert_eq!(auth.tracked_clients(), 0);
        assert_eq!(metrics.snapshot().evicted, 3);
    }

    #[tokio::test]
    async fn test_task_sweeps_until_shutdown() {
        let limiter = Arc::new(ClientRateLimiter::new("global", 60));
        limiter.allow("idle-client").expect("allowed");

        let config = LimiterSweepConfig {
            sweep_interval: Duration::from_millis(10),
            idle_windows: 0,
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(limiter_sweep_task(vec![limiter.clone()], config, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).expect("send shutdown");
        let metrics = handle.await.expect("task");

        let snapshot = metrics.snapshot();
        assert!(snapshot.sweeps >= 1);
        assert_eq!(snapshot.evicted, 1);
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
