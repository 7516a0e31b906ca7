//! Background Jobs
//!
//! - `limiter_sweep`: evicts idle client buckets from the rate limiters
//!
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! tokio::spawn(limiter_sweep_task(limiters, LimiterSweepConfig::from_env(), shutdown_rx));
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! ```

pub mod limiter_sweep;

pub use limiter_sweep::{
    limiter_sweep_task, sweep_once, LimiterSweepConfig, LimiterSweepMetrics, LimiterSweepSnapshot,
};
