//! Folio Telemetry - structured logging
//!
//! JSON logs via `tracing-subscriber` and a per-request span with a
//! completion log line.

pub mod middleware;
pub mod tracer;

pub use middleware::observability_middleware;
pub use tracer::{init_tracing, TelemetryConfig};
