//! Tracing subscriber initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "folio_api=debug,tower_http=debug,info";

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log
    pub service_name: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "folio-api".to_string(),
            environment: "development".to_string(),
            json: true,
        }
    }
}

impl TelemetryConfig {
    /// Load from environment variables.
    ///
    /// - `FOLIO_SERVICE_NAME` (default `folio-api`)
    /// - `FOLIO_ENVIRONMENT` (default `development`)
    /// - `FOLIO_LOG_FORMAT`: `json` (default) or `pretty`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: std::env::var("FOLIO_SERVICE_NAME").unwrap_or(defaults.service_name),
            environment: std::env::var("FOLIO_ENVIRONMENT").unwrap_or(defaults.environment),
            json: std::env::var("FOLIO_LOG_FORMAT")
                .map(|v| !v.eq_ignore_ascii_case("pretty"))
                .unwrap_or(defaults.json),
        }
    }
}

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = config.service_name,
        environment = config.environment,
        "Telemetry initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: Option<&str>) -> Self {
            let original = std::env::var(key).ok();
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
            Self { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.original.as_deref() {
                Some(v) => std::env::set_var(self.key, v),
                None => std::env::remove_var(self.key),
            }
        }
    }

    #[test]
    fn test_telemetry_config_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _name = EnvVarGuard::set("FOLIO_SERVICE_NAME", None);
        let _format = EnvVarGuard::set("FOLIO_LOG_FORMAT", None);

        let config = TelemetryConfig::from_env();
        assert_eq!(config.service_name, "folio-api");
        assert!(config.json);
    }

    #[test]
    fn test_pretty_format_disables_json() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let _format = EnvVarGuard::set("FOLIO_LOG_FORMAT", Some("pretty"));
        assert!(!TelemetryConfig::from_env().json);
    }
}
