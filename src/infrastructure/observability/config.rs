//! Observability configuration

use serde::Deserialize;

/// Main observability configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Distributed tracing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// Enable OpenTelemetry tracing export
    #[serde(default)]
    pub enabled: bool,
    /// OTLP endpoint (e.g., http://localhost:4317)
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Sampling ratio (0.0 to 1.0)
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

/// Paths owned by the auth and probe routes; the metrics endpoint may not shadow them
const RESERVED_PATHS: &[&str] = &[
    "/signup", "/login", "/profile", "/health", "/ready", "/live",
];

impl ObservabilityConfig {
    /// Reject settings that would break startup or routing
    pub fn validate(&self) -> Result<(), String> {
        if self.tracing.enabled && self.tracing.otlp_endpoint.trim().is_empty() {
            return Err(
                "observability.tracing.otlp_endpoint is required when tracing is enabled"
                    .to_string(),
            );
        }

        if !(0.0..=1.0).contains(&self.tracing.sampling_ratio) {
            return Err(format!(
                "observability.tracing.sampling_ratio must be within 0.0..=1.0, got {}",
                self.tracing.sampling_ratio
            ));
        }

        if self.metrics.enabled {
            let path = self.metrics.path.as_str();

            if !path.starts_with('/') || path.len() < 2 {
                return Err(format!(
                    "observability.metrics.path must be an absolute path, got '{}'",
                    path
                ));
            }

            if RESERVED_PATHS.contains(&path) {
                return Err(format!(
                    "observability.metrics.path '{}' collides with an API route",
                    path
                ));
            }
        }

        Ok(())
    }
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: default_otlp_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}
