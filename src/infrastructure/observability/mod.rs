//! Observability infrastructure - Tracing and Metrics

mod config;
mod metrics;
mod tracing_setup;

pub use config::{MetricsConfig, ObservabilityConfig, TracingConfig};
pub use metrics::{
    create_metrics_router, init_metrics, record_http_request, record_login, record_rate_limited,
    record_signup, record_token_rejection, PrometheusMetrics,
};
pub use tracing_setup::{init_tracing, shutdown_tracing};
