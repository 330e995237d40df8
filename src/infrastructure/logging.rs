use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{LogFormat, LoggingConfig};

/// Boxed formatting layer, so callers can stack further layers on top
pub type FmtLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// `RUST_LOG` wins over the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

pub fn fmt_layer(config: &LoggingConfig) -> FmtLayer {
    match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_current_span(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}

/// Plain logging without trace export, used by the one-shot CLI commands
pub fn init_logging(config: &LoggingConfig) {
    let result = tracing_subscriber::registry()
        .with(fmt_layer(config))
        .with(env_filter(config))
        .try_init();

    if result.is_ok() {
        tracing::debug!("Logging initialized with level: {}", config.level);
    }
}
