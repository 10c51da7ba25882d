use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::infra::Config;

#[must_use = "LogGuard must be held to keep logging active"]
#[non_exhaustive]
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

impl LogGuard {
    /// `RUST_LOG` wins over `SCADA_LOGGING_LEVEL`. Logs go to stderr so
    /// stdout carries replies only.
    pub fn init(config: &Config) -> anyhow::Result<Self> {
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.logging_level()))?;

        let registry = tracing_subscriber::registry().with(filter);
        let layer = fmt::layer().with_writer(non_blocking_writer);
        if config.logging_serialize() {
            registry.with(layer.json()).try_init()?;
        } else {
            registry.with(layer).try_init()?;
        }

        Ok(Self { _guard: guard })
    }
}
