use std::time::Duration;

use tokio::time::timeout;
use tracing::{error, info};

use crate::{
    core::{ShutdownKind, Shutdowner, SignalHandler},
    domain::{consumer::RequestConsumer, fetcher::RequestFetcher},
    infra::LogGuard,
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct App<S, F, C> {
    _log_guard: LogGuard,
    signal_handler: S,
    fetcher: F,
    consumer: C,
}

impl<S, F, C> App<S, F, C>
where
    S: SignalHandler,
    F: RequestFetcher + Shutdowner,
    C: RequestConsumer,
{
    pub fn new(log_guard: LogGuard, signal_handler: S, fetcher: F, consumer: C) -> Self {
        Self {
            _log_guard: log_guard,
            signal_handler,
            fetcher,
            consumer,
        }
    }

    /// Runs until a signal arrives or the input ends, then lets in-flight
    /// requests finish for at most [`SHUTDOWN_TIMEOUT`].
    pub async fn run(self) -> anyhow::Result<()> {
        info!("app running...");

        let Self {
            signal_handler,
            fetcher,
            consumer,
            ..
        } = self;

        let request_ch = fetcher.fetch().await;
        let mut handle = tokio::spawn(async move {
            consumer.consume(request_ch).await;
        });

        let kind = tokio::select! {
            signal = signal_handler.wait_for_shutdown() => signal?,
            res = &mut handle => {
                res?;
                ShutdownKind::Exhausted
            }
        };
        info!("received {}, stopping", kind);

        fetcher.shutdown().await?;

        if kind == ShutdownKind::Exhausted {
            info!("graceful shutdown complete");
            return Ok(());
        }

        match timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(res) => {
                info!("graceful shutdown complete");
                res?;
            }
            Err(_) => {
                error!("shutdown timeout exceeded, forcing exit");
            }
        }

        Ok(())
    }
}
