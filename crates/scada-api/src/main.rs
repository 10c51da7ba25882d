mod core;
mod domain;
mod infra;
mod service;

use std::{io, path::Path, sync::Arc, time::Duration};

use nest_mediator::{BroadcastBroker, LoggingMiddleware, MiddlewareChain};
use tokio::runtime::{Builder, Runtime};

use crate::{
    core::App,
    infra::{
        Config, LineFetcher, LineWriter, LogGuard, UnixSignalHandler,
        consumer::{Consumer, RequestRouter},
        publisher,
    },
    service::{Dependencies, registry, setup_mediator},
};

/// How long tasks still alive after `App::run` may keep the runtime up.
/// A stdin read parked on the blocking pool never returns on its own.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    load_env_file("./config")?;

    let config = Config::new();
    let log_guard = LogGuard::init(&config)?;

    let runtime = runtime()?;
    let res = runtime.block_on(run(config, log_guard));
    shutdown(runtime);

    res
}

async fn run(config: Config, log_guard: LogGuard) -> anyhow::Result<()> {
    let output = LineWriter::stdout();

    let broker = BroadcastBroker::new(config.broker_capacity()?);
    tokio::spawn(publisher::forward(broker.subscribe(), output.clone()));

    let middleware = MiddlewareChain::new().with(LoggingMiddleware::new());
    let mediator = setup_mediator(Dependencies::in_memory(), Arc::new(broker), middleware);

    let router = RequestRouter::new(registry(), mediator);
    let consumer = Consumer::new(router, output, config.consumer_concurrency()?);

    let fetcher = LineFetcher::stdin();
    let app = App::new(log_guard, UnixSignalHandler::new(), fetcher, consumer);

    app.run().await
}

fn runtime() -> io::Result<Runtime> {
    Builder::new_multi_thread().enable_all().build()
}

fn shutdown(runtime: Runtime) {
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
}

/// The env file is optional, but one that exists must parse.
fn load_env_file(path: impl AsRef<Path>) -> anyhow::Result<()> {
    match dotenv::from_path(path.as_ref()) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
