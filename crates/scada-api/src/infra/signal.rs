use async_trait::async_trait;
use tokio::signal::unix::{SignalKind, signal};

use crate::core::{ShutdownKind, SignalHandler};

pub struct UnixSignalHandler;

impl Default for UnixSignalHandler {
    fn default() -> Self {
        Self
    }
}

impl UnixSignalHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignalHandler for UnixSignalHandler {
    async fn wait_for_shutdown(&self) -> anyhow::Result<ShutdownKind> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sighup = signal(SignalKind::hangup())?;

        Ok(tokio::select! {
            _ = sigterm.recv() => ShutdownKind::Terminate,
            _ = sigint.recv() => ShutdownKind::Interrupt,
            _ = sighup.recv() => ShutdownKind::Hangup,
        })
    }
}
