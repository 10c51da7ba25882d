use std::fmt;

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    Interrupt,
    Terminate,
    Hangup,
    /// The inbound stream ended on its own.
    Exhausted,
}

impl fmt::Display for ShutdownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownKind::Interrupt => "SIGINT",
            ShutdownKind::Terminate => "SIGTERM",
            ShutdownKind::Hangup => "SIGHUP",
            ShutdownKind::Exhausted => "end of input",
        };
        f.write_str(name)
    }
}

#[async_trait]
pub trait SignalHandler: Send + Sync + 'static {
    async fn wait_for_shutdown(&self) -> anyhow::Result<ShutdownKind>;
}
