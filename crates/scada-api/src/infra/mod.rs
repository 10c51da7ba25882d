pub mod config;
pub mod consumer;
pub mod fetchers;
pub mod logging;
pub mod memory;
pub mod output;
pub mod publisher;
pub mod signal;

pub use config::Config;
pub use fetchers::LineFetcher;
pub use logging::LogGuard;
pub use output::LineWriter;
pub use signal::UnixSignalHandler;
