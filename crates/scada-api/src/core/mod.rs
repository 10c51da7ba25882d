mod app;
pub mod shutdown;
pub mod signal;

pub use app::App;
pub use shutdown::Shutdowner;
pub use signal::{ShutdownKind, SignalHandler};
