pub mod consumer;
pub mod registry;
pub mod reply;
pub mod router;

pub use consumer::Consumer;
pub use registry::RequestRegistry;
pub use router::RequestRouter;
