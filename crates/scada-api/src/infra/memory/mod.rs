pub mod repository;
pub mod storage;

pub use repository::InMemoryUnitOfWork;
pub use storage::InMemoryIndicatorStorage;
