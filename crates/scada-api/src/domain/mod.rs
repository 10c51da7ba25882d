pub mod consumer;
pub mod errors;
pub mod fetcher;
pub mod indicators;
pub mod models;
pub mod repository;
pub mod storage;

pub use errors::DomainError;
