mod cache;
mod repository;
mod service;

pub use self::cache::CacheError;
pub use self::repository::RepositoryError;
pub use self::service::{ErrorKind, ResaleRejection, ServiceError};
