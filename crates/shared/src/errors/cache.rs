use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Transient cache failure: {0}")]
    Transient(String),

    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache unavailable after {attempts} attempt(s): {reason}")]
    Unavailable { attempts: u32, reason: String },

    /// The store answered but the value under `key` cannot be decoded.
    #[error("Corrupt value for key '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl CacheError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CacheError::Transient(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_timeout()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
        {
            CacheError::Transient(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        match err {
            deadpool_redis::PoolError::Backend(redis_err) => CacheError::from(redis_err),
            deadpool_redis::PoolError::Timeout(kind) => {
                CacheError::Transient(format!("pool timeout: {kind:?}"))
            }
            other => CacheError::Backend(other.to_string()),
        }
    }
}
