mod database;
mod myconfig;
mod redis;

pub use self::database::{ConnectionManager, ConnectionPool};
pub use self::myconfig::{CacheConfig, Config, InventoryConfig};
pub use self::redis::{RedisClient, RedisConfig};
