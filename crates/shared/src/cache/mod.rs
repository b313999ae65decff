mod cache_store;
mod cart;
mod counter;
mod memory_store;
mod redis_store;

pub use self::cache_store::{CacheStore, RetryPolicy};
pub use self::cart::{CART_KEY_PREFIX, CartStore};
pub use self::counter::{COUNTER_KEY_PREFIX, ReservationCounter};
pub use self::memory_store::InMemoryKeyValueStore;
pub use self::redis_store::RedisKeyValueStore;
