//! Cache module for Redis-based storage
//!
//! This module provides the Redis client with connection retry and the
//! Redis-backed implementation of the verification store.

pub mod redis_client;
pub mod redis_store;

pub use redis_client::{PooledConnection, RedisClient};
pub use redis_store::RedisVerificationStore;

// Re-export commonly used types
pub use af_shared::CacheConfig;
