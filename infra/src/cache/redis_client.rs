//! Redis cache client implementation
//!
//! Wraps a `redis::Client` together with a shared multiplexed connection.
//! Commands that rely on per-connection state (WATCH) must use
//! [`RedisClient::dedicated_connection`] instead of the shared one. Dedicated
//! connections come from a small idle pool and go back to it through
//! [`PooledConnection::release`].

use redis::aio::{Connection, MultiplexedConnection};
use redis::Client;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use af_shared::CacheConfig;

use crate::InfrastructureError;

/// Base delay between connection attempts
const CONNECT_RETRY_DELAY_MS: u64 = 100;

/// Redis client with connection retry
#[derive(Clone)]
pub struct RedisClient {
    client: Client,
    /// Shared connection for stateless commands
    connection: MultiplexedConnection,
    /// Idle dedicated connections
    idle: Arc<IdlePool<Connection>>,
    /// Configuration used to create this client
    config: CacheConfig,
}

/// Bounded stack of idle connections
pub(crate) struct IdlePool<C> {
    items: Mutex<Vec<C>>,
    capacity: usize,
}

impl<C> IdlePool<C> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    pub(crate) fn take(&self) -> Option<C> {
        self.items.lock().ok().and_then(|mut items| items.pop())
    }

    /// Keep `item` for reuse; dropped when the pool is full
    pub(crate) fn put(&self, item: C) {
        if let Ok(mut items) = self.items.lock() {
            if items.len() < self.capacity {
                items.push(item);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }
}

/// Dedicated connection checked out of the idle pool.
///
/// Dropping it closes the connection; only [`release`](Self::release) returns
/// it to the pool, so a connection left mid-transaction is never reused.
pub struct PooledConnection {
    conn: Connection,
    pool: Arc<IdlePool<Connection>>,
}

impl PooledConnection {
    /// Return the connection for reuse. No WATCH or MULTI may be pending.
    pub fn release(self) {
        let PooledConnection { conn, pool } = self;
        pool.put(conn);
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl RedisClient {
    /// Connect to Redis, retrying with exponential backoff
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        info!("Creating Redis client with URL: {}", mask_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = Self::create_connection_with_retry(&client, config.connect_retries.max(1)).await?;

        info!("Redis client created successfully");

        Ok(Self {
            client,
            connection,
            idle: Arc::new(IdlePool::new(config.transaction_pool_size)),
            config,
        })
    }

    async fn create_connection_with_retry(
        client: &Client,
        max_retries: u32,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = CONNECT_RETRY_DELAY_MS;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            match client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    // Exponential backoff with cap at 5 seconds
                    delay = (delay * 2).min(5000);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    /// Shared multiplexed connection
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    /// A connection of its own, for transactions guarded by WATCH.
    ///
    /// Reuses an idle connection when one is available.
    pub async fn dedicated_connection(&self) -> Result<PooledConnection, InfrastructureError> {
        let conn = match self.idle.take() {
            Some(conn) => conn,
            None => {
                debug!("Opening dedicated Redis connection");
                self.client.get_async_connection().await?
            }
        };
        Ok(PooledConnection {
            conn,
            pool: self.idle.clone(),
        })
    }

    /// Dedicated connections waiting in the idle pool
    pub fn idle_connections(&self) -> usize {
        self.idle.len()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Prefix a key with the configured namespace
    pub fn make_key(&self, key: &str) -> String {
        self.config.make_key(key)
    }

    /// Check connectivity with PING
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let mut conn = self.connection();
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        if response == "PONG" {
            Ok(true)
        } else {
            warn!("Redis health check returned unexpected response: {}", response);
            Ok(false)
        }
    }
}

/// Hide credentials in a Redis URL before logging it
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}
