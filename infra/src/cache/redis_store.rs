//! Redis-backed verification store
//!
//! Records are stored as JSON under `verification:{purpose}:{contact}` with a
//! Redis expiry matching the record's remaining lifetime, so expired records
//! disappear without a sweep. Read-modify-write updates use WATCH/MULTI/EXEC
//! and are retried when another writer touched the key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::Connection;
use redis::AsyncCommands;
use tracing::{debug, warn};

use af_core::domain::{RecordKey, VerificationRecord};
use af_core::errors::StoreError;
use af_core::services::VerificationStore;

use super::redis_client::RedisClient;

/// Key namespace for verification records
const KEY_NAMESPACE: &str = "verification";

/// Verification store shared by every instance connected to the same Redis
#[derive(Clone)]
pub struct RedisVerificationStore {
    client: RedisClient,
    transaction_retries: u32,
}

impl RedisVerificationStore {
    pub fn new(client: RedisClient) -> Self {
        let transaction_retries = client.config().transaction_retries;
        Self {
            client,
            transaction_retries,
        }
    }

    fn redis_key(&self, key: &RecordKey) -> String {
        self.client.make_key(&format!("{}:{}", KEY_NAMESPACE, key))
    }

    fn key_pattern(&self) -> String {
        self.client.make_key(&format!("{}:*", KEY_NAMESPACE))
    }

    /// One WATCH/MULTI/EXEC round per attempt until the write commits
    async fn watched_update<F, T>(
        &self,
        conn: &mut Connection,
        redis_key: &str,
        apply: &mut F,
    ) -> Result<T, StoreError>
    where
        F: FnMut(&mut Option<VerificationRecord>) -> T + Send,
        T: Send,
    {
        for attempt in 0..=self.transaction_retries {
            redis::cmd("WATCH")
                .arg(redis_key)
                .query_async::<_, ()>(&mut *conn)
                .await
                .map_err(backend)?;

            let raw: Option<String> = conn.get(redis_key).await.map_err(backend)?;
            let current = raw.as_deref().map(decode).transpose()?;
            let mut slot = current.clone();
            let output = apply(&mut slot);

            if slot == current {
                redis::cmd("UNWATCH")
                    .query_async::<_, ()>(&mut *conn)
                    .await
                    .map_err(backend)?;
                return Ok(output);
            }

            let mut pipe = redis::pipe();
            pipe.atomic();
            queue_write(&mut pipe, redis_key, &slot)?;

            // EXEC replies nil when a watched key changed
            let committed: Option<()> = pipe.query_async(&mut *conn).await.map_err(backend)?;
            if committed.is_some() {
                return Ok(output);
            }

            debug!(key = %redis_key, attempt = attempt + 1, "Verification record changed concurrently, retrying");
        }

        warn!(key = %redis_key, retries = self.transaction_retries, "Gave up updating verification record");
        Err(StoreError::Contention {
            key: redis_key.to_string(),
            retries: self.transaction_retries,
        })
    }
}

fn backend(error: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(error.to_string())
}

fn encode(record: &VerificationRecord) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode(raw: &str) -> Result<VerificationRecord, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Remaining lifetime in milliseconds, `None` once expired.
///
/// A record at its `expires_at` instant is still live; `PX` needs at least 1.
fn expiry_millis(record: &VerificationRecord, now: DateTime<Utc>) -> Option<i64> {
    if record.is_expired_at(now) {
        return None;
    }
    Some((record.expires_at - now).num_milliseconds().max(1))
}

/// Queue the write that makes Redis hold `slot` for `key`
fn queue_write(
    pipe: &mut redis::Pipeline,
    key: &str,
    slot: &Option<VerificationRecord>,
) -> Result<(), StoreError> {
    let now = Utc::now();
    match slot {
        Some(record) => match expiry_millis(record, now) {
            Some(ttl_ms) => {
                pipe.cmd("SET").arg(key).arg(encode(record)?).arg("PX").arg(ttl_ms).ignore();
            }
            None => {
                pipe.del(key).ignore();
            }
        },
        None => {
            pipe.del(key).ignore();
        }
    }
    Ok(())
}

#[async_trait]
impl VerificationStore for RedisVerificationStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError> {
        let mut conn = self.client.connection();
        let raw: Option<String> = conn.get(self.redis_key(key)).await.map_err(backend)?;
        raw.as_deref().map(decode).transpose()
    }

    async fn put(&self, record: VerificationRecord) -> Result<(), StoreError> {
        let redis_key = self.redis_key(&record.key());
        let mut pipe = redis::pipe();
        queue_write(&mut pipe, &redis_key, &Some(record))?;
        let mut conn = self.client.connection();
        pipe.query_async::<_, ()>(&mut conn).await.map_err(backend)
    }

    async fn remove(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.client.connection();
        let (raw,): (Option<String>,) = redis::pipe()
            .atomic()
            .get(&redis_key)
            .del(&redis_key)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        raw.as_deref().map(decode).transpose()
    }

    async fn update<F, T>(&self, key: &RecordKey, mut apply: F) -> Result<T, StoreError>
    where
        F: FnMut(&mut Option<VerificationRecord>) -> T + Send,
        T: Send,
    {
        let redis_key = self.redis_key(key);
        let mut conn = self.client.dedicated_connection().await.map_err(backend)?;

        let result = self.watched_update(&mut conn, &redis_key, &mut apply).await;
        // A failed round trip may leave WATCH state behind; such connections are closed
        if result.is_ok() {
            conn.release();
        }
        result
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        // Redis expires keys on its own
        Ok(0)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let pattern = self.key_pattern();
        let mut conn = self.client.connection();
        let mut cursor: u64 = 0;
        let mut count = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await
                .map_err(backend)?;
            count += keys.len();
            if next == 0 {
                return Ok(count);
            }
            cursor = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::domain::Purpose;
    use af_shared::CacheConfig;
    use chrono::Duration;

    #[test]
    fn test_expiry_millis() {
        let now = Utc::now();
        let record = VerificationRecord::new("01012345678", Purpose::FindId, "123456", now, Duration::seconds(300));
        assert_eq!(expiry_millis(&record, now), Some(300_000));
        assert_eq!(expiry_millis(&record, now + Duration::seconds(300)), Some(1));
        assert_eq!(expiry_millis(&record, now + Duration::milliseconds(300_001)), None);
    }

    #[test]
    fn test_record_json_roundtrip_keeps_state() {
        let now = Utc::now();
        let mut record = VerificationRecord::new("a@b.co", Purpose::EmailVerify, "654321", now, Duration::seconds(600));
        record.attempts = 2;
        record.mark_verified(now);

        let decoded = decode(&encode(&record).unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert!(matches!(decode("{not json"), Err(StoreError::Serialization(_))));
    }

    async fn connect() -> RedisVerificationStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let config = CacheConfig::redis(url).with_prefix(format!("aftest-{}", uuid::Uuid::new_v4()));
        RedisVerificationStore::new(RedisClient::new(config).await.unwrap())
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_update_and_remove_against_redis() {
        let store = connect().await;
        let now = Utc::now();
        let record = VerificationRecord::new("01012345678", Purpose::ResetPassword, "111222", now, Duration::seconds(60));
        let key = record.key();

        store.update(&key, |slot| *slot = Some(record.clone())).await.unwrap();
        let attempts = store
            .update(&key, |slot| {
                let record = slot.as_mut().unwrap();
                record.attempts += 1;
                record.attempts
            })
            .await
            .unwrap();
        assert_eq!(attempts, 1);
        assert_eq!(store.len().await.unwrap(), 1);

        let removed = store.remove(&key).await.unwrap().unwrap();
        assert_eq!(removed.attempts, 1);
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis to be running
    async fn test_updates_reuse_one_connection() {
        let store = connect().await;
        let record = VerificationRecord::new("01099998888", Purpose::FindId, "333444", Utc::now(), Duration::seconds(60));
        let key = record.key();
        assert_eq!(store.client.idle_connections(), 0);

        store.update(&key, |slot| *slot = Some(record.clone())).await.unwrap();
        assert_eq!(store.client.idle_connections(), 1);

        for _ in 0..3 {
            store
                .update(&key, |slot| {
                    if let Some(record) = slot.as_mut() {
                        record.attempts += 1;
                    }
                })
                .await
                .unwrap();
        }
        assert_eq!(store.client.idle_connections(), 1);
        assert_eq!(store.get(&key).await.unwrap().unwrap().attempts, 3);
        store.remove(&key).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ignore] // Requires Redis to be running
    async fn test_concurrent_updates_are_serialized() {
        let store = std::sync::Arc::new(connect().await);
        let now = Utc::now();
        let record = VerificationRecord::new("a@b.co", Purpose::FindId, "111222", now, Duration::seconds(60));
        let key = record.key();
        store.put(record).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    store
                        .update(&key, |slot| {
                            if let Some(record) = slot.as_mut() {
                                record.attempts += 1;
                            }
                        })
                        .await
                })
            })
            .collect();

        let mut committed: u32 = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                committed += 1;
            }
        }

        let stored = store.get(&key).await.unwrap().unwrap();
        assert_eq!(stored.attempts, committed);
        store.remove(&key).await.unwrap();
    }
}
