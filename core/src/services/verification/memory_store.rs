//! Process-local verification store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entities::verification_code::{RecordKey, VerificationRecord};
use crate::errors::StoreError;

use super::traits::VerificationStore;

/// Verification store backed by a mutex-guarded map.
///
/// Records do not survive a restart and are not shared between instances.
#[derive(Debug, Default)]
pub struct InMemoryVerificationStore {
    records: Mutex<HashMap<RecordKey, VerificationRecord>>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn put(&self, record: VerificationRecord) -> Result<(), StoreError> {
        self.records.lock().await.insert(record.key(), record);
        Ok(())
    }

    async fn remove(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self.records.lock().await.remove(key))
    }

    async fn update<F, T>(&self, key: &RecordKey, mut apply: F) -> Result<T, StoreError>
    where
        F: FnMut(&mut Option<VerificationRecord>) -> T + Send,
        T: Send,
    {
        let mut records = self.records.lock().await;
        let mut slot = records.remove(key);
        let output = apply(&mut slot);
        if let Some(record) = slot {
            records.insert(key.clone(), record);
        }
        Ok(output)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        Ok(before - records.len())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.lock().await.len())
    }
}
