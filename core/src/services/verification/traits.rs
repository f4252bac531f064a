//! Storage abstraction for verification records

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::verification_code::{RecordKey, VerificationRecord};
use crate::errors::StoreError;

/// Keyed storage for verification records.
///
/// Every mutation that depends on the current record goes through
/// [`VerificationStore::update`], which must apply the closure atomically
/// with respect to other updates of the same key. Backends that detect
/// conflicts optimistically may call the closure more than once, so it
/// must not have side effects beyond its return value.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Fetch the record for a key, expired or not
    async fn get(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError>;

    /// Insert or replace a record
    async fn put(&self, record: VerificationRecord) -> Result<(), StoreError>;

    /// Delete a record, returning it if it existed
    async fn remove(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError>;

    /// Atomic read-modify-write of one key.
    ///
    /// The closure receives the current slot; leaving `None` in it deletes
    /// the record.
    async fn update<F, T>(&self, key: &RecordKey, apply: F) -> Result<T, StoreError>
    where
        F: FnMut(&mut Option<VerificationRecord>) -> T + Send,
        T: Send;

    /// Remove every record expired at `now`, returning how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Number of stored records, including expired ones not yet purged
    async fn len(&self) -> Result<usize, StoreError>;
}
