//! Main verification service implementation

use chrono::Duration as ChronoDuration;
use rand::{rngs::OsRng, Rng};
use std::sync::Arc;
use std::time::Duration;

use af_shared::utils::contact::mask_contact;

use crate::domain::entities::verification_code::{Purpose, RecordKey, VerificationRecord};
use crate::errors::{DomainError, DomainResult};
use crate::services::clock::{Clock, SystemClock};

use super::config::VerificationServiceConfig;
use super::traits::VerificationStore;
use super::types::{CodeSnapshot, IssuedCode, VerificationFailure, VerifyCodeResult};

/// Issues and checks one-time codes, keyed by (contact, purpose)
pub struct VerificationService<S: VerificationStore> {
    /// Record storage
    store: Arc<S>,
    /// Time source for expiry and cooldown decisions
    clock: Arc<dyn Clock>,
    /// Service configuration
    config: VerificationServiceConfig,
}

impl<S: VerificationStore> VerificationService<S> {
    /// Create a new verification service on the system clock
    pub fn new(store: Arc<S>, config: VerificationServiceConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>, config: VerificationServiceConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &VerificationServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Issue a new code for a contact and purpose.
    ///
    /// Any previous record for the same key is replaced, which invalidates
    /// its code. A live record younger than the resend cooldown blocks the
    /// request with [`DomainError::ResendCooldown`].
    ///
    /// # Arguments
    ///
    /// * `contact` - Normalized email address or phone number
    /// * `purpose` - Why the code is requested
    /// * `ttl` - Lifetime of the new code
    pub async fn issue(&self, contact: &str, purpose: Purpose, ttl: Duration) -> DomainResult<IssuedCode> {
        if contact.trim().is_empty() {
            return Err(DomainError::validation("Contact must not be empty"));
        }
        if ttl.is_zero() {
            return Err(DomainError::validation("Code lifetime must be positive"));
        }

        let now = self.clock.now();
        let cooldown = to_chrono(self.config.resend_cooldown);
        let record = VerificationRecord::new(contact, purpose, Self::generate_secure_code(), now, to_chrono(ttl));
        let key = record.key();

        let blocked_for = self
            .store
            .update(&key, |slot| {
                if let Some(existing) = slot.as_ref() {
                    let ready_at = existing.created_at + cooldown;
                    if !existing.is_expired_at(now) && now < ready_at {
                        return Some(ready_at - now);
                    }
                }
                *slot = Some(record.clone());
                None
            })
            .await?;

        if let Some(wait) = blocked_for {
            let retry_after_secs = ceil_secs(wait);
            tracing::warn!(
                contact = %mask_contact(contact),
                purpose = %purpose,
                retry_after_secs = retry_after_secs,
                event = "resend_cooldown",
                "Verification code requested again before the cooldown elapsed"
            );
            return Err(DomainError::ResendCooldown { retry_after_secs });
        }

        tracing::info!(
            contact = %mask_contact(contact),
            purpose = %purpose,
            channel = %record.channel,
            session_id = %record.id,
            expires_at = %record.expires_at,
            event = "code_issued",
            "Issued new verification code"
        );

        Ok(IssuedCode {
            code: record.code,
            contact: record.contact,
            purpose,
            channel: record.channel,
            expires_at: record.expires_at,
            next_resend_at: now + cooldown,
        })
    }

    /// Check a supplied code.
    ///
    /// Expired records and records past the attempt limit are removed as a
    /// side effect. A mismatch is counted. Presenting the correct code for
    /// an already verified record succeeds again without changing it.
    pub async fn verify(&self, contact: &str, purpose: Purpose, code: &str) -> DomainResult<VerifyCodeResult> {
        let now = self.clock.now();
        let max_attempts = self.config.max_attempts;
        let key = RecordKey::new(contact, purpose);

        let result = self
            .store
            .update(&key, |slot| {
                let Some(record) = slot.as_mut() else {
                    return VerifyCodeResult::Failed(VerificationFailure::NotFound);
                };
                if record.is_expired_at(now) {
                    *slot = None;
                    return VerifyCodeResult::Failed(VerificationFailure::Expired);
                }
                if record.attempts >= max_attempts {
                    *slot = None;
                    return VerifyCodeResult::Failed(VerificationFailure::AttemptsExceeded);
                }
                if record.matches(code) {
                    record.mark_verified(now);
                    return VerifyCodeResult::verified(record);
                }
                record.attempts += 1;
                VerifyCodeResult::Failed(VerificationFailure::Mismatch {
                    attempts: record.attempts,
                    remaining: record.remaining_attempts(max_attempts),
                })
            })
            .await?;

        match &result {
            VerifyCodeResult::Verified { .. } => tracing::info!(
                contact = %mask_contact(contact),
                purpose = %purpose,
                event = "code_verified",
                "Verification code accepted"
            ),
            VerifyCodeResult::Failed(failure) => tracing::warn!(
                contact = %mask_contact(contact),
                purpose = %purpose,
                reason = failure.code(),
                event = "code_rejected",
                "Verification code rejected"
            ),
        }

        Ok(result)
    }

    /// Whether a live, verified record exists
    pub async fn is_verified(&self, contact: &str, purpose: Purpose) -> DomainResult<bool> {
        let now = self.clock.now();
        let record = self.store.get(&RecordKey::new(contact, purpose)).await?;
        Ok(record.is_some_and(|record| record.verified && !record.is_expired_at(now)))
    }

    /// Remove the record unconditionally; returns whether one existed
    pub async fn clear(&self, contact: &str, purpose: Purpose) -> DomainResult<bool> {
        let removed = self.store.remove(&RecordKey::new(contact, purpose)).await?;
        if removed.is_some() {
            tracing::debug!(
                contact = %mask_contact(contact),
                purpose = %purpose,
                event = "code_cleared",
                "Verification record cleared"
            );
        }
        Ok(removed.is_some())
    }

    /// Remove the record only if it is verified and still live.
    ///
    /// Callers completing a password reset or id lookup use this so one
    /// verification authorizes exactly one operation.
    pub async fn consume(&self, contact: &str, purpose: Purpose) -> DomainResult<bool> {
        let now = self.clock.now();
        let consumed = self
            .store
            .update(&RecordKey::new(contact, purpose), |slot| match slot.as_ref() {
                Some(record) if record.is_expired_at(now) => {
                    *slot = None;
                    false
                }
                Some(record) if record.verified => {
                    *slot = None;
                    true
                }
                _ => false,
            })
            .await?;

        if consumed {
            tracing::info!(
                contact = %mask_contact(contact),
                purpose = %purpose,
                event = "verification_consumed",
                "Verified record consumed"
            );
        }
        Ok(consumed)
    }

    /// Current live record, if any, without side effects
    pub async fn peek(&self, contact: &str, purpose: Purpose) -> DomainResult<Option<CodeSnapshot>> {
        let now = self.clock.now();
        let record = self.store.get(&RecordKey::new(contact, purpose)).await?;
        Ok(record
            .filter(|record| !record.is_expired_at(now))
            .map(|record| CodeSnapshot {
                time_left: record.time_left_secs(now),
                code: record.code,
                expires_at: record.expires_at,
                attempts: record.attempts,
                verified: record.verified,
            }))
    }

    /// Remove every expired record; returns how many were removed
    pub async fn sweep_expired(&self) -> DomainResult<usize> {
        let removed = self.store.purge_expired(self.clock.now()).await?;
        if removed > 0 {
            tracing::info!(removed = removed, event = "expired_codes_swept", "Removed expired verification records");
        }
        Ok(removed)
    }

    /// Generate a uniformly distributed 6-digit code from the OS CSPRNG
    pub fn generate_secure_code() -> String {
        let code: u32 = OsRng.gen_range(0..1_000_000);
        format!("{:06}", code)
    }
}

fn to_chrono(duration: Duration) -> ChronoDuration {
    ChronoDuration::from_std(duration).unwrap_or_else(|_| ChronoDuration::days(365 * 100))
}

fn ceil_secs(duration: ChronoDuration) -> u64 {
    let millis = duration.num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}
