//! Types for verification service results

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::verification_code::{Channel, Purpose, VerificationRecord};

/// A freshly issued code
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: String,
    pub contact: String,
    pub purpose: Purpose,
    pub channel: Channel,
    pub expires_at: DateTime<Utc>,
    /// When the next code for this contact and purpose may be requested
    pub next_resend_at: DateTime<Utc>,
}

/// Why a verification attempt did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationFailure {
    /// No code was issued, or it was cleared
    NotFound,
    /// The code outlived its TTL; the record has been removed
    Expired,
    /// Too many wrong codes; the record has been removed
    AttemptsExceeded,
    /// Wrong code; the attempt was counted
    Mismatch { attempts: u32, remaining: u32 },
}

impl VerificationFailure {
    pub fn code(&self) -> &'static str {
        match self {
            VerificationFailure::NotFound => "CODE_NOT_FOUND",
            VerificationFailure::Expired => "CODE_EXPIRED",
            VerificationFailure::AttemptsExceeded => "ATTEMPTS_EXCEEDED",
            VerificationFailure::Mismatch { .. } => "CODE_MISMATCH",
        }
    }
}

/// Result of verifying a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyCodeResult {
    Verified {
        verified_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    Failed(VerificationFailure),
}

impl VerifyCodeResult {
    pub(crate) fn verified(record: &VerificationRecord) -> Self {
        VerifyCodeResult::Verified {
            verified_at: record.verified_at.unwrap_or(record.created_at),
            expires_at: record.expires_at,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyCodeResult::Verified { .. })
    }

    pub fn failure(&self) -> Option<VerificationFailure> {
        match self {
            VerifyCodeResult::Verified { .. } => None,
            VerifyCodeResult::Failed(failure) => Some(*failure),
        }
    }
}

/// Read-only view of a live record, for development tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnapshot {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub time_left: u64,
    pub attempts: u32,
    pub verified: bool,
}
