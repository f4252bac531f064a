//! Verification record entity for email and SMS one-time codes.

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of the verification code
pub const CODE_LENGTH: usize = 6;

/// Failed attempts tolerated before a code is revoked
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Why a code was requested. Codes issued for one purpose never satisfy another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Resetting a forgotten password
    ResetPassword,
    /// Recovering a forgotten login id
    FindId,
    /// Confirming ownership of an email address at sign-up
    EmailVerify,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::ResetPassword => "reset_password",
            Purpose::FindId => "find_id",
            Purpose::EmailVerify => "email_verify",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "reset_password" | "resetpassword" => Ok(Purpose::ResetPassword),
            "find_id" | "findid" => Ok(Purpose::FindId),
            "email_verify" | "emailverify" | "signup" => Ok(Purpose::EmailVerify),
            _ => Err(format!("Unknown verification purpose: {}", s)),
        }
    }
}

/// Delivery channel for a code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    /// Infer the channel from the shape of a contact
    pub fn for_contact(contact: &str) -> Self {
        if contact.contains('@') {
            Channel::Email
        } else {
            Channel::Sms
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a record: at most one live record exists per key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub contact: String,
    pub purpose: Purpose,
}

impl RecordKey {
    pub fn new(contact: impl Into<String>, purpose: Purpose) -> Self {
        Self {
            contact: contact.into(),
            purpose,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.purpose, self.contact)
    }
}

/// A pending or verified one-time code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Identifier used to correlate log events for one issuance
    pub id: Uuid,

    /// Normalized email address or phone number
    pub contact: String,

    pub purpose: Purpose,

    pub channel: Channel,

    /// The 6-digit code
    pub code: String,

    /// Failed verification attempts so far
    pub attempts: u32,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,

    /// Set once the correct code has been presented
    pub verified: bool,

    pub verified_at: Option<DateTime<Utc>>,
}

impl VerificationRecord {
    /// Creates a fresh, unverified record expiring `ttl` after `now`
    pub fn new(
        contact: impl Into<String>,
        purpose: Purpose,
        code: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let contact = contact.into();
        Self {
            id: Uuid::new_v4(),
            channel: Channel::for_contact(&contact),
            contact,
            purpose,
            code: code.into(),
            attempts: 0,
            created_at: now,
            expires_at: now + ttl,
            verified: false,
            verified_at: None,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.contact.clone(), self.purpose)
    }

    /// A record is expired once `now` is past `expires_at`; the code is
    /// still accepted at the `expires_at` instant itself
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Compares the supplied code in constant time
    pub fn matches(&self, input_code: &str) -> bool {
        constant_time_eq(self.code.as_bytes(), input_code.trim().as_bytes())
    }

    pub fn remaining_attempts(&self, max_attempts: u32) -> u32 {
        max_attempts.saturating_sub(self.attempts)
    }

    /// Lifetime left at `now`, never negative
    pub fn time_left(&self, now: DateTime<Utc>) -> Duration {
        let left = self.expires_at - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    /// Seconds of lifetime left at `now`, rounded up
    pub fn time_left_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = self.time_left(now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }

    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        if !self.verified {
            self.verified = true;
            self.verified_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_at(now: DateTime<Utc>) -> VerificationRecord {
        VerificationRecord::new("coach@amusefit.co.kr", Purpose::FindId, "042917", now, Duration::seconds(600))
    }

    #[test]
    fn test_new_record() {
        let now = Utc::now();
        let record = record_at(now);

        assert_eq!(record.channel, Channel::Email);
        assert_eq!(record.attempts, 0);
        assert!(!record.verified);
        assert!(record.verified_at.is_none());
        assert_eq!(record.expires_at - record.created_at, Duration::seconds(600));
        assert_eq!(record.key().to_string(), "find_id:coach@amusefit.co.kr");
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let record = record_at(now);

        assert!(!record.is_expired_at(now + Duration::seconds(599)));
        assert!(!record.is_expired_at(now + Duration::seconds(600)));
        assert!(record.is_expired_at(now + Duration::seconds(600) + Duration::milliseconds(1)));
        assert_eq!(record.time_left_secs(now + Duration::milliseconds(500)), 600);
        assert_eq!(record.time_left_secs(now + Duration::seconds(700)), 0);
    }

    #[test]
    fn test_matches_trims_input() {
        let record = record_at(Utc::now());
        assert!(record.matches("042917"));
        assert!(record.matches(" 042917 "));
        assert!(!record.matches("42917"));
        assert!(!record.matches("042918"));
    }

    #[test]
    fn test_mark_verified_keeps_first_timestamp() {
        let now = Utc::now();
        let mut record = record_at(now);
        record.mark_verified(now);
        record.mark_verified(now + Duration::seconds(30));
        assert_eq!(record.verified_at, Some(now));
    }

    #[test]
    fn test_purpose_parsing() {
        assert_eq!("reset_password".parse::<Purpose>().unwrap(), Purpose::ResetPassword);
        assert_eq!("find-id".parse::<Purpose>().unwrap(), Purpose::FindId);
        assert_eq!("EMAIL_VERIFY".parse::<Purpose>().unwrap(), Purpose::EmailVerify);
        assert!("login".parse::<Purpose>().is_err());
        assert_eq!(serde_json::to_string(&Purpose::FindId).unwrap(), "\"find_id\"");
    }

    #[test]
    fn test_channel_for_contact() {
        assert_eq!(Channel::for_contact("a@b.co"), Channel::Email);
        assert_eq!(Channel::for_contact("01012345678"), Channel::Sms);
    }
}
