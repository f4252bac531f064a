//! Verification route handlers
//!
//! - Sending codes by email and SMS
//! - Verifying submitted codes
//! - Reading the current code in development

pub mod dev_code;
pub mod send_code;
pub mod verify_code;

use std::sync::Arc;

use af_core::services::{VerificationFlow, VerificationStore};
use af_shared::Environment;

/// Application state that holds shared services
pub struct AppState<S: VerificationStore> {
    pub flow: Arc<VerificationFlow<S>>,
    pub environment: Environment,
}

impl<S: VerificationStore> AppState<S> {
    pub fn new(flow: Arc<VerificationFlow<S>>, environment: Environment) -> Self {
        Self { flow, environment }
    }
}

/// Whole seconds from `now` until `at`, rounded up, never negative
pub(crate) fn seconds_until(at: chrono::DateTime<chrono::Utc>, now: chrono::DateTime<chrono::Utc>) -> u64 {
    let millis = (at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_seconds_until_rounds_up() {
        let now = Utc::now();
        assert_eq!(seconds_until(now + Duration::milliseconds(59_001), now), 60);
        assert_eq!(seconds_until(now + Duration::seconds(300), now), 300);
        assert_eq!(seconds_until(now - Duration::seconds(5), now), 0);
    }
}
