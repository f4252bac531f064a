//! Domain entities representing core business objects.

pub mod verification_code;

// Re-export commonly used types
pub use verification_code::{
    Channel, Purpose, RecordKey, VerificationRecord, CODE_LENGTH, DEFAULT_MAX_ATTEMPTS,
};
