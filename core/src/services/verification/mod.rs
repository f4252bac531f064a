//! Verification code store
//!
//! This module owns the lifecycle of one-time codes:
//! - Code generation and issuance with a resend cooldown
//! - Verification with attempt tracking and revocation
//! - Verified-state queries and single-use consumption
//! - Periodic removal of expired records

mod config;
mod memory_store;
mod service;
mod sweeper;
mod traits;
mod types;


pub use config::VerificationServiceConfig;
pub use memory_store::InMemoryVerificationStore;
pub use service::VerificationService;
pub use sweeper::{ExpirySweeper, SweeperHandle};
pub use traits::VerificationStore;
pub use types::{CodeSnapshot, IssuedCode, VerificationFailure, VerifyCodeResult};
