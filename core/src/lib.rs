//! # AmuseFit Core
//!
//! Core business logic for the AmuseFit verification subsystem.
//! This crate contains the verification record entity, the code store
//! service and its storage abstraction, the expiry sweeper, the notification
//! delivery dispatcher with its message templates, and the error taxonomy.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
