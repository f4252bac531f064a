//! Shared utilities and common types for the AmuseFit server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types loaded from the environment
//! - Contact utilities (email / phone normalization, validation and masking)
//! - Language negotiation for localized messages

pub mod config;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, CorsConfig, DeliveryConfig, Environment, LogFormat, LoggingConfig,
    ServerConfig, StoreBackend, VerificationConfig,
};
pub use types::Language;
pub use utils::contact;
