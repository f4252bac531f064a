//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the AmuseFit
//! verification subsystem. It provides concrete implementations for the
//! storage and delivery seams defined in `af_core`.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Cache**: Redis client and the Redis-backed verification store
//! - **Providers**: email and SMS provider integrations, the console fallback,
//!   and the registry that builds the delivery dispatcher from environment credentials
//!
//! ## Features
//!
//! - `twilio-sms`: Enable the Twilio SMS provider (default)
//! - `smtp`: Enable the Gmail and Outlook SMTP providers (default)

/// Cache module - Redis client and verification store
pub mod cache;

/// Notification providers - email APIs, SMTP relays, SMS gateways
pub mod providers;

pub use cache::{RedisClient, RedisVerificationStore};
pub use providers::registry::{build_dispatcher, ProviderSettings};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMTP transport error
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// SMS service error
    #[error("SMS service error: {0}")]
    Sms(String),
}
