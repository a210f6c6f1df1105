//! Error types for NcedaHub.

use crate::onboarding::OnboardingStep;
use crate::session::SessionError;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("No business record for identity {identity}")]
    NotOnboarded { identity: String },
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },
}

/// Document store failures. All of these are retryable by re-submitting.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Write rejected by store: {0}")]
    WriteRejected(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// User-correctable input errors. These block a step from advancing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Field {field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("Field {field} cannot be set during step {current}")]
    WrongStep {
        field: &'static str,
        current: OnboardingStep,
    },

    #[error("Cannot advance from {from}: {reason}")]
    InvalidTransition {
        from: OnboardingStep,
        reason: &'static str,
    },

    #[error("Transaction amount must be greater than zero, got {amount}")]
    NonPositiveAmount { amount: String },

    #[error("Total {field} is too large to compute")]
    TotalOverflow { field: &'static str },
}

/// Out-of-domain input: unknown enum values or request bodies that do not
/// decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInputError {
    #[error("Unknown revenue band: {0:?}")]
    RevenueBand(String),

    #[error("Malformed request body: {0}")]
    Body(String),
}

/// Identity provider failures.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Failed to issue anonymous identity: {0}")]
    IssueFailed(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
