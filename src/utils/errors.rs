// src/utils/errors.rs
//! Error taxonomy for the SDK
//!
//! None of these reach code calling the tracking facade: the facade logs
//! and swallows them. They surface from the lower-level components and from
//! client construction.

use thiserror::Error;

/// SDK error
#[derive(Debug, Error)]
pub enum TokebiError {
    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Player identifier could not be read or persisted
    #[error("identity store error: {0}")]
    IdentityFailed(String),

    /// Game registration exchange failed (network or response)
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    /// Batch submission failed
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    /// Payload or batch could not be rendered as JSON
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
}

impl From<serde_json::Error> for TokebiError {
    fn from(e: serde_json::Error) -> Self {
        TokebiError::SerializationFailed(e.to_string())
    }
}

impl From<config::ConfigError> for TokebiError {
    fn from(e: config::ConfigError) -> Self {
        TokebiError::ConfigError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TokebiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TokebiError::DeliveryFailed("HTTP 500".to_string());
        assert_eq!(err.to_string(), "delivery failed: HTTP 500");
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TokebiError = json_err.into();
        assert!(matches!(err, TokebiError::SerializationFailed(_)));
    }
}
