//! Common error types for Roadwatch

use thiserror::Error;

/// Common result type for Roadwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the sighting repository
#[derive(Error, Debug)]
pub enum Error {
    /// Required field missing or out of range; raised before any write is attempted
    #[error("Invalid sighting: {0}")]
    Validation(String),

    /// Backend rejected or failed a write (message is the backend's, verbatim)
    #[error("{0}")]
    Persistence(String),

    /// Read or transport failure (message is the backend's, verbatim)
    #[error("{0}")]
    Fetch(String),

    /// Delete target does not exist
    #[error("Sighting not found: {0}")]
    NotFound(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_messages_are_verbatim() {
        let err = Error::Persistence("animal, latitude, and longitude are required".to_string());
        assert_eq!(err.to_string(), "animal, latitude, and longitude are required");

        let err = Error::Fetch("Failed to fetch sightings".to_string());
        assert_eq!(err.to_string(), "Failed to fetch sightings");
    }

    #[test]
    fn test_validation_message_is_prefixed() {
        let err = Error::Validation("latitude is required".to_string());
        assert_eq!(err.to_string(), "Invalid sighting: latitude is required");
    }
}
