//! Error types for replication.

use thiserror::Error;

/// Message used when a failure carries no text of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

/// Message reported when an injection receives a payload without a prior
/// success marker.
pub const INVALID_DATA_FORMAT: &str = "Invalid data format";

/// Errors a replication run can end with.
///
/// Host and script messages are carried verbatim so the caller sees the
/// host's own diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// The addressed context could not be reached.
    #[error("{0}")]
    HostUnavailable(String),

    /// The in-context read reported a failure.
    #[error("{0}")]
    ExtractionFailed(String),

    /// The in-context write reported a failure.
    #[error("{0}")]
    InjectionFailed(String),

    /// No handler exists for the named action.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The inbound message does not have the request shape.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Anything not caught by a more specific variant.
    #[error("{}", internal_message(.0))]
    Internal(String),
}

fn internal_message(message: &str) -> &str {
    if message.is_empty() {
        UNKNOWN_ERROR_MESSAGE
    } else {
        message
    }
}

impl ReplicationError {
    /// Text reported to the caller.
    pub fn message(&self) -> String {
        let message = self.to_string();
        if message.is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Result type for replication operations.
pub type Result<T> = std::result::Result<T, ReplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_text_is_verbatim() {
        let err = ReplicationError::HostUnavailable("No tab with id: 2.".into());
        assert_eq!(err.message(), "No tab with id: 2.");
    }

    #[test]
    fn test_empty_messages_become_unknown_error() {
        assert_eq!(ReplicationError::Internal(String::new()).message(), UNKNOWN_ERROR_MESSAGE);
        assert_eq!(
            ReplicationError::HostUnavailable(String::new()).message(),
            UNKNOWN_ERROR_MESSAGE
        );
    }
}
