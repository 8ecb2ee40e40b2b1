//! Error types for the chat client.

use optimal_core::error::OptimalError;

/// Errors from the chat client.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<OptimalError> for ChatError {
    fn from(err: OptimalError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

/// Errors from a single message round trip.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("Failed to send message: server responded with {status}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status of a rejected request, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::Storage("disk full".to_string()).to_string(),
            "storage error: disk full"
        );
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let err: ChatError = TransportError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Failed to send message: server responded with 502"
        );
        assert!(matches!(err, ChatError::Transport(_)));
    }

    #[test]
    fn test_transport_error_status() {
        let err = TransportError::Status {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(TransportError::Decode("eof".to_string()).status(), None);
    }

    #[test]
    fn test_chat_error_from_optimal_error() {
        let err: ChatError = OptimalError::Storage("connection lost".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("connection lost"));
    }
}
