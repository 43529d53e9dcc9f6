//! Generation capability errors.
//!
//! The pipeline treats any failure from [`crate::TextGenerator`] identically
//! regardless of which concrete provider backs it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The service answered with a non-success status.
    #[error("API call failed: {status} - {body}")]
    Upstream { status: u16, body: String },

    /// The call never reached the service, or the response was unreadable.
    #[error("network error: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display() {
        let err = GenerateError::Upstream {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_transport_display() {
        let err = GenerateError::Transport("connection refused".to_string());
        assert!(err.to_string().contains("network error"));
        assert!(err.to_string().contains("connection refused"));
    }
}
