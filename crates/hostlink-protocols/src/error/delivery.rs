//! Response delivery errors.

use thiserror::Error;

/// Failure to hand a response to a connection's writer.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Connection closed: {0}")]
    Closed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_display() {
        let err = DeliveryError::Closed("conn-1".to_string());
        assert!(err.to_string().contains("conn-1"));
    }
}
