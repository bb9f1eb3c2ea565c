//! Action handler errors.

use thiserror::Error;

/// Failure reported by a business action.
///
/// The `Display` output is exactly what the client sees in the `error`
/// field of the response.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    ExecutionFailed(String),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Shorthand for an execution failure with a plain message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed(message.into())
    }

    /// Shorthand for a parameter validation failure.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParameters(message.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidParameters(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failed_is_bare_message() {
        let err = HandlerError::failed("Object 'Cube' not found");
        assert_eq!(err.to_string(), "Object 'Cube' not found");
    }

    #[test]
    fn test_invalid_parameters_display() {
        let err = HandlerError::invalid_params("missing field `name`");
        assert!(err.to_string().starts_with("Invalid parameters"));
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_not_found_display() {
        let err = HandlerError::NotFound("Sphere".to_string());
        assert_eq!(err.to_string(), "Not found: Sphere");
    }

    #[test]
    fn test_panicked_display() {
        let err = HandlerError::Panicked("index out of bounds".to_string());
        assert!(err.to_string().contains("panicked"));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = HandlerError::from(json_err);
        assert!(matches!(err, HandlerError::InvalidParameters(_)));
    }
}
