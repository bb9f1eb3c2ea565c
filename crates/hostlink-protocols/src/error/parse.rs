//! Request parse errors.

use thiserror::Error;

/// A text payload that could not be turned into a [`crate::Request`].
///
/// Parse errors are reported to the client; the connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Request must be a JSON object")]
    NotAnObject,

    #[error("Missing request ID")]
    MissingId,

    #[error("Missing action")]
    MissingAction,

    #[error("Invalid params: expected a JSON object")]
    InvalidParams,

    #[error("Invalid UTF-8 in text frame")]
    InvalidUtf8,
}
