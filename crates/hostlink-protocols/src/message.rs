//! Request and response bodies.
//!
//! Requests arrive as `{"id": "...", "action": "...", "params": {...}}`.
//! Responses carry the echoed id plus exactly one of `result` or `error`:
//!
//! ```text
//! {"id": "7", "result": {...}}
//! {"id": "7", "error": "Unknown action: spin"}
//! {"error": "Invalid JSON: ..."}            // no id could be read
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;

/// Action parameters: an opaque key-value mapping.
pub type Params = serde_json::Map<String, Value>;

/// A well-formed client request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id, echoed back verbatim. Never empty.
    pub id: String,
    /// Registered action name. Never empty.
    pub action: String,
    /// Action-specific parameters.
    #[serde(default)]
    pub params: Params,
}

impl Request {
    /// Create a request with empty params.
    pub fn new(id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            params: Params::new(),
        }
    }

    /// Set the params.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Parse and validate a text payload.
    ///
    /// Validation order: JSON syntax, object shape, `id`, `action`, `params`.
    /// Once the id has been read, every later failure carries it so the
    /// client can still correlate the error.
    pub fn parse(text: &str) -> Result<Self, RejectedRequest> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| RejectedRequest::anonymous(ParseError::InvalidJson(e.to_string())))?;

        let Value::Object(mut object) = value else {
            return Err(RejectedRequest::anonymous(ParseError::NotAnObject));
        };

        let id = match object.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            // Numeric ids are echoed back as their decimal string.
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(RejectedRequest::anonymous(ParseError::MissingId)),
        };

        let action = match object.remove("action") {
            Some(Value::String(action)) if !action.is_empty() => action,
            _ => return Err(RejectedRequest::with_id(id, ParseError::MissingAction)),
        };

        let params = match object.remove("params") {
            None | Some(Value::Null) => Params::new(),
            Some(Value::Object(params)) => params,
            Some(_) => return Err(RejectedRequest::with_id(id, ParseError::InvalidParams)),
        };

        Ok(Self { id, action, params })
    }
}

/// A payload that failed validation, with the id if one was read.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRequest {
    pub id: Option<String>,
    pub error: ParseError,
}

impl RejectedRequest {
    /// Rejection before any id could be read.
    pub fn anonymous(error: ParseError) -> Self {
        Self { id: None, error }
    }

    /// Rejection after the id was read.
    pub fn with_id(id: impl Into<String>, error: ParseError) -> Self {
        Self {
            id: Some(id.into()),
            error,
        }
    }

    /// Convert into the error response sent back to the client.
    pub fn into_response(self) -> Response {
        Response::error(self.id, self.error.to_string())
    }
}

/// Result or error half of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(String),
}

/// A correlated response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    /// Successful response for the given request id.
    pub fn success(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: Some(id.into()),
            outcome: Outcome::Result(result),
        }
    }

    /// Error response, with or without an id.
    pub fn error(id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            id,
            outcome: Outcome::Error(message.into()),
        }
    }

    /// Error response for a payload whose id could not be read.
    pub fn anonymous_error(message: impl Into<String>) -> Self {
        Self::error(None, message)
    }

    /// Whether this response carries a result.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Result(_))
    }

    /// The result value, if any.
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// The error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(message) => Some(message),
        }
    }

    /// Serialize to the JSON text sent in a frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
