//! Action handler trait.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ToolDefinition;
use crate::error::HandlerError;
use crate::message::Params;

/// Core trait for actions.
///
/// Handlers run synchronously on the owning context, one at a time, so an
/// implementation may assume non-reentrant access to whatever state it
/// touches. Any type-directed coercion of `params` belongs in the handler.
pub trait ActionHandler: Send + Sync {
    /// Returns the action definition.
    fn definition(&self) -> &ToolDefinition;

    /// Execute the action.
    fn call(&self, params: &Params) -> Result<Value, HandlerError>;
}

/// Adapter turning a closure into an [`ActionHandler`].
pub struct FnAction<F> {
    definition: ToolDefinition,
    handler: F,
}

impl<F> FnAction<F>
where
    F: Fn(&Params) -> Result<Value, HandlerError> + Send + Sync,
{
    /// Wrap a closure with its definition.
    pub fn new(definition: ToolDefinition, handler: F) -> Self {
        Self {
            definition,
            handler,
        }
    }
}

impl<F> ActionHandler for FnAction<F>
where
    F: Fn(&Params) -> Result<Value, HandlerError> + Send + Sync,
{
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn call(&self, params: &Params) -> Result<Value, HandlerError> {
        (self.handler)(params)
    }
}

/// Decode params into a typed struct.
pub fn decode_params<T: DeserializeOwned>(params: &Params) -> Result<T, HandlerError> {
    Ok(serde_json::from_value(Value::Object(params.clone()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_fn_action_call() {
        let action = FnAction::new(ToolDefinition::new("echo", "Echo"), |p: &Params| {
            Ok(Value::Object(p.clone()))
        });
        let result = action.call(&params(json!({"a": 1}))).unwrap();
        assert_eq!(result, json!({"a": 1}));
        assert_eq!(action.definition().name, "echo");
    }

    #[test]
    fn test_fn_action_error() {
        let action = FnAction::new(ToolDefinition::new("fail", ""), |_: &Params| {
            Err(HandlerError::failed("nope"))
        });
        let err = action.call(&Params::new()).unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[derive(Debug, Deserialize)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn test_decode_params() {
        let pos: Position = decode_params(&params(json!({"x": 1.5, "y": -2}))).unwrap();
        assert_eq!(pos.x, 1.5);
        assert_eq!(pos.y, -2.0);
    }

    #[test]
    fn test_decode_params_missing_field() {
        let err = decode_params::<Position>(&params(json!({"x": 1}))).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParameters(_)));
    }
}
