//! Action registration for the hostlink demo host.

use std::sync::Arc;

use serde_json::{json, Value};

use hostlink_dispatch::{ActionRegistry, DispatchResult};
use hostlink_protocols::{Params, ToolDefinition};

use crate::scene::{self, SceneStore};

/// Name reported by `getSceneInfo`.
pub(crate) const SCENE_NAME: &str = "hostlink";

/// Build the registry served by `hostlink run` and listed by `hostlink actions`.
pub(crate) fn build_registry(store: Arc<SceneStore>) -> DispatchResult<ActionRegistry> {
    let builder = ActionRegistry::builder()
        .with_discovery()
        .register_fn(
            ToolDefinition::new("ping", "Liveness check; replies with pong"),
            |_: &Params| Ok(json!({"message": "pong"})),
        )?
        .register_fn(
            ToolDefinition::new("echo", "Return the request parameters unchanged").with_parameters_schema(
                json!({"type": "object", "additionalProperties": true}),
            ),
            |params: &Params| Ok(Value::Object(params.clone())),
        )?;

    let registry = scene::register(builder, store)?.build()?;
    tracing::debug!(actions = ?registry.names(), "Registry built");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostlink_dispatch::LIST_ACTIONS;
    use hostlink_protocols::ActionHandler;

    fn registry() -> ActionRegistry {
        build_registry(Arc::new(SceneStore::new(SCENE_NAME))).unwrap()
    }

    #[test]
    fn test_registry_contains_demo_actions() {
        let registry = registry();
        assert_eq!(
            registry.names(),
            vec![
                "createObject",
                "deleteObject",
                "echo",
                "getSceneInfo",
                LIST_ACTIONS,
                "ping",
                "setTransform",
            ]
        );
    }

    #[test]
    fn test_ping() {
        let result = registry().get("ping").unwrap().call(&Params::new()).unwrap();
        assert_eq!(result, json!({"message": "pong"}));
    }

    #[test]
    fn test_echo_returns_params() {
        let mut params = Params::new();
        params.insert("nested".to_string(), json!({"a": [1, 2]}));
        let result = registry().get("echo").unwrap().call(&params).unwrap();
        assert_eq!(result, json!({"nested": {"a": [1, 2]}}));
    }

    #[test]
    fn test_discovery_lists_schemas() {
        let listing = registry()
            .get(LIST_ACTIONS)
            .unwrap()
            .call(&Params::new())
            .unwrap();
        let create = listing["actions"]
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["name"] == "createObject")
            .unwrap();
        assert_eq!(create["parameters"]["required"], json!(["name"]));
    }
}
