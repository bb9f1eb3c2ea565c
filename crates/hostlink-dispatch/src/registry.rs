//! Immutable action registry.
//!
//! Built once at startup through [`ActionRegistryBuilder`]; after `build` the
//! map is never mutated, so lookups from the owning context need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use hostlink_protocols::{ActionHandler, FnAction, HandlerError, Params, ToolDefinition};
use serde_json::Value;
use tracing::debug;

use crate::error::{DispatchError, DispatchResult};

/// Name of the built-in discovery action.
pub const LIST_ACTIONS: &str = "listActions";

/// Read-only mapping from action name to handler.
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Start building a registry.
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    /// Look up a handler by action name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ActionHandler>> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Definitions of every registered action, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .actions
            .values()
            .map(|handler| handler.definition().clone())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

/// Builder for [`ActionRegistry`].
#[derive(Default)]
pub struct ActionRegistryBuilder {
    actions: HashMap<String, Arc<dyn ActionHandler>>,
    discovery: bool,
}

impl ActionRegistryBuilder {
    /// Register a handler under its definition's name.
    pub fn register(mut self, handler: Arc<dyn ActionHandler>) -> DispatchResult<Self> {
        let name = handler.definition().name.clone();
        validate_name(&name)?;
        if self.actions.contains_key(&name) {
            return Err(DispatchError::DuplicateAction(name));
        }
        debug!(action = %name, "Action registered");
        self.actions.insert(name, handler);
        Ok(self)
    }

    /// Register a closure with no description or schema.
    pub fn register_action<F>(self, name: impl Into<String>, handler: F) -> DispatchResult<Self>
    where
        F: Fn(&Params) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        let definition = ToolDefinition::new(name, "");
        self.register(Arc::new(FnAction::new(definition, handler)))
    }

    /// Register a closure with full discovery metadata.
    pub fn register_fn<F>(self, definition: ToolDefinition, handler: F) -> DispatchResult<Self>
    where
        F: Fn(&Params) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnAction::new(definition, handler)))
    }

    /// Add the built-in `listActions` discovery action.
    pub fn with_discovery(mut self) -> Self {
        self.discovery = true;
        self
    }

    /// Freeze the registry.
    pub fn build(self) -> DispatchResult<ActionRegistry> {
        let mut actions = self.actions;

        if self.discovery {
            if actions.contains_key(LIST_ACTIONS) {
                return Err(DispatchError::DuplicateAction(LIST_ACTIONS.to_string()));
            }
            let discovery = discovery_action(&actions);
            actions.insert(LIST_ACTIONS.to_string(), discovery);
        }

        Ok(ActionRegistry { actions })
    }
}

fn validate_name(name: &str) -> DispatchResult<()> {
    if name.is_empty() || name.trim() != name {
        return Err(DispatchError::InvalidActionName(name.to_string()));
    }
    Ok(())
}

/// The listing is computed once, since the registry cannot change after build.
fn discovery_action(actions: &HashMap<String, Arc<dyn ActionHandler>>) -> Arc<dyn ActionHandler> {
    let definition = ToolDefinition::new(LIST_ACTIONS, "List every available action")
        .with_parameters_schema(serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        }));

    let mut listed: Vec<Value> = actions
        .values()
        .map(|handler| {
            let def = handler.definition();
            serde_json::json!({
                "name": def.name,
                "description": def.description,
                "parameters": def.schema_or_empty(),
            })
        })
        .collect();
    listed.push(serde_json::json!({
        "name": definition.name,
        "description": definition.description,
        "parameters": definition.schema_or_empty(),
    }));
    listed.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
    let listing = serde_json::json!({ "actions": listed });

    Arc::new(FnAction::new(definition, move |_: &Params| Ok(listing.clone())))
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
