//! In-memory scene used by the demo action set.
//!
//! State is only ever touched by handlers, and handlers only run on the
//! owning context, so the lock here is never contended in practice.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use hostlink_dispatch::{ActionRegistryBuilder, DispatchResult};
use hostlink_protocols::{decode_params, HandlerError, Params, ToolDefinition};

/// Primitive shapes accepted by `createObject`. Omitting `type` creates an empty object.
const PRIMITIVES: &[&str] = &["Cube", "Sphere", "Capsule", "Cylinder", "Plane", "Quad"];

const EMPTY_KIND: &str = "Empty";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct Vec3 {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Vec3 {
    const ONE: Self = Self {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };
}

/// A named object in the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SceneObject {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

#[derive(Debug, Default)]
struct SceneState {
    objects: BTreeMap<String, SceneObject>,
    next_id: u64,
}

/// Named collection of scene objects keyed by object name.
#[derive(Debug)]
pub(crate) struct SceneStore {
    name: String,
    state: Mutex<SceneState>,
}

impl SceneStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(SceneState::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().objects.len()
    }

    fn create(&self, params: CreateParams) -> Result<SceneObject, HandlerError> {
        let kind = match params.kind {
            Some(kind) if PRIMITIVES.contains(&kind.as_str()) => kind,
            Some(kind) => {
                return Err(HandlerError::invalid_params(format!(
                    "unknown primitive type '{kind}'"
                )));
            }
            None => EMPTY_KIND.to_string(),
        };

        let mut state = self.state.lock();
        if state.objects.contains_key(&params.name) {
            return Err(HandlerError::failed(format!(
                "Object '{}' already exists",
                params.name
            )));
        }
        state.next_id += 1;
        let object = SceneObject {
            id: state.next_id,
            name: params.name.clone(),
            kind,
            position: params.position.unwrap_or_default(),
            rotation: Vec3::default(),
            scale: Vec3::ONE,
        };
        state.objects.insert(params.name, object.clone());
        Ok(object)
    }

    fn delete(&self, name: &str) -> Result<SceneObject, HandlerError> {
        self.state
            .lock()
            .objects
            .remove(name)
            .ok_or_else(|| HandlerError::NotFound(format!("object '{name}'")))
    }

    fn set_transform(&self, params: TransformParams) -> Result<SceneObject, HandlerError> {
        let mut state = self.state.lock();
        let object = state
            .objects
            .get_mut(&params.object_name)
            .ok_or_else(|| HandlerError::NotFound(format!("object '{}'", params.object_name)))?;
        if let Some(position) = params.position {
            object.position = position;
        }
        if let Some(rotation) = params.rotation {
            object.rotation = rotation;
        }
        if let Some(scale) = params.scale {
            object.scale = scale;
        }
        Ok(object.clone())
    }

    fn info(&self) -> Value {
        let state = self.state.lock();
        let objects: Vec<&SceneObject> = state.objects.values().collect();
        json!({
            "sceneName": self.name,
            "objects": objects,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreateParams {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    position: Option<Vec3>,
}

#[derive(Debug, Deserialize)]
struct NameParams {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransformParams {
    object_name: String,
    position: Option<Vec3>,
    rotation: Option<Vec3>,
    scale: Option<Vec3>,
}

fn vec3_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "x": {"type": "number"},
            "y": {"type": "number"},
            "z": {"type": "number"}
        }
    })
}

/// Register the scene actions against `store`.
pub(crate) fn register(
    builder: ActionRegistryBuilder,
    store: Arc<SceneStore>,
) -> DispatchResult<ActionRegistryBuilder> {
    let create_store = Arc::clone(&store);
    let delete_store = Arc::clone(&store);
    let transform_store = Arc::clone(&store);

    builder
        .register_fn(
            ToolDefinition::new("createObject", "Create a named object in the scene")
                .with_parameters_schema(json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "type": {"type": "string", "enum": PRIMITIVES},
                        "position": vec3_schema()
                    },
                    "required": ["name"]
                })),
            move |params: &Params| {
                let object = create_store.create(decode_params(params)?)?;
                let Vec3 { x, y, z } = object.position;
                Ok(json!({
                    "objectId": object.id,
                    "message": format!("Created {} '{}' at position ({x}, {y}, {z})", object.kind, object.name),
                }))
            },
        )?
        .register_fn(
            ToolDefinition::new("deleteObject", "Remove an object from the scene by name")
                .with_parameters_schema(json!({
                    "type": "object",
                    "properties": {"name": {"type": "string"}},
                    "required": ["name"]
                })),
            move |params: &Params| {
                let NameParams { name } = decode_params(params)?;
                let object = delete_store.delete(&name)?;
                Ok(json!({"deleted": object.name, "objectId": object.id}))
            },
        )?
        .register_fn(
            ToolDefinition::new(
                "setTransform",
                "Update the position, rotation or scale of an object",
            )
            .with_parameters_schema(json!({
                "type": "object",
                "properties": {
                    "objectName": {"type": "string"},
                    "position": vec3_schema(),
                    "rotation": vec3_schema(),
                    "scale": vec3_schema()
                },
                "required": ["objectName"]
            })),
            move |params: &Params| {
                let object = transform_store.set_transform(decode_params(params)?)?;
                Ok(json!({
                    "message": format!("Updated transform of {}", object.name),
                    "object": object,
                }))
            },
        )?
        .register_fn(
            ToolDefinition::new("getSceneInfo", "Describe the scene and every object in it"),
            move |_: &Params| Ok(store.info()),
        )
}
