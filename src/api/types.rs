use serde::{Deserialize, Serialize};

use crate::behaviors::{BehaviorEdit, BehaviorKind, Trigger};
use crate::controller::{EntityEdit, HistorySummary};
use crate::model::{Choice, Scene, ValueMap};

#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn ok() -> ApiResponse<String> {
        ApiResponse {
            ok: true,
            data: Some("ok".to_string()),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> ApiResponse<String> {
        ApiResponse::failure(msg)
    }
}

// === Scene API types ===

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SelectSceneRequest {
    pub scene_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AddSceneRequest {
    pub name: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SceneView {
    pub scene: Scene,
    pub selected_entity_id: Option<String>,
}

// === Entity API types ===

/// Palette placement. Optional fields override the preset for `kind`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateEntityRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub layer: Option<i32>,
    #[serde(default)]
    pub properties: ValueMap,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EntityEditRequest {
    pub edits: Vec<EntityEdit>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    #[serde(default)]
    pub entity_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EntityCreated {
    pub id: String,
}

// === Behavior API types ===

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AddBehaviorRequest {
    #[serde(rename = "type")]
    pub kind: BehaviorKind,
    #[serde(default)]
    pub trigger: Option<Trigger>,
    #[serde(default)]
    pub parameters: ValueMap,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BehaviorEditRequest {
    pub edits: Vec<BehaviorEdit>,
}

// === Project API types ===

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ComponentChoiceRequest {
    pub component_id: String,
    /// `null` clears the choice.
    #[serde(default)]
    pub choice: Option<Choice>,
}

/// Without a template the open project is uploaded as is. With one, the
/// editor first switches to a fresh project built from it.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CreateProjectBody {
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct UndoResponse {
    pub applied: bool,
    pub history: HistorySummary,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub file_name: String,
    pub path: String,
    pub contents: String,
}
