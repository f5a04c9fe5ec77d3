//! Behavior registry: behavior kinds, trigger bindings, default parameter
//! tables and typed parameter views.
//!
//! Parameters are stored as an open map so documents written by the frontend
//! round-trip untouched. Built-in kinds additionally parse into typed structs
//! through [`BehaviorParams::parse`], which is how edits get validated.

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::ValueMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BehaviorKind {
    Move,
    Patrol,
    Follow,
    Rotate,
    Bounce,
    Jump,
    Shoot,
    Collect,
    Spawn,
    Destroy,
    /// Kinds the registry does not know. Accepted without defaults.
    Custom(String),
}

impl BehaviorKind {
    pub fn builtin() -> [BehaviorKind; 10] {
        [
            BehaviorKind::Move,
            BehaviorKind::Patrol,
            BehaviorKind::Follow,
            BehaviorKind::Rotate,
            BehaviorKind::Bounce,
            BehaviorKind::Jump,
            BehaviorKind::Shoot,
            BehaviorKind::Collect,
            BehaviorKind::Spawn,
            BehaviorKind::Destroy,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            BehaviorKind::Move => "move",
            BehaviorKind::Patrol => "patrol",
            BehaviorKind::Follow => "follow",
            BehaviorKind::Rotate => "rotate",
            BehaviorKind::Bounce => "bounce",
            BehaviorKind::Jump => "jump",
            BehaviorKind::Shoot => "shoot",
            BehaviorKind::Collect => "collect",
            BehaviorKind::Spawn => "spawn",
            BehaviorKind::Destroy => "destroy",
            BehaviorKind::Custom(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "move" => BehaviorKind::Move,
            "patrol" => BehaviorKind::Patrol,
            "follow" => BehaviorKind::Follow,
            "rotate" => BehaviorKind::Rotate,
            "bounce" => BehaviorKind::Bounce,
            "jump" => BehaviorKind::Jump,
            "shoot" => BehaviorKind::Shoot,
            "collect" => BehaviorKind::Collect,
            "spawn" => BehaviorKind::Spawn,
            "destroy" => BehaviorKind::Destroy,
            other => BehaviorKind::Custom(other.to_string()),
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, BehaviorKind::Custom(_))
    }
}

impl From<String> for BehaviorKind {
    fn from(value: String) -> Self {
        BehaviorKind::parse(&value)
    }
}

impl From<BehaviorKind> for String {
    fn from(value: BehaviorKind) -> Self {
        value.as_str().to_string()
    }
}

/// Condition gating when a behavior runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Trigger {
    #[default]
    Always,
    OnClick,
    OnCollision {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        with: Option<String>,
    },
    OnKeyPress {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
    OnTimer {
        #[serde(default = "default_interval_ms", rename = "intervalMs")]
        interval_ms: u64,
    },
    OnEvent {
        #[serde(default)]
        name: String,
    },
}

fn default_interval_ms() -> u64 {
    1000
}

/// One behavior attached to an entity.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EntityBehavior {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BehaviorKind,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub parameters: ValueMap,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Registry row exposed to behavior palettes.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct BehaviorDefaults {
    #[serde(rename = "type")]
    pub kind: BehaviorKind,
    pub parameters: ValueMap,
    pub trigger: Trigger,
}

fn object(value: serde_json::Value) -> ValueMap {
    match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => ValueMap::new(),
    }
}

/// Default parameter table. Custom kinds have none.
pub fn default_parameters(kind: &BehaviorKind) -> ValueMap {
    let value = match kind {
        BehaviorKind::Move => serde_json::json!({ "speed": 5, "direction": "right" }),
        BehaviorKind::Patrol => serde_json::json!({ "speed": 2, "distance": 100 }),
        BehaviorKind::Follow => serde_json::json!({ "speed": 3, "target": "player" }),
        BehaviorKind::Rotate => serde_json::json!({ "speed": 2 }),
        BehaviorKind::Bounce => serde_json::json!({ "height": 10, "speed": 2 }),
        BehaviorKind::Jump => serde_json::json!({ "force": 15 }),
        BehaviorKind::Shoot => serde_json::json!({
            "projectileSpeed": 10,
            "cooldownMs": 500,
            "direction": "right",
        }),
        BehaviorKind::Collect => serde_json::json!({ "points": 10 }),
        BehaviorKind::Spawn => serde_json::json!({
            "entityType": "enemy",
            "intervalMs": 2000,
            "maxCount": 5,
        }),
        BehaviorKind::Destroy => serde_json::json!({ "delayMs": 0 }),
        BehaviorKind::Custom(_) => serde_json::json!({}),
    };
    object(value)
}

pub fn default_trigger(kind: &BehaviorKind) -> Trigger {
    match kind {
        BehaviorKind::Jump => Trigger::OnKeyPress {
            key: Some("space".to_string()),
        },
        BehaviorKind::Shoot => Trigger::OnKeyPress {
            key: Some("x".to_string()),
        },
        BehaviorKind::Collect => Trigger::OnCollision {
            with: Some("player".to_string()),
        },
        BehaviorKind::Destroy => Trigger::OnCollision { with: None },
        BehaviorKind::Spawn => Trigger::OnTimer { interval_ms: 2000 },
        _ => Trigger::Always,
    }
}

pub fn catalog() -> Vec<BehaviorDefaults> {
    BehaviorKind::builtin()
        .into_iter()
        .map(|kind| BehaviorDefaults {
            parameters: default_parameters(&kind),
            trigger: default_trigger(&kind),
            kind,
        })
        .collect()
}

/// `behavior_{unix_millis}_{4 hex digits}`.
pub fn new_behavior_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let suffix: u16 = rand::thread_rng().gen();
    format!("behavior_{millis}_{suffix:04x}")
}

/// Creates a behavior with a fresh id. Explicit parameters win over the
/// registry defaults key by key.
pub fn create_behavior(
    kind: BehaviorKind,
    trigger: Option<Trigger>,
    overrides: ValueMap,
) -> EntityBehavior {
    create_behavior_with_id(new_behavior_id(), kind, trigger, overrides)
}

pub fn create_behavior_with_id(
    id: impl Into<String>,
    kind: BehaviorKind,
    trigger: Option<Trigger>,
    overrides: ValueMap,
) -> EntityBehavior {
    let mut parameters = default_parameters(&kind);
    parameters.extend(overrides);
    EntityBehavior {
        id: id.into(),
        trigger: trigger.unwrap_or_else(|| default_trigger(&kind)),
        kind,
        parameters,
        enabled: true,
    }
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    #[default]
    Right,
    Up,
    Down,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct MoveParams {
    pub speed: f64,
    pub direction: Direction,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct PatrolParams {
    pub speed: f64,
    pub distance: f64,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct FollowParams {
    pub speed: f64,
    pub target: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct RotateParams {
    pub speed: f64,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct BounceParams {
    pub height: f64,
    pub speed: f64,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct JumpParams {
    pub force: f64,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShootParams {
    pub projectile_speed: f64,
    pub cooldown_ms: u64,
    pub direction: Direction,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct CollectParams {
    pub points: i64,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpawnParams {
    pub entity_type: String,
    pub interval_ms: u64,
    pub max_count: u32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DestroyParams {
    pub delay_ms: u64,
}

/// Typed view over a behavior's parameter map.
#[derive(Clone, Debug, PartialEq)]
pub enum BehaviorParams {
    Move(MoveParams),
    Patrol(PatrolParams),
    Follow(FollowParams),
    Rotate(RotateParams),
    Bounce(BounceParams),
    Jump(JumpParams),
    Shoot(ShootParams),
    Collect(CollectParams),
    Spawn(SpawnParams),
    Destroy(DestroyParams),
    Custom(ValueMap),
}

impl BehaviorParams {
    /// Parses `params` over the registry defaults for `kind`. Extra keys are
    /// ignored; a known key with the wrong shape is an error.
    pub fn parse(kind: &BehaviorKind, params: &ValueMap) -> Result<Self, String> {
        Ok(match kind {
            BehaviorKind::Move => BehaviorParams::Move(typed_params(kind, params)?),
            BehaviorKind::Patrol => BehaviorParams::Patrol(typed_params(kind, params)?),
            BehaviorKind::Follow => BehaviorParams::Follow(typed_params(kind, params)?),
            BehaviorKind::Rotate => BehaviorParams::Rotate(typed_params(kind, params)?),
            BehaviorKind::Bounce => BehaviorParams::Bounce(typed_params(kind, params)?),
            BehaviorKind::Jump => BehaviorParams::Jump(typed_params(kind, params)?),
            BehaviorKind::Shoot => BehaviorParams::Shoot(typed_params(kind, params)?),
            BehaviorKind::Collect => BehaviorParams::Collect(typed_params(kind, params)?),
            BehaviorKind::Spawn => BehaviorParams::Spawn(typed_params(kind, params)?),
            BehaviorKind::Destroy => BehaviorParams::Destroy(typed_params(kind, params)?),
            BehaviorKind::Custom(_) => BehaviorParams::Custom(params.clone()),
        })
    }
}

fn typed_params<T: DeserializeOwned>(kind: &BehaviorKind, params: &ValueMap) -> Result<T, String> {
    let mut merged = default_parameters(kind);
    merged.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
    let value = serde_json::Value::Object(merged.into_iter().collect());
    serde_json::from_value(value).map_err(|e| format!("Invalid {} parameters: {e}", kind.as_str()))
}

/// Single change to an attached behavior.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BehaviorEdit {
    SetParam { key: String, value: serde_json::Value },
    RemoveParam { key: String },
    SetTrigger { trigger: Trigger },
    SetEnabled { enabled: bool },
}

/// Applies edits in order and validates the resulting parameters.
pub fn apply_behavior_edits(
    behavior: &EntityBehavior,
    edits: &[BehaviorEdit],
) -> Result<EntityBehavior, String> {
    let mut next = behavior.clone();
    for edit in edits {
        match edit {
            BehaviorEdit::SetParam { key, value } => {
                if key.trim().is_empty() {
                    return Err("Parameter key must not be empty".to_string());
                }
                next.parameters.insert(key.clone(), value.clone());
            }
            BehaviorEdit::RemoveParam { key } => {
                next.parameters.remove(key);
            }
            BehaviorEdit::SetTrigger { trigger } => next.trigger = trigger.clone(),
            BehaviorEdit::SetEnabled { enabled } => next.enabled = *enabled,
        }
    }
    BehaviorParams::parse(&next.kind, &next.parameters)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(value: serde_json::Value) -> ValueMap {
        object(value)
    }

    #[test]
    fn move_defaults_are_injected() {
        let behavior = create_behavior(BehaviorKind::Move, None, ValueMap::new());
        assert_eq!(
            behavior.parameters,
            params(serde_json::json!({ "speed": 5, "direction": "right" }))
        );
        assert!(behavior.enabled);
        assert_eq!(behavior.trigger, Trigger::Always);
    }

    #[test]
    fn explicit_parameters_override_only_given_keys() {
        let behavior = create_behavior(
            BehaviorKind::Move,
            None,
            params(serde_json::json!({ "speed": 10 })),
        );
        assert_eq!(
            behavior.parameters,
            params(serde_json::json!({ "speed": 10, "direction": "right" }))
        );
    }

    #[test]
    fn unknown_kinds_get_no_defaults() {
        let custom = BehaviorKind::parse("teleport");
        assert_eq!(custom, BehaviorKind::Custom("teleport".to_string()));
        let behavior = create_behavior(
            custom.clone(),
            None,
            params(serde_json::json!({ "range": 3 })),
        );
        assert_eq!(behavior.parameters, params(serde_json::json!({ "range": 3 })));
        assert_eq!(behavior.trigger, Trigger::Always);
        assert!(matches!(
            BehaviorParams::parse(&custom, &behavior.parameters),
            Ok(BehaviorParams::Custom(_))
        ));

        let loose = params(serde_json::json!({ "speed": "fast", "force": null }));
        assert_eq!(
            BehaviorParams::parse(&custom, &loose),
            Ok(BehaviorParams::Custom(loose.clone()))
        );
    }

    #[test]
    fn trigger_override_replaces_default_binding() {
        let default_jump = create_behavior(BehaviorKind::Jump, None, ValueMap::new());
        assert_eq!(
            default_jump.trigger,
            Trigger::OnKeyPress {
                key: Some("space".to_string())
            }
        );
        let clicked = create_behavior(BehaviorKind::Jump, Some(Trigger::OnClick), ValueMap::new());
        assert_eq!(clicked.trigger, Trigger::OnClick);
    }

    #[test]
    fn behavior_ids_have_time_prefix() {
        let id = new_behavior_id();
        assert!(id.starts_with("behavior_"));
        assert_eq!(id.rsplit('_').next().map(str::len), Some(4));
    }

    #[test]
    fn catalog_covers_every_builtin_kind() {
        let rows = catalog();
        assert_eq!(rows.len(), 10);
        for row in &rows {
            assert!(row.kind.is_builtin());
            assert!(!row.parameters.is_empty(), "{}", row.kind.as_str());
            BehaviorParams::parse(&row.kind, &row.parameters).expect("defaults parse");
        }
    }

    #[test]
    fn typed_view_rejects_wrong_shapes() {
        let bad = params(serde_json::json!({ "speed": "fast" }));
        let err = BehaviorParams::parse(&BehaviorKind::Move, &bad).expect_err("should fail");
        assert!(err.contains("move"));

        let ok = params(serde_json::json!({ "direction": "up", "extra": true }));
        match BehaviorParams::parse(&BehaviorKind::Move, &ok).expect("parse") {
            BehaviorParams::Move(p) => {
                assert_eq!(p.direction, Direction::Up);
                assert_eq!(p.speed, 5.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn behavior_json_uses_frontend_shape() {
        let behavior = create_behavior_with_id(
            "b1",
            BehaviorKind::Spawn,
            None,
            ValueMap::new(),
        );
        let json = serde_json::to_value(&behavior).expect("serialize");
        assert_eq!(json["type"], "spawn");
        assert_eq!(json["trigger"]["type"], "onTimer");
        assert_eq!(json["trigger"]["intervalMs"], 2000);
        let back: EntityBehavior = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, behavior);

        let minimal: EntityBehavior = serde_json::from_value(serde_json::json!({
            "id": "b2",
            "type": "rotate"
        }))
        .expect("deserialize minimal");
        assert!(minimal.enabled);
        assert_eq!(minimal.trigger, Trigger::Always);
        assert_eq!(minimal.kind, BehaviorKind::Rotate);
    }

    #[test]
    fn edits_apply_in_order_and_validate() {
        let behavior = create_behavior_with_id("b1", BehaviorKind::Patrol, None, ValueMap::new());
        let edited = apply_behavior_edits(
            &behavior,
            &[
                BehaviorEdit::SetParam {
                    key: "distance".to_string(),
                    value: serde_json::json!(250),
                },
                BehaviorEdit::SetEnabled { enabled: false },
                BehaviorEdit::SetTrigger {
                    trigger: Trigger::OnEvent {
                        name: "alarm".to_string(),
                    },
                },
            ],
        )
        .expect("valid edits");
        assert_eq!(edited.parameters["distance"], serde_json::json!(250));
        assert!(!edited.enabled);
        assert_eq!(edited.id, "b1");

        let rejected = apply_behavior_edits(
            &behavior,
            &[BehaviorEdit::SetParam {
                key: "speed".to_string(),
                value: serde_json::json!([1, 2]),
            }],
        );
        assert!(rejected.is_err());
    }
}
