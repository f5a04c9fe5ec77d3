//! Entity presets and starter projects.

use serde::Serialize;

use crate::behaviors::{create_behavior_with_id, BehaviorKind};
use crate::model::{Choice, Entity, GameConfig, Position, Size, ValueMap};

pub const DEFAULT_TEMPLATE: &str = "blank";

/// A placeable entity with the defaults the editor palette uses for `kind`.
/// Unknown kinds get a plain 40x40 entity.
pub fn entity_preset(id: impl Into<String>, kind: &str, position: Position) -> Entity {
    let mut entity = Entity::new(id, kind, position);
    let (properties, size, layer) = match kind {
        "player" => (serde_json::json!({ "speed": 5 }), Size::default(), 2),
        "enemy" => (serde_json::json!({ "damage": 10 }), Size::default(), 1),
        "platform" => (
            serde_json::json!({ "solid": true }),
            Size {
                width: 160.0,
                height: 32.0,
            },
            0,
        ),
        "collectible" => (
            serde_json::json!({ "points": 10 }),
            Size {
                width: 24.0,
                height: 24.0,
            },
            1,
        ),
        "obstacle" => (serde_json::json!({ "solid": true }), Size::default(), 0),
        _ => (serde_json::json!({}), Size::default(), 0),
    };
    if let serde_json::Value::Object(map) = properties {
        entity.properties = map.into_iter().collect();
    }
    entity.size = Some(size);
    entity.layer = layer;
    entity
}

#[derive(Serialize, Clone, Debug)]
pub struct StarterTemplate {
    pub name: &'static str,
    pub description: &'static str,
}

pub fn builtin_templates() -> Vec<StarterTemplate> {
    vec![
        StarterTemplate {
            name: "blank",
            description: "One empty main scene.",
        },
        StarterTemplate {
            name: "platformer",
            description: "Player on a ground strip with a patrolling enemy and coins.",
        },
        StarterTemplate {
            name: "top_down",
            description: "Gravity-free arena with a chasing enemy and pickups.",
        },
    ]
}

/// Builds the starting config for `template`, or `None` for unknown names.
pub fn template_config(template: &str, id: &str, name: &str) -> Option<GameConfig> {
    let mut config = GameConfig::new(id, name);
    let entities = match template {
        "blank" => Vec::new(),
        "platformer" => {
            let mut enemy = entity_preset("enemy", "enemy", Position { x: 480.0, y: 520.0 });
            enemy.behaviors.push(create_behavior_with_id(
                "behavior_patrol",
                BehaviorKind::Patrol,
                None,
                ValueMap::new(),
            ));
            let mut coin = entity_preset("coin", "collectible", Position { x: 320.0, y: 440.0 });
            coin.behaviors.push(create_behavior_with_id(
                "behavior_collect",
                BehaviorKind::Collect,
                None,
                ValueMap::new(),
            ));
            let mut ground = entity_preset("ground", "platform", Position { x: 0.0, y: 560.0 });
            ground.size = Some(Size {
                width: 800.0,
                height: 40.0,
            });
            config = config
                .with_component_choice("player_movement", Choice::A)
                .with_component_choice("jump_physics", Choice::A)
                .with_component_choice("score_display", Choice::A);
            vec![
                ground,
                entity_preset("player", "player", Position { x: 64.0, y: 480.0 }),
                enemy,
                coin,
            ]
        }
        "top_down" => {
            let mut chaser = entity_preset("chaser", "enemy", Position { x: 600.0, y: 300.0 });
            chaser.behaviors.push(create_behavior_with_id(
                "behavior_follow",
                BehaviorKind::Follow,
                None,
                ValueMap::new(),
            ));
            let mut gem = entity_preset("gem", "collectible", Position { x: 200.0, y: 120.0 });
            gem.behaviors.push(create_behavior_with_id(
                "behavior_collect",
                BehaviorKind::Collect,
                None,
                ValueMap::new(),
            ));
            config.settings.physics_enabled = false;
            config = config
                .with_component_choice("player_movement", Choice::A)
                .with_component_choice("health_system", Choice::A)
                .with_component_choice("camera_follow", Choice::B);
            vec![
                entity_preset("player", "player", Position { x: 384.0, y: 288.0 }),
                chaser,
                gem,
            ]
        }
        _ => return None,
    };
    Some(config.with_scene_entities("main", entities))
}
