use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::behaviors::EntityBehavior;

pub const DEFAULT_SCREEN_WIDTH: u32 = 800;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 600;
pub const DEFAULT_FPS: u32 = 60;
pub const DEFAULT_BACKGROUND: &str = "#000000";
pub const DEFAULT_GRID_SIZE: u32 = 32;
pub const DEFAULT_ENTITY_SIZE: f64 = 40.0;

/// Open key/value map used for entity properties and behavior parameters.
/// Ordered so serialization and code generation are deterministic.
pub type ValueMap = BTreeMap<String, serde_json::Value>;

/// Root document of one visual game project (`.gameconfig.json`).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub id: String,
    pub name: String,
    /// Reserved versioning hook; no edit bumps it.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub component_choices: Vec<ComponentChoice>,
    #[serde(default)]
    pub assets: Vec<serde_json::Value>,
    #[serde(default)]
    pub settings: GameSettings,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default)]
    pub is_main_scene: bool,
}

/// One placeable game object.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default)]
    pub layer: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub behaviors: Vec<EntityBehavior>,
    #[serde(default)]
    pub properties: ValueMap,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: DEFAULT_ENTITY_SIZE,
            height: DEFAULT_ENTITY_SIZE,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Choice {
    A,
    B,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentChoice {
    pub component_id: String,
    pub choice: Choice,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default = "default_true")]
    pub grid_snap: bool,
    #[serde(default = "default_true")]
    pub physics_enabled: bool,
    #[serde(default)]
    pub debug_mode: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            show_grid: true,
            grid_snap: true,
            physics_enabled: true,
            debug_mode: false,
        }
    }
}

fn default_version() -> u32 {
    1
}
fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}
fn default_width() -> u32 {
    DEFAULT_SCREEN_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_SCREEN_HEIGHT
}
fn default_grid_size() -> u32 {
    DEFAULT_GRID_SIZE
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_true() -> bool {
    true
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new("untitled", "Untitled Game")
    }
}

impl GameConfig {
    /// A project with a single empty "Main Scene".
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut main = Scene::new("main", "Main Scene");
        main.is_main_scene = true;
        Self {
            id: id.into(),
            name: name.into(),
            version: default_version(),
            scenes: vec![main],
            component_choices: Vec::new(),
            assets: Vec::new(),
            settings: GameSettings::default(),
        }
    }

    /// The first scene flagged as main, else the first scene.
    pub fn main_scene(&self) -> Option<&Scene> {
        self.scenes
            .iter()
            .find(|s| s.is_main_scene)
            .or_else(|| self.scenes.first())
    }

    pub fn scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == scene_id)
    }

    pub fn choice_for(&self, component_id: &str) -> Option<Choice> {
        self.component_choices
            .iter()
            .find(|c| c.component_id == component_id)
            .map(|c| c.choice)
    }

    /// Replaces the entity list of one scene. Unknown scene ids leave the
    /// config unchanged.
    pub fn with_scene_entities(&self, scene_id: &str, entities: Vec<Entity>) -> GameConfig {
        let mut next = self.clone();
        if let Some(scene) = next.scenes.iter_mut().find(|s| s.id == scene_id) {
            *scene = Scene {
                entities,
                ..scene.clone()
            };
        }
        next
    }

    pub fn with_entity_added(&self, scene_id: &str, entity: Entity) -> GameConfig {
        let Some(scene) = self.scene(scene_id) else {
            return self.clone();
        };
        let mut entities = scene.entities.clone();
        entities.push(entity);
        self.with_scene_entities(scene_id, entities)
    }

    /// Replaces the entity sharing `entity.id`; unknown ids are ignored.
    pub fn with_entity_replaced(&self, scene_id: &str, entity: Entity) -> GameConfig {
        let Some(scene) = self.scene(scene_id) else {
            return self.clone();
        };
        let entities = scene
            .entities
            .iter()
            .map(|e| if e.id == entity.id { entity.clone() } else { e.clone() })
            .collect();
        self.with_scene_entities(scene_id, entities)
    }

    pub fn with_entities_removed(&self, scene_id: &str, entity_ids: &[&str]) -> GameConfig {
        let Some(scene) = self.scene(scene_id) else {
            return self.clone();
        };
        let entities = scene
            .entities
            .iter()
            .filter(|e| !entity_ids.contains(&e.id.as_str()))
            .cloned()
            .collect();
        self.with_scene_entities(scene_id, entities)
    }

    pub fn with_scene_added(&self, scene: Scene) -> GameConfig {
        let mut next = self.clone();
        next.scenes.push(scene);
        next
    }

    /// Flags exactly one scene as main. Unknown ids leave the config unchanged.
    pub fn with_main_scene(&self, scene_id: &str) -> GameConfig {
        if self.scene(scene_id).is_none() {
            return self.clone();
        }
        let mut next = self.clone();
        for scene in &mut next.scenes {
            scene.is_main_scene = scene.id == scene_id;
        }
        next
    }

    /// Sets a component choice in place, or appends it when new.
    pub fn with_component_choice(&self, component_id: &str, choice: Choice) -> GameConfig {
        let mut next = self.clone();
        match next
            .component_choices
            .iter_mut()
            .find(|c| c.component_id == component_id)
        {
            Some(existing) => existing.choice = choice,
            None => next.component_choices.push(ComponentChoice {
                component_id: component_id.to_string(),
                choice,
            }),
        }
        next
    }

    pub fn without_component_choice(&self, component_id: &str) -> GameConfig {
        let mut next = self.clone();
        next.component_choices
            .retain(|c| c.component_id != component_id);
        next
    }

    pub fn with_settings(&self, settings: GameSettings) -> GameConfig {
        GameConfig {
            settings,
            ..self.clone()
        }
    }

    /// Repairs stored documents: duplicate component choices keep the last
    /// value at the first position, an empty scene list gets a main scene,
    /// and zero-sized dimensions fall back to defaults.
    pub fn normalize(mut self) -> GameConfig {
        let mut choices: Vec<ComponentChoice> = Vec::with_capacity(self.component_choices.len());
        for choice in self.component_choices.drain(..) {
            match choices
                .iter_mut()
                .find(|c| c.component_id == choice.component_id)
            {
                Some(existing) => existing.choice = choice.choice,
                None => choices.push(choice),
            }
        }
        self.component_choices = choices;

        if self.scenes.is_empty() {
            let mut main = Scene::new("main", "Main Scene");
            main.is_main_scene = true;
            self.scenes.push(main);
        }
        for scene in &mut self.scenes {
            if scene.width == 0 {
                scene.width = DEFAULT_SCREEN_WIDTH;
            }
            if scene.height == 0 {
                scene.height = DEFAULT_SCREEN_HEIGHT;
            }
            if scene.grid_size == 0 {
                scene.grid_size = DEFAULT_GRID_SIZE;
            }
            if !is_hex_color(&scene.background_color) {
                scene.background_color = DEFAULT_BACKGROUND.to_string();
            }
        }
        if self.settings.fps == 0 {
            self.settings.fps = DEFAULT_FPS;
        }
        self
    }
}

/// Scene lookup with first-scene fallback. `None` only when the project has
/// no scenes at all.
pub fn current_scene<'a>(config: &'a GameConfig, scene_id: &str) -> Option<&'a Scene> {
    config.scene(scene_id).or_else(|| config.scenes.first())
}

impl Scene {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entities: Vec::new(),
            background_color: default_background(),
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
            grid_size: DEFAULT_GRID_SIZE,
            is_main_scene: false,
        }
    }

    pub fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == entity_id)
    }

    /// `base` if free, else the first free `{base}_{n}` with n >= 1.
    pub fn unique_entity_id(&self, base: &str) -> String {
        let base = if base.trim().is_empty() { "entity" } else { base.trim() };
        if self.entity(base).is_none() {
            return base.to_string();
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}_{n}");
            if self.entity(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Entity {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, position: Position) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            kind: kind.into(),
            position,
            size: None,
            layer: 0,
            visible: true,
            locked: false,
            behaviors: Vec::new(),
            properties: ValueMap::new(),
        }
    }

    pub fn size_or_default(&self) -> Size {
        self.size.unwrap_or_default()
    }

    pub fn behavior(&self, behavior_id: &str) -> Option<&EntityBehavior> {
        self.behaviors.iter().find(|b| b.id == behavior_id)
    }

    pub fn with_behavior(&self, behavior: EntityBehavior) -> Entity {
        let mut next = self.clone();
        next.behaviors.push(behavior);
        next
    }

    /// Replaces the behavior sharing `behavior.id`; unknown ids are ignored.
    pub fn with_behavior_replaced(&self, behavior: EntityBehavior) -> Entity {
        let mut next = self.clone();
        if let Some(slot) = next.behaviors.iter_mut().find(|b| b.id == behavior.id) {
            *slot = behavior;
        }
        next
    }

    pub fn without_behavior(&self, behavior_id: &str) -> Entity {
        let mut next = self.clone();
        next.behaviors.retain(|b| b.id != behavior_id);
        next
    }
}

/// Rounds a position to the nearest grid intersection.
pub fn snap_to_grid(position: Position, grid_size: u32) -> Position {
    if grid_size == 0 {
        return position;
    }
    let grid = grid_size as f64;
    Position {
        x: (position.x / grid).round() * grid,
        y: (position.y / grid).round() * grid,
    }
}

/// Accepts `#RGB` and `#RRGGBB`.
pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, x: f64, y: f64) -> Entity {
        Entity::new(id, "player", Position { x, y })
    }

    #[test]
    fn default_config_has_one_main_scene() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.scenes.len(), 1);
        assert!(cfg.scenes[0].is_main_scene);
        assert_eq!(cfg.scenes[0].width, 800);
        assert_eq!(cfg.scenes[0].height, 600);
        assert_eq!(cfg.settings.fps, 60);
    }

    #[test]
    fn main_scene_falls_back_to_first_scene() {
        let mut cfg = GameConfig::default();
        cfg.scenes[0].is_main_scene = false;
        cfg.scenes.push(Scene::new("second", "Second"));
        assert_eq!(cfg.main_scene().map(|s| s.id.as_str()), Some("main"));

        cfg.scenes[1].is_main_scene = true;
        assert_eq!(cfg.main_scene().map(|s| s.id.as_str()), Some("second"));

        cfg.scenes.clear();
        assert!(cfg.main_scene().is_none());
    }

    #[test]
    fn current_scene_falls_back_without_error() {
        let cfg = GameConfig::default();
        assert_eq!(current_scene(&cfg, "missing").map(|s| s.id.as_str()), Some("main"));
        let empty = GameConfig {
            scenes: Vec::new(),
            ..GameConfig::default()
        };
        assert!(current_scene(&empty, "main").is_none());
    }

    #[test]
    fn scene_entity_update_leaves_original_untouched() {
        let cfg = GameConfig::default();
        let next = cfg.with_scene_entities("main", vec![entity("hero", 1.0, 2.0)]);
        assert!(cfg.scenes[0].entities.is_empty());
        assert_eq!(next.scenes[0].entities.len(), 1);
        assert_eq!(next.scenes[0].name, "Main Scene");

        let unchanged = cfg.with_scene_entities("nope", vec![entity("hero", 1.0, 2.0)]);
        assert_eq!(unchanged, cfg);
    }

    #[test]
    fn entity_updates_replace_the_scene_value() {
        let cfg = GameConfig::default()
            .with_entity_added("main", entity("a", 0.0, 0.0))
            .with_entity_added("main", entity("b", 5.0, 5.0));
        let mut moved = cfg.scenes[0].entities[0].clone();
        moved.position = Position { x: 99.0, y: 1.0 };
        let next = cfg.with_entity_replaced("main", moved);
        assert_eq!(next.scenes[0].entities[0].position.x, 99.0);
        assert_eq!(next.scenes[0].entities[0].kind, "player");
        assert_eq!(cfg.scenes[0].entities[0].position.x, 0.0);

        let removed = next.with_entities_removed("main", &["a"]);
        let ids: Vec<&str> = removed.scenes[0].entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(cfg.with_entity_added("nope", entity("c", 0.0, 0.0)), cfg);
    }

    #[test]
    fn component_choice_replaces_in_place() {
        let cfg = GameConfig::default()
            .with_component_choice("player_movement", Choice::A)
            .with_component_choice("shooting", Choice::B)
            .with_component_choice("player_movement", Choice::B);
        assert_eq!(cfg.component_choices.len(), 2);
        assert_eq!(cfg.component_choices[0].component_id, "player_movement");
        assert_eq!(cfg.choice_for("player_movement"), Some(Choice::B));
        let cleared = cfg.without_component_choice("shooting");
        assert_eq!(cleared.choice_for("shooting"), None);
    }

    #[test]
    fn main_scene_flag_is_exclusive() {
        let cfg = GameConfig::default()
            .with_scene_added(Scene::new("boss", "Boss"))
            .with_main_scene("boss");
        let flagged: Vec<&str> = cfg
            .scenes
            .iter()
            .filter(|s| s.is_main_scene)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(flagged, vec!["boss"]);
        assert_eq!(cfg.with_main_scene("missing"), cfg);
    }

    #[test]
    fn unique_entity_id_skips_taken_suffixes() {
        let mut scene = Scene::new("s", "S");
        assert_eq!(scene.unique_entity_id("player"), "player");
        scene.entities.push(entity("player", 0.0, 0.0));
        scene.entities.push(entity("player_1", 0.0, 0.0));
        assert_eq!(scene.unique_entity_id("player"), "player_2");
        assert_eq!(scene.unique_entity_id("  "), "entity");
    }

    #[test]
    fn normalize_repairs_stored_documents() {
        let raw = serde_json::json!({
            "id": "p1",
            "name": "Broken",
            "scenes": [],
            "componentChoices": [
                {"componentId": "shooting", "choice": "A"},
                {"componentId": "score_display", "choice": "A"},
                {"componentId": "shooting", "choice": "B"}
            ],
            "settings": {"fps": 0}
        });
        let cfg: GameConfig = serde_json::from_value(raw).expect("deserialize");
        let cfg = cfg.normalize();
        assert_eq!(cfg.scenes.len(), 1);
        assert_eq!(cfg.scenes[0].background_color, DEFAULT_BACKGROUND);
        assert!(cfg.scenes[0].is_main_scene);
        assert_eq!(cfg.settings.fps, 60);
        assert_eq!(cfg.component_choices.len(), 2);
        assert_eq!(cfg.component_choices[0].component_id, "shooting");
        assert_eq!(cfg.component_choices[0].choice, Choice::B);
    }

    #[test]
    fn frontend_document_deserializes_with_defaults() {
        let raw = serde_json::json!({
            "id": "p2",
            "name": "Platformer",
            "scenes": [{
                "id": "level1",
                "name": "Level 1",
                "isMainScene": true,
                "entities": [{
                    "id": "hero",
                    "type": "player",
                    "position": {"x": 64, "y": 128}
                }]
            }]
        });
        let cfg: GameConfig = serde_json::from_value(raw).expect("deserialize");
        let hero = &cfg.scenes[0].entities[0];
        assert_eq!(hero.kind, "player");
        assert!(hero.visible);
        assert!(!hero.locked);
        assert_eq!(hero.layer, 0);
        assert_eq!(hero.size_or_default(), Size::default());
        assert_eq!(cfg.scenes[0].background_color, "#000000");
        assert!(cfg.settings.show_grid);

        let json = serde_json::to_value(&cfg).expect("serialize");
        assert_eq!(json["scenes"][0]["isMainScene"], true);
        assert_eq!(json["scenes"][0]["entities"][0]["type"], "player");
        assert!(json["scenes"][0]["entities"][0].get("size").is_none());
    }

    #[test]
    fn snap_rounds_to_nearest_cell() {
        let snapped = snap_to_grid(Position { x: 47.0, y: 15.0 }, 32);
        assert_eq!(snapped, Position { x: 32.0, y: 0.0 });
        let snapped = snap_to_grid(Position { x: 49.0, y: 80.0 }, 32);
        assert_eq!(snapped, Position { x: 64.0, y: 96.0 });
        assert_eq!(snap_to_grid(Position { x: 3.0, y: 3.0 }, 0), Position { x: 3.0, y: 3.0 });
    }

    #[test]
    fn normalize_replaces_invalid_background_colors() {
        let mut cfg = GameConfig::new("p", "Colors");
        cfg.scenes[0].background_color = "#1a2B3c".to_string();
        let mut second = Scene::new("two", "Two");
        second.background_color = "red\")\nimport os".to_string();
        cfg.scenes.push(second);
        let cfg = cfg.normalize();
        assert_eq!(cfg.scenes[0].background_color, "#1a2B3c");
        assert_eq!(cfg.scenes[1].background_color, DEFAULT_BACKGROUND);
    }

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#FF0000"));
        assert!(is_hex_color("#abc"));
        assert!(!is_hex_color("FF0000"));
        assert!(!is_hex_color("#GG0000"));
        assert!(!is_hex_color("#FF00"));
    }
}
