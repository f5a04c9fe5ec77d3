//! Project builder controller: owns the open [`GameConfig`], turns editor
//! intents into pure model updates, records history and talks to
//! persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::behaviors::{
    apply_behavior_edits, create_behavior, new_behavior_id, BehaviorEdit, BehaviorKind,
    BehaviorParams, EntityBehavior, Trigger,
};
use crate::codegen::{self, MAIN_FILE};
use crate::history::EditorHistory;
use crate::model::{
    current_scene, snap_to_grid, Choice, Entity, GameConfig, GameSettings, Position, Scene, Size,
    ValueMap,
};
use crate::persistence::{
    CreateProjectRequest, LocalCache, ProjectFile, ProjectPayload, ProjectStore, ProjectSummary,
    StoreDispatcher, StoreOp, StoreOutcome, StoreReply, CONFIG_FILE,
};
use crate::templates;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

/// One change to an entity's own fields.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EntityEdit {
    Move { x: f64, y: f64 },
    Resize { width: f64, height: f64 },
    Rename { name: String },
    SetLayer { layer: i32 },
    SetVisible { visible: bool },
    SetLocked { locked: bool },
    SetProperty { key: String, value: serde_json::Value },
    RemoveProperty { key: String },
}

/// Applies `edits` in order to a copy of `entity`. Fails without touching
/// anything if any edit is invalid. Moves are stored exactly as given.
pub fn apply_entity_edits(entity: &Entity, edits: &[EntityEdit]) -> Result<Entity, String> {
    let mut next = entity.clone();
    for edit in edits {
        match edit {
            EntityEdit::Move { x, y } => {
                if next.locked {
                    return Err(format!("Entity '{}' is locked", next.id));
                }
                if !x.is_finite() || !y.is_finite() {
                    return Err("Position must be finite".to_string());
                }
                next.position = Position { x: *x, y: *y };
            }
            EntityEdit::Resize { width, height } => {
                if next.locked {
                    return Err(format!("Entity '{}' is locked", next.id));
                }
                if !(width.is_finite() && height.is_finite() && *width > 0.0 && *height > 0.0) {
                    return Err("Size must be positive".to_string());
                }
                next.size = Some(Size {
                    width: *width,
                    height: *height,
                });
            }
            EntityEdit::Rename { name } => {
                let name = name.trim();
                if name.is_empty() {
                    return Err("Name must not be empty".to_string());
                }
                next.name = name.to_string();
            }
            EntityEdit::SetLayer { layer } => next.layer = *layer,
            EntityEdit::SetVisible { visible } => next.visible = *visible,
            EntityEdit::SetLocked { locked } => next.locked = *locked,
            EntityEdit::SetProperty { key, value } => {
                if key.trim().is_empty() {
                    return Err("Property key must not be empty".to_string());
                }
                next.properties.insert(key.clone(), value.clone());
            }
            EntityEdit::RemoveProperty { key } => {
                next.properties.remove(key);
            }
        }
    }
    Ok(next)
}

/// Partial settings update. Absent fields keep their value.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub fps: Option<u32>,
    pub show_grid: Option<bool>,
    pub grid_snap: Option<bool>,
    pub physics_enabled: Option<bool>,
    pub debug_mode: Option<bool>,
}

impl SettingsPatch {
    pub fn apply(&self, settings: &GameSettings) -> Result<GameSettings, String> {
        if self.fps == Some(0) {
            return Err("fps must be positive".to_string());
        }
        Ok(GameSettings {
            fps: self.fps.unwrap_or(settings.fps),
            show_grid: self.show_grid.unwrap_or(settings.show_grid),
            grid_snap: self.grid_snap.unwrap_or(settings.grid_snap),
            physics_enabled: self.physics_enabled.unwrap_or(settings.physics_enabled),
            debug_mode: self.debug_mode.unwrap_or(settings.debug_mode),
        })
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo: Vec<String>,
    pub redo: Vec<String>,
    pub max_depth: usize,
    pub unsaved_changes: bool,
}

/// Finished project API call, keyed by the ticket its dispatch returned.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteCompletion {
    pub ticket: u64,
    pub result: RemoteResult,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RemoteResult {
    Saved(Result<(), String>),
    Created(Result<ProjectSummary, String>),
    Listed(Result<Vec<ProjectSummary>, String>),
}

enum PendingRemote {
    Save {
        save_point: u64,
    },
    Create {
        /// Fresh project that replaces the open one once the API accepts it.
        replacement: Option<Box<GameConfig>>,
        save_point: u64,
    },
    List,
}

pub struct ProjectBuilder {
    config: GameConfig,
    history: EditorHistory,
    current_scene_id: String,
    selected: Option<String>,
    notifications: Vec<Notification>,
    cache: Option<LocalCache>,
    store: Arc<dyn ProjectStore>,
    remote: StoreDispatcher,
    pending: HashMap<u64, PendingRemote>,
}

impl ProjectBuilder {
    pub fn new(config: GameConfig, max_undo: usize, store: Arc<dyn ProjectStore>) -> Self {
        let config = config.normalize();
        let current_scene_id = config
            .main_scene()
            .map(|s| s.id.clone())
            .unwrap_or_default();
        Self {
            config,
            history: EditorHistory::new(max_undo),
            current_scene_id,
            selected: None,
            notifications: Vec::new(),
            cache: None,
            store,
            remote: StoreDispatcher::default(),
            pending: HashMap::new(),
        }
    }

    /// Opens a stored `.gameconfig.json`. Corrupt documents are replaced by a
    /// fresh default project and reported as a warning.
    pub fn from_config_json(text: &str, max_undo: usize, store: Arc<dyn ProjectStore>) -> Self {
        match serde_json::from_str::<GameConfig>(text) {
            Ok(config) => Self::new(config, max_undo, store),
            Err(e) => {
                warn!("[Palace] Stored project is corrupt, starting fresh: {e}");
                let mut builder = Self::new(GameConfig::default(), max_undo, store);
                builder.notify(
                    NoticeLevel::Warning,
                    "The saved project could not be read; a new project was started.",
                );
                builder
            }
        }
    }

    pub fn from_template(
        template: &str,
        name: &str,
        max_undo: usize,
        store: Arc<dyn ProjectStore>,
    ) -> Result<Self, String> {
        let config = templates::template_config(template, "untitled", name)
            .ok_or_else(|| format!("Unknown template '{template}'"))?;
        Ok(Self::new(config, max_undo, store))
    }

    /// Mirrors every following change into `cache`.
    pub fn with_cache(mut self, cache: LocalCache) -> Self {
        self.cache = Some(cache);
        self.mirror_cache();
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn history(&self) -> &EditorHistory {
        &self.history
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        current_scene(&self.config, &self.current_scene_id)
    }

    pub fn current_scene_id(&self) -> Option<&str> {
        self.current_scene().map(|s| s.id.as_str())
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        let id = self.selected.as_deref()?;
        self.current_scene()?.entity(id)
    }

    pub fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.current_scene()?.entity(entity_id)
    }

    pub fn history_summary(&self) -> HistorySummary {
        HistorySummary {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            undo: self.history.undo_descriptions().map(str::to_string).collect(),
            redo: self.history.redo_descriptions().map(str::to_string).collect(),
            max_depth: self.history.max_depth(),
            unsaved_changes: self.history.has_unsaved_changes(),
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // Selection

    pub fn select_scene(&mut self, scene_id: &str) -> Result<(), String> {
        if self.config.scene(scene_id).is_none() {
            return Err(format!("Scene '{scene_id}' not found"));
        }
        if self.current_scene_id != scene_id {
            self.current_scene_id = scene_id.to_string();
            self.selected = None;
        }
        Ok(())
    }

    pub fn select_entity(&mut self, entity_id: Option<&str>) -> Result<(), String> {
        match entity_id {
            Some(id) => {
                self.entity(id)
                    .ok_or_else(|| format!("Entity '{id}' not found"))?;
                self.selected = Some(id.to_string());
            }
            None => self.selected = None,
        }
        Ok(())
    }

    // Entity mutations

    fn scene_for_edit(&self) -> Result<Scene, String> {
        self.current_scene()
            .cloned()
            .ok_or_else(|| "Project has no scenes".to_string())
    }

    fn snap(&self, scene: &Scene) -> Option<u32> {
        self.config.settings.grid_snap.then_some(scene.grid_size)
    }

    fn install(&mut self, scene_id: &str, entities: Vec<Entity>) {
        self.config = self.config.with_scene_entities(scene_id, entities);
        self.mirror_cache();
    }

    /// Adds a fully specified entity. A taken or blank id is replaced by a
    /// free `{id}_{n}` variant. Returns the id actually used.
    pub fn add_entity(&mut self, mut entity: Entity) -> Result<String, String> {
        let scene = self.scene_for_edit()?;
        if entity.kind.trim().is_empty() {
            return Err("Entity type must not be empty".to_string());
        }
        if let Some(size) = entity.size {
            if !(size.width > 0.0 && size.height > 0.0) {
                return Err("Size must be positive".to_string());
            }
        }
        let base = if entity.id.trim().is_empty() {
            entity.kind.clone()
        } else {
            entity.id.clone()
        };
        entity.id = scene.unique_entity_id(&base);
        if entity.name.trim().is_empty() {
            entity.name = entity.id.clone();
        }
        let mut after = scene.entities.clone();
        after.push(entity.clone());
        self.history.record_add(
            &scene.id,
            scene.entities.clone(),
            after.clone(),
            format!("Add {}", entity.name),
        );
        self.install(&scene.id, after);
        self.selected = Some(entity.id.clone());
        debug!("[Palace] added entity {} to scene {}", entity.id, scene.id);
        Ok(entity.id)
    }

    /// Places a palette preset of `kind` at `position`.
    pub fn create_entity(&mut self, kind: &str, position: Position) -> Result<String, String> {
        let scene = self.scene_for_edit()?;
        let id = scene.unique_entity_id(kind);
        self.place_entity(templates::entity_preset(id, kind, position))
    }

    /// [`add_entity`](Self::add_entity) with grid snapping applied to the
    /// entity's position.
    pub fn place_entity(&mut self, mut entity: Entity) -> Result<String, String> {
        let scene = self.scene_for_edit()?;
        if let Some(grid) = self.snap(&scene) {
            entity.position = snap_to_grid(entity.position, grid);
        }
        self.add_entity(entity)
    }

    /// Applies an edit list as one undo step.
    pub fn edit_entity(&mut self, entity_id: &str, edits: &[EntityEdit]) -> Result<Entity, String> {
        let scene = self.scene_for_edit()?;
        let current = scene
            .entity(entity_id)
            .ok_or_else(|| format!("Entity '{entity_id}' not found"))?;
        let updated = apply_entity_edits(current, edits)?;
        if &updated == current {
            return Ok(updated);
        }
        let after: Vec<Entity> = scene
            .entities
            .iter()
            .map(|e| if e.id == entity_id { updated.clone() } else { e.clone() })
            .collect();
        self.history.record_modify(
            &scene.id,
            after.clone(),
            scene.entities.clone(),
            format!("Edit {}", updated.name),
        );
        self.install(&scene.id, after);
        Ok(updated)
    }

    pub fn delete_entity(&mut self, entity_id: &str) -> Result<(), String> {
        let scene = self.scene_for_edit()?;
        let entity = scene
            .entity(entity_id)
            .ok_or_else(|| format!("Entity '{entity_id}' not found"))?;
        let description = format!("Delete {}", entity.name);
        let after: Vec<Entity> = scene
            .entities
            .iter()
            .filter(|e| e.id != entity_id)
            .cloned()
            .collect();
        self.history
            .record_delete(&scene.id, scene.entities.clone(), after.clone(), description);
        self.install(&scene.id, after);
        if self.selected.as_deref() == Some(entity_id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Copies an entity one grid cell down-right under a fresh id. Behavior
    /// ids are regenerated.
    pub fn duplicate_entity(&mut self, entity_id: &str) -> Result<String, String> {
        let scene = self.scene_for_edit()?;
        let source = scene
            .entity(entity_id)
            .ok_or_else(|| format!("Entity '{entity_id}' not found"))?;
        let offset = f64::from(scene.grid_size);
        let mut copy = source.clone();
        copy.id = scene.unique_entity_id(&source.id);
        copy.name = format!("{} copy", source.name);
        copy.position = Position {
            x: source.position.x + offset,
            y: source.position.y + offset,
        };
        copy.locked = false;
        let mut behaviors = Vec::with_capacity(copy.behaviors.len());
        for behavior in &copy.behaviors {
            let mut fresh = behavior.clone();
            fresh.id = loop {
                let id = new_behavior_id();
                if !behaviors.iter().any(|b: &EntityBehavior| b.id == id) {
                    break id;
                }
            };
            behaviors.push(fresh);
        }
        copy.behaviors = behaviors;
        self.add_entity(copy)
    }

    // Behaviors

    fn replace_entity(&mut self, scene: &Scene, updated: Entity, description: String) {
        let after: Vec<Entity> = scene
            .entities
            .iter()
            .map(|e| if e.id == updated.id { updated.clone() } else { e.clone() })
            .collect();
        self.history
            .record_modify(&scene.id, after.clone(), scene.entities.clone(), description);
        self.install(&scene.id, after);
    }

    pub fn add_behavior(
        &mut self,
        entity_id: &str,
        kind: BehaviorKind,
        trigger: Option<Trigger>,
        parameters: ValueMap,
    ) -> Result<EntityBehavior, String> {
        let scene = self.scene_for_edit()?;
        let entity = scene
            .entity(entity_id)
            .ok_or_else(|| format!("Entity '{entity_id}' not found"))?;
        let mut behavior = create_behavior(kind, trigger, parameters);
        while entity.behavior(&behavior.id).is_some() {
            behavior.id = new_behavior_id();
        }
        BehaviorParams::parse(&behavior.kind, &behavior.parameters)?;
        let updated = entity.with_behavior(behavior.clone());
        let description = format!("Add {} to {}", behavior.kind.as_str(), entity.name);
        self.replace_entity(&scene, updated, description);
        Ok(behavior)
    }

    pub fn edit_behavior(
        &mut self,
        entity_id: &str,
        behavior_id: &str,
        edits: &[BehaviorEdit],
    ) -> Result<EntityBehavior, String> {
        let scene = self.scene_for_edit()?;
        let entity = scene
            .entity(entity_id)
            .ok_or_else(|| format!("Entity '{entity_id}' not found"))?;
        let behavior = entity
            .behavior(behavior_id)
            .ok_or_else(|| format!("Behavior '{behavior_id}' not found"))?;
        let edited = apply_behavior_edits(behavior, edits)?;
        if &edited == behavior {
            return Ok(edited);
        }
        let updated = entity.with_behavior_replaced(edited.clone());
        let description = format!("Edit {} on {}", edited.kind.as_str(), entity.name);
        self.replace_entity(&scene, updated, description);
        Ok(edited)
    }

    pub fn remove_behavior(&mut self, entity_id: &str, behavior_id: &str) -> Result<(), String> {
        let scene = self.scene_for_edit()?;
        let entity = scene
            .entity(entity_id)
            .ok_or_else(|| format!("Entity '{entity_id}' not found"))?;
        let behavior = entity
            .behavior(behavior_id)
            .ok_or_else(|| format!("Behavior '{behavior_id}' not found"))?;
        let description = format!("Remove {} from {}", behavior.kind.as_str(), entity.name);
        let updated = entity.without_behavior(behavior_id);
        self.replace_entity(&scene, updated, description);
        Ok(())
    }

    // History

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshots) => {
                self.install_snapshots(snapshots);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshots) => {
                self.install_snapshots(snapshots);
                true
            }
            None => false,
        }
    }

    fn install_snapshots(&mut self, snapshots: Vec<crate::history::SceneSnapshot>) {
        for snapshot in snapshots {
            self.config = self
                .config
                .with_scene_entities(&snapshot.scene_id, snapshot.entities);
        }
        if let Some(id) = self.selected.clone() {
            if self.entity(&id).is_none() {
                self.selected = None;
            }
        }
        self.mirror_cache();
    }

    // Project-level edits. Mirrored to the cache but not undoable.

    /// `None` clears the choice.
    pub fn set_component_choice(&mut self, component_id: &str, choice: Option<Choice>) {
        if codegen::catalog::find_component(component_id).is_none() {
            debug!("[Palace] choice for unknown component {component_id} kept without code");
        }
        self.config = match choice {
            Some(choice) => self.config.with_component_choice(component_id, choice),
            None => self.config.without_component_choice(component_id),
        };
        self.mirror_cache();
    }

    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<GameSettings, String> {
        let settings = patch.apply(&self.config.settings)?;
        self.config = self.config.with_settings(settings.clone());
        self.mirror_cache();
        Ok(settings)
    }

    /// Adds an empty scene and makes it current. Returns its id.
    pub fn add_scene(&mut self, name: &str) -> Result<String, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Scene name must not be empty".to_string());
        }
        let base: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let base = if base.trim_matches('_').is_empty() {
            "scene".to_string()
        } else {
            base
        };
        let mut id = base.clone();
        let mut n = 1usize;
        while self.config.scene(&id).is_some() {
            id = format!("{base}_{n}");
            n += 1;
        }
        let mut scene = Scene::new(id.clone(), name);
        scene.is_main_scene = self.config.scenes.is_empty();
        self.config = self.config.with_scene_added(scene);
        self.current_scene_id = id.clone();
        self.selected = None;
        self.mirror_cache();
        Ok(id)
    }

    pub fn set_main_scene(&mut self, scene_id: &str) -> Result<(), String> {
        if self.config.scene(scene_id).is_none() {
            return Err(format!("Scene '{scene_id}' not found"));
        }
        self.config = self.config.with_main_scene(scene_id);
        self.mirror_cache();
        Ok(())
    }

    // Output

    pub fn generate_code(&self) -> String {
        codegen::generate(&self.config)
    }

    pub fn export(&self) -> ExportFile {
        ExportFile {
            file_name: codegen::export_file_name(&self.config.name),
            contents: self.generate_code(),
        }
    }

    pub fn write_export(&mut self, dir: &Path) -> Result<PathBuf, String> {
        let export = self.export();
        match crate::persistence::write_export(dir, &export.file_name, &export.contents) {
            Ok(path) => {
                info!("[Palace] exported {}", path.display());
                self.notify(NoticeLevel::Info, format!("Exported {}", export.file_name));
                Ok(path)
            }
            Err(e) => {
                let message = format!("Export failed: {e}");
                self.notify(NoticeLevel::Error, message.clone());
                Err(message)
            }
        }
    }

    /// `main.py` plus the serialized editor state.
    pub fn project_files(&self) -> Result<ProjectPayload, String> {
        payload_for(&self.config)
    }

    // Persistence. Every project API call runs on a worker thread; results
    // are folded in by `poll_remote`.

    /// Starts a background `PUT /projects/{id}`. Editing continues while it
    /// runs; [`poll_remote`](Self::poll_remote) reports the outcome.
    pub fn save(&mut self) -> Result<u64, String> {
        let payload = self.project_files()?;
        let save_point = self.history.save_point();
        info!("[Palace save] saving project {}", self.config.id);
        let op = StoreOp::Update {
            project_id: self.config.id.clone(),
            payload,
        };
        Ok(self.dispatch(op, PendingRemote::Save { save_point }))
    }

    /// Starts a background `POST /projects` for the open project. On success
    /// the project adopts the new id.
    pub fn create_remote(&mut self, template: &str) -> Result<u64, String> {
        let request = create_request(&self.config, template)?;
        let save_point = self.history.save_point();
        Ok(self.dispatch(
            StoreOp::Create(request),
            PendingRemote::Create {
                replacement: None,
                save_point,
            },
        ))
    }

    /// Starts a background `POST /projects` for a fresh project built from
    /// `template`. The open project is replaced only once the API accepts
    /// the new one; on failure it stays as it is.
    pub fn create_from_template(&mut self, template: &str, name: &str) -> Result<u64, String> {
        let config = templates::template_config(template, &self.config.id, name)
            .ok_or_else(|| format!("Unknown template '{template}'"))?
            .normalize();
        let request = create_request(&config, template)?;
        let save_point = self.history.save_point();
        Ok(self.dispatch(
            StoreOp::Create(request),
            PendingRemote::Create {
                replacement: Some(Box::new(config)),
                save_point,
            },
        ))
    }

    /// Starts a background `GET /projects`.
    pub fn list_remote(&mut self) -> u64 {
        self.dispatch(StoreOp::List, PendingRemote::List)
    }

    fn dispatch(&mut self, op: StoreOp, pending: PendingRemote) -> u64 {
        let ticket = self.remote.dispatch(self.store.clone(), op);
        self.pending.insert(ticket, pending);
        ticket
    }

    /// Applies every finished API call. Returns them so callers can answer
    /// whoever asked.
    pub fn poll_remote(&mut self) -> Vec<RemoteCompletion> {
        self.remote
            .poll()
            .into_iter()
            .filter_map(|outcome| self.apply_outcome(outcome))
            .collect()
    }

    /// Blocks up to `timeout` for one API call to finish.
    pub fn wait_remote(&mut self, timeout: Duration) -> Option<RemoteCompletion> {
        let outcome = self.remote.wait(timeout)?;
        self.apply_outcome(outcome)
    }

    pub fn remote_in_flight(&self) -> usize {
        self.remote.in_flight()
    }

    fn apply_outcome(&mut self, outcome: StoreOutcome) -> Option<RemoteCompletion> {
        let Some(pending) = self.pending.remove(&outcome.ticket) else {
            warn!("[Palace store] result for unknown ticket {}", outcome.ticket);
            return None;
        };
        let result = match (pending, outcome.reply) {
            (PendingRemote::Save { save_point }, StoreReply::Updated(result)) => {
                match result {
                    Ok(()) => {
                        self.history.mark_saved_at(save_point);
                        info!("[Palace save] project {} saved", self.config.id);
                        self.notify(NoticeLevel::Info, "Project saved");
                        RemoteResult::Saved(Ok(()))
                    }
                    Err(e) => {
                        let message = format!("Save failed: {e}");
                        self.notify(NoticeLevel::Error, message.clone());
                        RemoteResult::Saved(Err(message))
                    }
                }
            }
            (
                PendingRemote::Create {
                    replacement,
                    save_point,
                },
                StoreReply::Created(result),
            ) => match result {
                Ok(summary) => {
                    self.adopt_created(&summary, replacement.map(|c| *c), save_point);
                    RemoteResult::Created(Ok(summary))
                }
                Err(e) => {
                    let message = format!("Create failed: {e}");
                    self.notify(NoticeLevel::Error, message.clone());
                    RemoteResult::Created(Err(message))
                }
            },
            (PendingRemote::List, StoreReply::Listed(result)) => {
                RemoteResult::Listed(result.map_err(|e| {
                    let message = format!("Could not list projects: {e}");
                    self.notify(NoticeLevel::Error, message.clone());
                    message
                }))
            }
            (_, reply) => {
                warn!("[Palace store] mismatched reply for ticket {}: {reply:?}", outcome.ticket);
                return None;
            }
        };
        Some(RemoteCompletion {
            ticket: outcome.ticket,
            result,
        })
    }

    fn adopt_created(
        &mut self,
        summary: &ProjectSummary,
        replacement: Option<GameConfig>,
        save_point: u64,
    ) {
        match replacement {
            Some(mut config) => {
                config.id = summary.id.clone();
                self.current_scene_id = config
                    .main_scene()
                    .map(|s| s.id.clone())
                    .unwrap_or_default();
                self.config = config;
                self.selected = None;
                self.history.clear();
                self.history.mark_saved();
            }
            None => {
                self.config.id = summary.id.clone();
                self.history.mark_saved_at(save_point);
            }
        }
        self.mirror_cache();
        info!("[Palace] created remote project {}", summary.id);
        self.notify(NoticeLevel::Info, format!("Created project {}", summary.name));
    }

    fn mirror_cache(&mut self) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.store(&self.config) {
            warn!("[Palace] failed to cache editor state: {e}");
        }
    }
}

fn payload_for(config: &GameConfig) -> Result<ProjectPayload, String> {
    let state = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize project: {e}"))?;
    Ok(ProjectPayload {
        files: vec![
            ProjectFile {
                path: MAIN_FILE.to_string(),
                content: codegen::generate(config),
            },
            ProjectFile {
                path: CONFIG_FILE.to_string(),
                content: state,
            },
        ],
        assets: config.assets.clone(),
    })
}

fn create_request(config: &GameConfig, template: &str) -> Result<CreateProjectRequest, String> {
    let payload = payload_for(config)?;
    Ok(CreateProjectRequest {
        name: config.name.clone(),
        template: template.to_string(),
        files: payload.files,
        assets: payload.assets,
    })
}
