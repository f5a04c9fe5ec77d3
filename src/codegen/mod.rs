//! Python source generation for a [`GameConfig`].
//!
//! `generate` is pure: the same config always yields byte-identical output,
//! and it never fails. Missing data falls back to the model defaults.

pub mod catalog;
pub mod ir;
pub mod printer;
mod scaffold;

use crate::behaviors::EntityBehavior;
use crate::model::{
    Entity, GameConfig, Scene, DEFAULT_BACKGROUND, DEFAULT_GRID_SIZE, DEFAULT_SCREEN_HEIGHT,
    DEFAULT_SCREEN_WIDTH,
};
use catalog::{find_component, Category, ComponentDefinition};
use ir::{Expr, Ident, IdentAllocator, Module, Stmt};

pub const MAIN_FILE: &str = "main.py";

pub fn generate(config: &GameConfig) -> String {
    printer::render(&build_module(config))
}

pub fn build_module(config: &GameConfig) -> Module {
    let scene = config.main_scene();
    let mut module = Module::default();

    module.push(Stmt::Comment("Generated by Pixel's PyGame Palace".to_string()));
    module.push(Stmt::Comment(format!("Project: {}", config.name)));
    module.push(Stmt::Blank);
    module.push(Stmt::Verbatim(scaffold::IMPORTS));
    module.push(Stmt::Blank);
    module.push(Stmt::Expr(Expr::name("pygame").attr("init").call(Vec::new())));
    module.push(Stmt::Blank);

    module.extend(constants(config, scene));
    module.push(Stmt::Blank);
    module.push(Stmt::Verbatim(scaffold::DISPLAY_SETUP));
    module.push(Stmt::Blank);
    module.push(Stmt::Verbatim(scaffold::RUNTIME));
    module.push(Stmt::Blank);

    module.extend(component_blocks(config));

    if let Some(scene) = scene {
        module.extend(scene_objects(scene));
    }
    module.push(Stmt::Verbatim(scaffold::LAYER_SORT));
    module.push(Stmt::Blank);
    module.push(Stmt::Verbatim(scaffold::MAIN_LOOP));
    module
}

fn constants(config: &GameConfig, scene: Option<&Scene>) -> Vec<Stmt> {
    let (width, height, background, grid) = match scene {
        Some(s) => (s.width, s.height, s.background_color.as_str(), s.grid_size),
        None => (
            DEFAULT_SCREEN_WIDTH,
            DEFAULT_SCREEN_HEIGHT,
            DEFAULT_BACKGROUND,
            DEFAULT_GRID_SIZE,
        ),
    };
    let settings = &config.settings;
    let assign = |name: &'static str, value: Expr| Stmt::Assign(Ident::fixed(name), value);
    vec![
        Stmt::Comment("Game settings".to_string()),
        assign("SCREEN_WIDTH", Expr::Int(width.into())),
        assign("SCREEN_HEIGHT", Expr::Int(height.into())),
        assign("FPS", Expr::Int(settings.fps.into())),
        assign("BACKGROUND_COLOR", Expr::str(background)),
        assign("GAME_TITLE", Expr::str(config.name.as_str())),
        // range() in the grid helper rejects a zero step.
        assign("GRID_SIZE", Expr::Int(grid.max(1).into())),
        assign("SHOW_GRID", Expr::Bool(settings.show_grid)),
        assign("PHYSICS_ENABLED", Expr::Bool(settings.physics_enabled)),
        assign("DEBUG_MODE", Expr::Bool(settings.debug_mode)),
    ]
}

/// Chosen component snippets grouped under one header per category.
/// Categories appear in order of their first chosen component; within a
/// category, components keep their choice order. Unknown ids add nothing.
fn component_blocks(config: &GameConfig) -> Vec<Stmt> {
    let mut groups: Vec<(Category, Vec<&'static str>)> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    for choice in &config.component_choices {
        if seen.contains(&choice.component_id.as_str()) {
            continue;
        }
        seen.push(&choice.component_id);
        let Some(component) = find_component(&choice.component_id) else {
            continue;
        };
        let Some(selected) = config.choice_for(component.id) else {
            continue;
        };
        let code = component.variant(selected).code;
        match groups.iter_mut().find(|(c, _)| *c == component.category) {
            Some((_, blocks)) => blocks.push(code),
            None => groups.push((component.category, vec![code])),
        }
    }

    let mut stmts = Vec::new();
    for (category, blocks) in groups {
        stmts.push(Stmt::Comment(category.header().to_string()));
        for code in blocks {
            stmts.push(Stmt::Verbatim(code));
            stmts.push(Stmt::Blank);
        }
    }
    stmts
}

fn scene_objects(scene: &Scene) -> Vec<Stmt> {
    let mut stmts = vec![Stmt::Comment(format!("Scene: {}", scene.name))];
    let mut idents = IdentAllocator::default();
    for entity in &scene.entities {
        let var = idents.allocate(Ident::for_entity(&entity.id));
        stmts.push(Stmt::Assign(var.clone(), entity_constructor(entity)));
        stmts.push(Stmt::Expr(
            Expr::name("game_objects")
                .attr("append")
                .call(vec![Expr::Name(var)]),
        ));
    }
    stmts
}

fn entity_constructor(entity: &Entity) -> Expr {
    let size = entity.size_or_default();
    let properties = Expr::Dict(
        entity
            .properties
            .iter()
            .map(|(k, v)| (Expr::str(k.as_str()), Expr::from_json(v)))
            .collect(),
    );
    let behaviors = Expr::List(
        entity
            .behaviors
            .iter()
            .filter(|b| b.enabled)
            .map(behavior_literal)
            .collect(),
    );
    Expr::name("create_game_object").call_kw(
        vec![
            Expr::str(entity.kind.as_str()),
            Expr::Float(entity.position.x),
            Expr::Float(entity.position.y),
            Expr::Float(size.width),
            Expr::Float(size.height),
        ],
        vec![
            (Ident::fixed("name"), Expr::str(entity.name.as_str())),
            (Ident::fixed("layer"), Expr::Int(entity.layer.into())),
            (Ident::fixed("visible"), Expr::Bool(entity.visible)),
            (Ident::fixed("properties"), properties),
            (Ident::fixed("behaviors"), behaviors),
        ],
    )
}

fn behavior_literal(behavior: &EntityBehavior) -> Expr {
    let trigger = serde_json::to_value(&behavior.trigger).unwrap_or(serde_json::Value::Null);
    let params = Expr::Dict(
        behavior
            .parameters
            .iter()
            .map(|(k, v)| (Expr::str(k.as_str()), Expr::from_json(v)))
            .collect(),
    );
    Expr::Dict(vec![
        (Expr::str("id"), Expr::str(behavior.id.as_str())),
        (Expr::str("type"), Expr::str(behavior.kind.as_str())),
        (Expr::str("trigger"), Expr::from_json(&trigger)),
        (Expr::str("params"), params),
    ])
}

/// Download name for a project: whitespace runs and path separators become
/// `_`, and an empty name falls back to `game`.
pub fn export_file_name(project_name: &str) -> String {
    let joined = project_name.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned: String = joined
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    let stem = cleaned.trim_matches('.');
    if stem.is_empty() {
        "game.py".to_string()
    } else {
        format!("{stem}.py")
    }
}

/// Components available for choice lists in editor palettes.
pub fn available_components() -> &'static [ComponentDefinition] {
    catalog::components()
}
