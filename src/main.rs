mod api;
mod behaviors;
mod codegen;
mod config;
mod controller;
mod history;
mod model;
mod persistence;
mod templates;

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{load_startup_config, PalaceConfig};
use controller::ProjectBuilder;
use model::GameConfig;
use persistence::{HttpProjectStore, LocalCache, MemoryProjectStore, ProjectStore};

const DEFAULT_PROJECT_NAME: &str = "Untitled Game";

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn read_project(path: &Path) -> Result<GameConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str::<GameConfig>(&text)
        .map(GameConfig::normalize)
        .map_err(|e| format!("Failed to parse {}: {e}", path.display()))
}

/// Opens the configured project file, else the cached editor state, else a
/// fresh project from the configured template.
fn open_project(
    cfg: &PalaceConfig,
    store: Arc<dyn ProjectStore>,
    cache: &LocalCache,
) -> ProjectBuilder {
    if let Some(path) = &cfg.project {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                info!("[Palace] Opening {}", path.display());
                return ProjectBuilder::from_config_json(&text, cfg.max_undo, store);
            }
            Err(e) => warn!("[Palace] Failed to read {}: {e}", path.display()),
        }
    }
    match cache.load() {
        Ok(Some(text)) => {
            info!("[Palace] Restoring editor state from {}", cache.path().display());
            return ProjectBuilder::from_config_json(&text, cfg.max_undo, store);
        }
        Ok(None) => {}
        Err(e) => warn!("[Palace] Ignoring unreadable editor cache: {e}"),
    }
    let fresh = ProjectBuilder::from_template(
        &cfg.template,
        DEFAULT_PROJECT_NAME,
        cfg.max_undo,
        store.clone(),
    );
    match fresh {
        Ok(builder) => builder,
        Err(e) => {
            warn!("[Palace] {e}, using {}", templates::DEFAULT_TEMPLATE);
            ProjectBuilder::new(
                GameConfig::new("untitled", DEFAULT_PROJECT_NAME),
                cfg.max_undo,
                store,
            )
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cfg = PalaceConfig::from_env(load_startup_config());

    if let Some(path) = flag_value(&args, "--generate") {
        match read_project(Path::new(path)) {
            Ok(config) => {
                print!("{}", codegen::generate(&config));
                return;
            }
            Err(e) => {
                eprintln!("[Palace] {e}");
                std::process::exit(2);
            }
        }
    }

    if let Some(path) = flag_value(&args, "--export") {
        let written = read_project(Path::new(path)).and_then(|config| {
            persistence::write_export(
                &cfg.export_dir,
                &codegen::export_file_name(&config.name),
                &codegen::generate(&config),
            )
            .map_err(|e| e.to_string())
        });
        match written {
            Ok(out) => {
                info!("[Palace] Exported {}", out.display());
                return;
            }
            Err(e) => {
                eprintln!("[Palace] Export failed: {e}");
                std::process::exit(2);
            }
        }
    }

    let store: Arc<dyn ProjectStore> = if cfg.offline {
        info!("[Palace] Offline mode: projects are kept in memory");
        Arc::new(MemoryProjectStore::new())
    } else {
        info!("[Palace] Project API at {}", cfg.persistence_url);
        Arc::new(HttpProjectStore::new(
            cfg.persistence_url.clone(),
            cfg.persistence_token.clone(),
        ))
    };
    let cache = LocalCache::new(cfg.cache_dir.clone());
    let builder = open_project(&cfg, store, &cache).with_cache(cache);

    let (runtime, sender) = api::EditorRuntime::new(builder, cfg.export_dir.clone());
    api::spawn_api(cfg.api_addr.clone(), sender);
    runtime.run();
}
