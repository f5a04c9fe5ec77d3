use std::path::PathBuf;

use tracing::{info, warn};

use crate::history::DEFAULT_MAX_UNDO;

pub const DEFAULT_CONFIG_FILE: &str = "palace.json";
pub const DEFAULT_API_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_PERSISTENCE_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_CACHE_DIR: &str = ".palace";
pub const DEFAULT_EXPORT_DIR: &str = "export";

/// Contents of `palace.json`. Every field is optional.
#[derive(serde::Deserialize, Default, Debug, Clone, PartialEq)]
pub struct StartupConfig {
    pub api_addr: Option<String>,
    pub persistence_url: Option<String>,
    pub persistence_token: Option<String>,
    pub cache_dir: Option<String>,
    pub export_dir: Option<String>,
    pub max_undo: Option<usize>,
    pub project: Option<String>,
    pub template: Option<String>,
    /// Keep projects in memory instead of talking to the project API.
    #[serde(default)]
    pub offline: bool,
}

/// Resolved settings after applying environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct PalaceConfig {
    pub api_addr: String,
    pub persistence_url: String,
    pub persistence_token: Option<String>,
    pub cache_dir: PathBuf,
    pub export_dir: PathBuf,
    pub max_undo: usize,
    pub project: Option<PathBuf>,
    pub template: String,
    pub offline: bool,
}

pub fn load_startup_config() -> StartupConfig {
    let path = std::env::var("PALACE_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => parse_startup_config(&path, &contents),
        Err(_) => StartupConfig::default(),
    }
}

fn parse_startup_config(path: &str, contents: &str) -> StartupConfig {
    match serde_json::from_str::<StartupConfig>(contents) {
        Ok(cfg) => {
            info!("[Palace] Loaded startup config from {path}");
            cfg
        }
        Err(e) => {
            warn!("[Palace] Failed to parse {path}: {e}");
            StartupConfig::default()
        }
    }
}

impl PalaceConfig {
    pub fn from_env(file: StartupConfig) -> Self {
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Env vars override file values; empty env values are ignored.
    pub fn resolve(file: StartupConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| env(key).filter(|s| !s.trim().is_empty());
        let max_undo = match var("PALACE_MAX_UNDO") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!("[Palace] Ignoring invalid PALACE_MAX_UNDO={raw}");
                    file.max_undo.unwrap_or(DEFAULT_MAX_UNDO)
                }
            },
            None => file.max_undo.unwrap_or(DEFAULT_MAX_UNDO),
        };
        let offline = match var("PALACE_OFFLINE") {
            Some(raw) => matches!(raw.trim(), "1" | "true" | "yes"),
            None => file.offline,
        };
        Self {
            api_addr: var("PALACE_API_ADDR")
                .or(file.api_addr)
                .unwrap_or_else(|| DEFAULT_API_ADDR.to_string()),
            persistence_url: var("PALACE_PERSISTENCE_URL")
                .or(file.persistence_url)
                .unwrap_or_else(|| DEFAULT_PERSISTENCE_URL.to_string()),
            persistence_token: var("PALACE_PERSISTENCE_TOKEN").or(file.persistence_token),
            cache_dir: var("PALACE_CACHE_DIR")
                .or(file.cache_dir)
                .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string())
                .into(),
            export_dir: var("PALACE_EXPORT_DIR")
                .or(file.export_dir)
                .unwrap_or_else(|| DEFAULT_EXPORT_DIR.to_string())
                .into(),
            max_undo: max_undo.max(1),
            project: var("PALACE_PROJECT").or(file.project).map(PathBuf::from),
            template: var("PALACE_TEMPLATE")
                .or(file.template)
                .unwrap_or_else(|| crate::templates::DEFAULT_TEMPLATE.to_string()),
            offline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let cfg = PalaceConfig::resolve(StartupConfig::default(), env_of(&[]));
        assert_eq!(cfg.api_addr, "127.0.0.1:3000");
        assert_eq!(cfg.persistence_url, "http://127.0.0.1:5000/api");
        assert_eq!(cfg.cache_dir, PathBuf::from(".palace"));
        assert_eq!(cfg.export_dir, PathBuf::from("export"));
        assert_eq!(cfg.max_undo, 100);
        assert_eq!(cfg.template, "blank");
        assert!(cfg.project.is_none());
        assert!(!cfg.offline);
    }

    #[test]
    fn env_overrides_file_values() {
        let file = parse_startup_config(
            "palace.json",
            r#"{"api_addr": "0.0.0.0:8080", "max_undo": 20, "export_dir": "out"}"#,
        );
        let cfg = PalaceConfig::resolve(
            file,
            env_of(&[
                ("PALACE_API_ADDR", "127.0.0.1:9999"),
                ("PALACE_EXPORT_DIR", ""),
                ("PALACE_PROJECT", "demo/.gameconfig.json"),
            ]),
        );
        assert_eq!(cfg.api_addr, "127.0.0.1:9999");
        assert_eq!(cfg.max_undo, 20);
        assert_eq!(cfg.export_dir, PathBuf::from("out"));
        assert_eq!(cfg.project, Some(PathBuf::from("demo/.gameconfig.json")));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = PalaceConfig::resolve(
            StartupConfig::default(),
            env_of(&[("PALACE_MAX_UNDO", "lots"), ("PALACE_OFFLINE", "true")]),
        );
        assert_eq!(cfg.max_undo, 100);
        assert!(cfg.offline);
        assert_eq!(
            parse_startup_config("palace.json", "{not json"),
            StartupConfig::default()
        );
    }
}
