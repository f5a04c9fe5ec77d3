//! HTTP surface of the editor. Handlers never touch the project directly:
//! they send [`ApiCommand`]s to the [`EditorRuntime`] and await its reply.

mod command_runtime;
mod commands;
mod helpers;
mod router;
mod routes_entities;
mod routes_history;
mod routes_project;
mod security;
mod state;
pub mod types;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::behaviors::{self, BehaviorDefaults, BehaviorEdit, EntityBehavior};
use crate::codegen::{self, catalog::ComponentDefinition};
use crate::controller::{EntityEdit, HistorySummary, Notification, ProjectBuilder, SettingsPatch};
use crate::model::{Entity, GameConfig, GameSettings, Position, Size};
use crate::persistence::ProjectSummary;
use crate::templates;
pub use command_runtime::EditorRuntime;
pub use commands::ApiCommand;
use helpers::*;
use router::build_router;
use routes_entities::*;
use routes_history::*;
use routes_project::*;
use security::*;
use state::*;
use types::*;

/// Serves the editor API on `addr` from a dedicated thread with its own
/// tokio runtime. The thread drops `sender` when the server stops, which
/// ends the editor loop.
pub fn spawn_api(addr: String, sender: Sender<ApiCommand>) -> std::thread::JoinHandle<()> {
    let state = AppState { sender };
    let security = ApiSecurity::from_env();
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                warn!("[Palace API] Failed to start runtime: {e}");
                return;
            }
        };
        rt.block_on(async move {
            let app = build_router(state, security);
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    warn!("[Palace API] Failed to bind {addr}: {e}");
                    return;
                }
            };
            info!("[Palace API] Listening on http://{addr}");
            let service = app.into_make_service_with_connect_info::<std::net::SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                warn!("[Palace API] Server stopped: {e}");
            }
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryProjectStore;
    use axum::http::Request as HttpRequest;
    use tower::util::ServiceExt;

    fn test_app(security: ApiSecurity) -> Router {
        let builder = ProjectBuilder::from_template(
            "platformer",
            "Router Test",
            20,
            Arc::new(MemoryProjectStore::new()),
        )
        .expect("template");
        let export_dir = std::env::temp_dir().join("pixel-palace-router-tests");
        let (runtime, sender) = EditorRuntime::new(builder, export_dir);
        std::thread::spawn(move || runtime.run());
        build_router(AppState { sender }, security)
    }

    fn open_app() -> Router {
        test_app(ApiSecurity::new(None, 1000))
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> serde_json::Value {
        let builder = HttpRequest::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(axum::body::Body::from(json.to_string())),
            None => builder.body(axum::body::Body::empty()),
        }
        .expect("request");
        let res = app.clone().oneshot(req).await.expect("response");
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn create_then_fetch_entity() {
        let app = open_app();
        let created = call(
            &app,
            "POST",
            "/entities",
            Some(serde_json::json!({"type": "enemy", "x": 64.0, "y": 64.0})),
        )
        .await;
        assert_eq!(created["ok"], true);
        assert_eq!(created["data"]["id"], "enemy_1");

        let fetched = call(&app, "GET", "/entities/enemy_1", None).await;
        assert_eq!(fetched["data"]["type"], "enemy");
        assert_eq!(fetched["data"]["position"]["x"], 64.0);

        let missing = call(&app, "GET", "/entities/ghost", None).await;
        assert_eq!(missing["ok"], false);
        assert!(missing["error"]
            .as_str()
            .expect("error text")
            .contains("ghost"));
    }

    #[tokio::test]
    async fn undo_reverts_a_delete() {
        let app = open_app();
        let deleted = call(&app, "DELETE", "/entities/coin", None).await;
        assert_eq!(deleted["ok"], true);
        let gone = call(&app, "GET", "/entities/coin", None).await;
        assert_eq!(gone["ok"], false);

        let undo = call(&app, "POST", "/undo", None).await;
        assert_eq!(undo["data"]["applied"], true);
        assert_eq!(undo["data"]["history"]["canRedo"], true);
        let back = call(&app, "GET", "/entities/coin", None).await;
        assert_eq!(back["ok"], true);

        let history = call(&app, "GET", "/history", None).await;
        assert_eq!(history["data"]["canUndo"], false);
    }

    #[tokio::test]
    async fn behavior_routes_edit_entity_behaviors() {
        let app = open_app();
        let added = call(
            &app,
            "POST",
            "/entities/player/behaviors",
            Some(serde_json::json!({"type": "jump"})),
        )
        .await;
        assert_eq!(added["ok"], true);
        let behavior_id = added["data"]["id"].as_str().expect("behavior id").to_string();

        let edited = call(
            &app,
            "POST",
            &format!("/entities/player/behaviors/{behavior_id}"),
            Some(serde_json::json!({"edits": [{"op": "set_enabled", "enabled": false}]})),
        )
        .await;
        assert_eq!(edited["data"]["enabled"], false);

        let removed = call(
            &app,
            "DELETE",
            &format!("/entities/player/behaviors/{behavior_id}"),
            None,
        )
        .await;
        assert_eq!(removed["ok"], true);

        let catalog = call(&app, "GET", "/behaviors", None).await;
        assert_eq!(catalog["data"].as_array().map(Vec::len), Some(10));
    }

    #[tokio::test]
    async fn component_choice_changes_generated_code() {
        let app = open_app();
        let components = call(&app, "GET", "/components", None).await;
        assert!(components["data"]
            .as_array()
            .expect("components")
            .iter()
            .any(|c| c["id"] == "shooting"));

        let before = call(&app, "GET", "/code", None).await;
        assert!(!before["data"]
            .as_str()
            .expect("code")
            .contains("# Combat Systems"));

        let chosen = call(
            &app,
            "POST",
            "/components/choice",
            Some(serde_json::json!({"componentId": "shooting", "choice": "A"})),
        )
        .await;
        assert_eq!(chosen["ok"], true);
        let after = call(&app, "GET", "/code", None).await;
        assert!(after["data"]
            .as_str()
            .expect("code")
            .contains("# Combat Systems"));
    }

    #[tokio::test]
    async fn settings_reject_zero_fps() {
        let app = open_app();
        let bad = call(&app, "POST", "/settings", Some(serde_json::json!({"fps": 0}))).await;
        assert_eq!(bad["ok"], false);
        let good = call(&app, "POST", "/settings", Some(serde_json::json!({"fps": 30}))).await;
        assert_eq!(good["data"]["fps"], 30);
    }

    #[tokio::test]
    async fn listed_templates_start_new_projects() {
        let app = open_app();
        let listed = call(&app, "GET", "/templates", None).await;
        let names: Vec<&str> = listed["data"]
            .as_array()
            .expect("templates")
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names, vec!["blank", "platformer", "top_down"]);

        let created = call(
            &app,
            "POST",
            "/projects",
            Some(serde_json::json!({"template": "top_down", "name": "Arena"})),
        )
        .await;
        assert_eq!(created["ok"], true);
        assert_eq!(created["data"]["name"], "Arena");
        let project = call(&app, "GET", "/project", None).await;
        assert_eq!(project["data"]["name"], "Arena");
        assert_eq!(project["data"]["id"], created["data"]["id"]);

        let projects = call(&app, "GET", "/projects", None).await;
        assert_eq!(projects["data"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn guard_protects_every_route() {
        let app = test_app(ApiSecurity::new(Some("secret".to_string()), 1000));
        let req = HttpRequest::builder()
            .uri("/project")
            .body(axum::body::Body::empty())
            .expect("request");
        let res = app.clone().oneshot(req).await.expect("response");
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = HttpRequest::builder()
            .uri("/project")
            .header("authorization", "Bearer secret")
            .body(axum::body::Body::empty())
            .expect("request");
        let res = app.oneshot(req).await.expect("response");
        assert_eq!(res.status(), StatusCode::OK);
    }
}
