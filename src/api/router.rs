use super::*;

pub(super) fn build_router(state: AppState, security: ApiSecurity) -> Router {
    Router::new()
        .route("/project", get(get_project))
        .route("/scene", get(get_scene))
        .route("/scene/select", post(select_scene))
        .route("/scenes", post(add_scene))
        .route("/scenes/{id}/main", post(set_main_scene))
        .route("/entities", get(list_entities).post(create_entity))
        .route("/entities/{id}", get(get_entity).delete(delete_entity))
        .route("/entities/{id}/edit", post(edit_entity))
        .route("/entities/{id}/duplicate", post(duplicate_entity))
        .route("/select", post(select_entity))
        .route("/entities/{id}/behaviors", post(add_behavior))
        .route(
            "/entities/{id}/behaviors/{behavior_id}",
            post(edit_behavior).delete(remove_behavior),
        )
        .route("/behaviors", get(list_behaviors))
        .route("/undo", post(undo))
        .route("/redo", post(redo))
        .route("/history", get(get_history))
        .route("/components", get(list_components))
        .route("/components/choice", post(set_component_choice))
        .route("/settings", post(update_settings))
        .route("/code", get(get_code))
        .route("/export", post(export_game))
        .route("/save", post(save_project))
        .route("/templates", get(list_templates))
        .route("/projects", get(list_projects).post(create_project))
        .route("/notifications", get(drain_notifications))
        .with_state(state)
        .layer(middleware::from_fn_with_state(security, api_guard))
}
