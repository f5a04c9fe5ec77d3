use super::*;

pub(super) async fn get_project(State(state): State<AppState>) -> Json<ApiResponse<GameConfig>> {
    respond(ask(&state, ApiCommand::GetProject).await)
}

pub(super) async fn get_scene(State(state): State<AppState>) -> Json<ApiResponse<SceneView>> {
    respond(
        ask(&state, ApiCommand::GetScene)
            .await
            .and_then(|scene| scene.ok_or_else(|| "Project has no scenes".to_string())),
    )
}

pub(super) async fn select_scene(
    State(state): State<AppState>,
    Json(req): Json<SelectSceneRequest>,
) -> Json<ApiResponse<String>> {
    respond_unit(
        ask(&state, |tx| ApiCommand::SelectScene(req.scene_id, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn add_scene(
    State(state): State<AppState>,
    Json(req): Json<AddSceneRequest>,
) -> Json<ApiResponse<String>> {
    respond(
        ask(&state, |tx| ApiCommand::AddScene(req.name, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn set_main_scene(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ApiResponse<String>> {
    respond_unit(
        ask(&state, |tx| ApiCommand::SetMainScene(id, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn list_behaviors() -> Json<ApiResponse<Vec<BehaviorDefaults>>> {
    Json(ApiResponse::success(behaviors::catalog()))
}

pub(super) async fn list_templates() -> Json<ApiResponse<Vec<templates::StarterTemplate>>> {
    Json(ApiResponse::success(templates::builtin_templates()))
}

pub(super) async fn list_components() -> Json<ApiResponse<&'static [ComponentDefinition]>> {
    Json(ApiResponse::success(codegen::available_components()))
}

pub(super) async fn set_component_choice(
    State(state): State<AppState>,
    Json(req): Json<ComponentChoiceRequest>,
) -> Json<ApiResponse<String>> {
    if req.component_id.trim().is_empty() {
        return Json(ApiResponse::err("componentId must not be empty"));
    }
    respond_unit(ask(&state, |tx| ApiCommand::SetComponentChoice(req, tx)).await)
}

pub(super) async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Json<ApiResponse<GameSettings>> {
    respond(
        ask(&state, |tx| ApiCommand::UpdateSettings(patch, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn get_code(State(state): State<AppState>) -> Json<ApiResponse<String>> {
    respond(ask(&state, ApiCommand::GetCode).await)
}

pub(super) async fn export_game(State(state): State<AppState>) -> Json<ApiResponse<ExportResponse>> {
    respond(ask(&state, ApiCommand::Export).await.and_then(|r| r))
}

pub(super) async fn save_project(State(state): State<AppState>) -> Json<ApiResponse<String>> {
    respond_unit(ask(&state, ApiCommand::Save).await.and_then(|r| r))
}

pub(super) async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectBody>,
) -> Json<ApiResponse<ProjectSummary>> {
    respond(
        ask(&state, |tx| ApiCommand::CreateProject(body, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn list_projects(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ProjectSummary>>> {
    respond(ask(&state, ApiCommand::ListProjects).await.and_then(|r| r))
}

pub(super) async fn drain_notifications(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<Notification>>> {
    respond(ask(&state, ApiCommand::DrainNotifications).await)
}
