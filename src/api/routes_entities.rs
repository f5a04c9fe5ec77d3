use super::*;

pub(super) async fn list_entities(State(state): State<AppState>) -> Json<ApiResponse<Vec<Entity>>> {
    respond(ask(&state, ApiCommand::ListEntities).await)
}

pub(super) async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ApiResponse<Entity>> {
    let lookup = id.clone();
    respond(
        ask(&state, |tx| ApiCommand::GetEntity(lookup, tx))
            .await
            .and_then(|entity| entity.ok_or_else(|| format!("Entity '{id}' not found"))),
    )
}

pub(super) async fn create_entity(
    State(state): State<AppState>,
    Json(req): Json<CreateEntityRequest>,
) -> Json<ApiResponse<EntityCreated>> {
    if req.kind.trim().is_empty() {
        return Json(ApiResponse::failure("type must not be empty"));
    }
    respond(
        ask(&state, |tx| ApiCommand::CreateEntity(req, tx))
            .await
            .and_then(|r| r)
            .map(|id| EntityCreated { id }),
    )
}

pub(super) async fn delete_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ApiResponse<String>> {
    respond_unit(
        ask(&state, |tx| ApiCommand::DeleteEntity(id, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn edit_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EntityEditRequest>,
) -> Json<ApiResponse<Entity>> {
    respond(
        ask(&state, |tx| ApiCommand::EditEntity(id, req.edits, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn duplicate_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ApiResponse<EntityCreated>> {
    respond(
        ask(&state, |tx| ApiCommand::DuplicateEntity(id, tx))
            .await
            .and_then(|r| r)
            .map(|id| EntityCreated { id }),
    )
}

pub(super) async fn select_entity(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Json<ApiResponse<String>> {
    respond_unit(
        ask(&state, |tx| ApiCommand::SelectEntity(req.entity_id, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn add_behavior(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddBehaviorRequest>,
) -> Json<ApiResponse<EntityBehavior>> {
    respond(
        ask(&state, |tx| ApiCommand::AddBehavior(id, req, tx))
            .await
            .and_then(|r| r),
    )
}

pub(super) async fn edit_behavior(
    State(state): State<AppState>,
    Path((id, behavior_id)): Path<(String, String)>,
    Json(req): Json<BehaviorEditRequest>,
) -> Json<ApiResponse<EntityBehavior>> {
    respond(
        ask(&state, |tx| {
            ApiCommand::EditBehavior(id, behavior_id, req.edits, tx)
        })
        .await
        .and_then(|r| r),
    )
}

pub(super) async fn remove_behavior(
    State(state): State<AppState>,
    Path((id, behavior_id)): Path<(String, String)>,
) -> Json<ApiResponse<String>> {
    respond_unit(
        ask(&state, |tx| ApiCommand::RemoveBehavior(id, behavior_id, tx))
            .await
            .and_then(|r| r),
    )
}
