use super::*;

pub(super) type Reply<T> = tokio::sync::oneshot::Sender<T>;

/// Sends a command to the editor loop and waits for its reply.
pub(super) async fn ask<T>(
    state: &AppState,
    command: impl FnOnce(Reply<T>) -> ApiCommand,
) -> Result<T, String> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    state
        .sender
        .send(command(tx))
        .map_err(|_| "Editor loop stopped".to_string())?;
    rx.await.map_err(|_| "Channel closed".to_string())
}

pub(super) fn respond<T: Serialize>(result: Result<T, String>) -> Json<ApiResponse<T>> {
    match result {
        Ok(data) => Json(ApiResponse::success(data)),
        Err(e) => Json(ApiResponse::failure(e)),
    }
}

pub(super) fn respond_unit(result: Result<(), String>) -> Json<ApiResponse<String>> {
    match result {
        Ok(()) => Json(ApiResponse::ok()),
        Err(e) => Json(ApiResponse::err(e)),
    }
}

/// Builds the entity a create request describes, starting from the palette
/// preset for its type.
pub(super) fn entity_from_request(req: CreateEntityRequest) -> Entity {
    let id = req
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| req.kind.clone());
    let mut entity = templates::entity_preset(id, &req.kind, Position { x: req.x, y: req.y });
    if let Some(name) = req.name.filter(|n| !n.trim().is_empty()) {
        entity.name = name;
    }
    if req.width.is_some() || req.height.is_some() {
        let preset = entity.size_or_default();
        entity.size = Some(Size {
            width: req.width.unwrap_or(preset.width),
            height: req.height.unwrap_or(preset.height),
        });
    }
    if let Some(layer) = req.layer {
        entity.layer = layer;
    }
    entity.properties.extend(req.properties);
    entity
}
