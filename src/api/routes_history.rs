use super::*;

pub(super) async fn undo(State(state): State<AppState>) -> Json<ApiResponse<UndoResponse>> {
    respond(ask(&state, ApiCommand::Undo).await)
}

pub(super) async fn redo(State(state): State<AppState>) -> Json<ApiResponse<UndoResponse>> {
    respond(ask(&state, ApiCommand::Redo).await)
}

pub(super) async fn get_history(State(state): State<AppState>) -> Json<ApiResponse<HistorySummary>> {
    respond(ask(&state, ApiCommand::GetHistory).await)
}
