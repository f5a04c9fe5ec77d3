use super::*;

/// Commands sent from API handlers to the editor loop
pub enum ApiCommand {
    GetProject(Reply<GameConfig>),
    GetScene(Reply<Option<SceneView>>),
    SelectScene(String, Reply<Result<(), String>>),
    AddScene(String, Reply<Result<String, String>>),
    SetMainScene(String, Reply<Result<(), String>>),
    ListEntities(Reply<Vec<Entity>>),
    GetEntity(String, Reply<Option<Entity>>),
    CreateEntity(CreateEntityRequest, Reply<Result<String, String>>),
    EditEntity(String, Vec<EntityEdit>, Reply<Result<Entity, String>>),
    DeleteEntity(String, Reply<Result<(), String>>),
    DuplicateEntity(String, Reply<Result<String, String>>),
    SelectEntity(Option<String>, Reply<Result<(), String>>),
    AddBehavior(
        String,
        AddBehaviorRequest,
        Reply<Result<EntityBehavior, String>>,
    ),
    EditBehavior(
        String,
        String,
        Vec<BehaviorEdit>,
        Reply<Result<EntityBehavior, String>>,
    ),
    RemoveBehavior(String, String, Reply<Result<(), String>>),
    Undo(Reply<UndoResponse>),
    Redo(Reply<UndoResponse>),
    GetHistory(Reply<HistorySummary>),
    SetComponentChoice(ComponentChoiceRequest, Reply<()>),
    UpdateSettings(SettingsPatch, Reply<Result<GameSettings, String>>),
    GetCode(Reply<String>),
    Export(Reply<Result<ExportResponse, String>>),
    Save(Reply<Result<(), String>>),
    CreateProject(CreateProjectBody, Reply<Result<ProjectSummary, String>>),
    ListProjects(Reply<Result<Vec<ProjectSummary>, String>>),
    DrainNotifications(Reply<Vec<Notification>>),
}
