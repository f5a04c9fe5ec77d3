use super::*;
use crate::behaviors::BehaviorKind;
use crate::controller::NoticeLevel;
use crate::model::ValueMap;
use crate::persistence::{
    CreateProjectRequest, MemoryProjectStore, ProjectPayload, ProjectStore, StoreError,
};
use std::sync::Arc;
use std::time::Instant;

/// Holds `list` and `create` until the test lets one through.
struct GatedStore {
    inner: MemoryProjectStore,
    gate: Receiver<()>,
}

impl ProjectStore for GatedStore {
    fn list(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        let _ = self.gate.recv();
        self.inner.list()
    }

    fn create(&self, request: &CreateProjectRequest) -> Result<ProjectSummary, StoreError> {
        let _ = self.gate.recv();
        self.inner.create(request)
    }

    fn update(&self, project_id: &str, payload: &ProjectPayload) -> Result<(), StoreError> {
        self.inner.update(project_id, payload)
    }
}

fn setup_runtime(
    store: Arc<dyn ProjectStore>,
) -> (EditorRuntime, Sender<ApiCommand>, tempfile::TempDir) {
    let builder = ProjectBuilder::from_template("platformer", "Coin Run", 20, store)
        .expect("platformer template");
    let dir = tempfile::tempdir().expect("tempdir");
    let (runtime, sender) = EditorRuntime::new(builder, dir.path());
    (runtime, sender, dir)
}

/// Processes commands until no project API call is left in flight.
fn settle(runtime: &mut EditorRuntime) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while runtime.builder().remote_in_flight() > 0 && Instant::now() < deadline {
        runtime.process_pending();
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(runtime.builder().remote_in_flight(), 0);
}

fn create_request(kind: &str, x: f64, y: f64) -> CreateEntityRequest {
    CreateEntityRequest {
        kind: kind.to_string(),
        x,
        y,
        id: None,
        name: None,
        width: None,
        height: None,
        layer: None,
        properties: ValueMap::new(),
    }
}

#[test]
fn create_edit_and_undo_through_commands() {
    let (mut runtime, sender, _dir) = setup_runtime(Arc::new(MemoryProjectStore::new()));

    let (create_tx, create_rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::CreateEntity(create_request("enemy", 96.0, 192.0), create_tx))
        .expect("send create");
    runtime.process_pending();
    let id = create_rx
        .blocking_recv()
        .expect("create response")
        .expect("created");
    assert_eq!(id, "enemy_1");

    let (edit_tx, edit_rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::EditEntity(
            id.clone(),
            vec![EntityEdit::Move { x: 300.0, y: 40.0 }],
            edit_tx,
        ))
        .expect("send edit");
    runtime.process_pending();
    let moved = edit_rx.blocking_recv().expect("edit response").expect("edited");
    assert_eq!(moved.position, Position { x: 300.0, y: 40.0 });

    let (undo_tx, undo_rx) = tokio::sync::oneshot::channel();
    sender.send(ApiCommand::Undo(undo_tx)).expect("send undo");
    runtime.process_pending();
    let undo = undo_rx.blocking_recv().expect("undo response");
    assert!(undo.applied);
    assert!(undo.history.can_redo);
    assert_eq!(
        runtime.builder().entity(&id).map(|e| e.position),
        Some(Position { x: 96.0, y: 192.0 })
    );
}

#[test]
fn create_applies_request_overrides() {
    let (mut runtime, sender, _dir) = setup_runtime(Arc::new(MemoryProjectStore::new()));

    let mut req = create_request("platform", 10.0, 300.0);
    req.id = Some("ledge".to_string());
    req.width = Some(64.0);
    let (tx, rx) = tokio::sync::oneshot::channel();
    sender.send(ApiCommand::CreateEntity(req, tx)).expect("send create");
    runtime.process_pending();
    let id = rx.blocking_recv().expect("response").expect("created");

    let entity = runtime.builder().entity(&id).expect("entity");
    assert_eq!(entity.size_or_default().width, 64.0);
    assert_eq!(entity.size_or_default().height, 32.0);
    assert_eq!(entity.position, Position { x: 0.0, y: 288.0 });
    assert_eq!(runtime.builder().selected_entity().map(|e| e.id.as_str()), Some("ledge"));
}

#[test]
fn behavior_commands_report_missing_targets() {
    let (mut runtime, sender, _dir) = setup_runtime(Arc::new(MemoryProjectStore::new()));

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::AddBehavior(
            "ghost".to_string(),
            AddBehaviorRequest {
                kind: BehaviorKind::Jump,
                trigger: None,
                parameters: ValueMap::new(),
            },
            tx,
        ))
        .expect("send add behavior");
    runtime.process_pending();
    let err = rx
        .blocking_recv()
        .expect("response")
        .expect_err("missing entity");
    assert!(err.contains("ghost"));

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::AddBehavior(
            "player".to_string(),
            AddBehaviorRequest {
                kind: BehaviorKind::Jump,
                trigger: None,
                parameters: ValueMap::new(),
            },
            tx,
        ))
        .expect("send add behavior");
    runtime.process_pending();
    let behavior = rx.blocking_recv().expect("response").expect("added");

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::RemoveBehavior("player".to_string(), behavior.id.clone(), tx))
        .expect("send remove");
    runtime.process_pending();
    assert!(rx.blocking_recv().expect("response").is_ok());
    assert!(runtime
        .builder()
        .entity("player")
        .expect("player")
        .behavior(&behavior.id)
        .is_none());
}

#[test]
fn export_writes_into_export_dir() {
    let (mut runtime, sender, dir) = setup_runtime(Arc::new(MemoryProjectStore::new()));

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender.send(ApiCommand::Export(tx)).expect("send export");
    runtime.process_pending();
    let export = rx.blocking_recv().expect("response").expect("exported");

    assert_eq!(export.file_name, "Coin_Run.py");
    let written = std::fs::read_to_string(dir.path().join("Coin_Run.py")).expect("export file");
    assert_eq!(written, export.contents);
    assert!(written.contains("pygame.init()"));
}

#[test]
fn save_outcome_arrives_as_notification() {
    let store = Arc::new(MemoryProjectStore::new());
    let (mut runtime, sender, _dir) = setup_runtime(store.clone());

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::CreateProject(CreateProjectBody::default(), tx))
        .expect("send create project");
    runtime.process_pending();
    settle(&mut runtime);
    let summary = rx.blocking_recv().expect("response").expect("created");
    assert_eq!(summary.id, "1");

    store.fail_with(Some(StoreError::Network("offline".to_string())));
    let (tx, rx) = tokio::sync::oneshot::channel();
    sender.send(ApiCommand::Save(tx)).expect("send save");
    runtime.process_pending();
    assert!(rx.blocking_recv().expect("response").is_ok());
    settle(&mut runtime);

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::DrainNotifications(tx))
        .expect("send drain");
    runtime.process_pending();
    let notices = rx.blocking_recv().expect("response");
    assert!(notices
        .iter()
        .any(|n| n.level == NoticeLevel::Error && n.message.starts_with("Save failed")));
}

#[test]
fn create_project_from_template_replaces_open_project() {
    let store = Arc::new(MemoryProjectStore::new());
    let (mut runtime, sender, _dir) = setup_runtime(store.clone());

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::CreateProject(
            CreateProjectBody {
                template: Some("top_down".to_string()),
                name: Some("Arena".to_string()),
            },
            tx,
        ))
        .expect("send create project");
    runtime.process_pending();
    settle(&mut runtime);
    let summary = rx.blocking_recv().expect("response").expect("created");

    assert_eq!(summary.name, "Arena");
    assert_eq!(summary.template.as_deref(), Some("top_down"));
    assert_eq!(runtime.builder().config().id, summary.id);
    assert!(runtime.builder().entity("chaser").is_some());
    let payload = store.payload(&summary.id).expect("stored payload");
    assert!(payload.file(".gameconfig.json").is_some());
}

#[test]
fn failed_project_create_keeps_open_project() {
    let store = Arc::new(MemoryProjectStore::new());
    let (mut runtime, sender, _dir) = setup_runtime(store.clone());

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::CreateEntity(create_request("coin", 64.0, 64.0), tx))
        .expect("send create");
    runtime.process_pending();
    let coin = rx.blocking_recv().expect("response").expect("created");

    store.fail_with(Some(StoreError::Http {
        status: 500,
        body: "boom".to_string(),
    }));
    let (tx, rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::CreateProject(
            CreateProjectBody {
                template: Some("blank".to_string()),
                name: Some("Fresh".to_string()),
            },
            tx,
        ))
        .expect("send create project");
    runtime.process_pending();
    settle(&mut runtime);
    let err = rx.blocking_recv().expect("response").expect_err("create fails");
    assert!(err.contains("boom"));

    assert_eq!(runtime.builder().config().name, "Coin Run");
    assert!(runtime.builder().entity(&coin).is_some());
    assert!(runtime.builder().history().can_undo());
}

#[test]
fn slow_project_api_does_not_block_editing() {
    let (release, gate) = crossbeam_channel::unbounded();
    let store = Arc::new(GatedStore {
        inner: MemoryProjectStore::new(),
        gate,
    });
    let (mut runtime, sender, _dir) = setup_runtime(store);

    let (list_tx, mut list_rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::ListProjects(list_tx))
        .expect("send list");
    let (create_tx, mut create_rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::CreateProject(CreateProjectBody::default(), create_tx))
        .expect("send create project");
    let (add_tx, add_rx) = tokio::sync::oneshot::channel();
    sender
        .send(ApiCommand::CreateEntity(create_request("enemy", 96.0, 192.0), add_tx))
        .expect("send create");
    let (undo_tx, undo_rx) = tokio::sync::oneshot::channel();
    sender.send(ApiCommand::Undo(undo_tx)).expect("send undo");

    assert_eq!(runtime.process_pending(), 4);
    assert_eq!(add_rx.blocking_recv().expect("response"), Ok("enemy_1".to_string()));
    assert!(undo_rx.blocking_recv().expect("response").applied);
    assert!(list_rx.try_recv().is_err());
    assert!(create_rx.try_recv().is_err());
    assert_eq!(runtime.builder().remote_in_flight(), 2);

    release.send(()).expect("release first call");
    release.send(()).expect("release second call");
    settle(&mut runtime);
    assert!(list_rx.try_recv().expect("list answered").is_ok());
    let created = create_rx.try_recv().expect("create answered").expect("created");
    assert_eq!(runtime.builder().config().id, created.id);
}

#[test]
fn run_exits_when_senders_drop() {
    let (runtime, sender, _dir) = setup_runtime(Arc::new(MemoryProjectStore::new()));
    let handle = std::thread::spawn(move || runtime.run());

    let (tx, rx) = tokio::sync::oneshot::channel();
    sender.send(ApiCommand::GetCode(tx)).expect("send get code");
    let code = rx.blocking_recv().expect("code");
    assert!(code.contains("game_objects.append(obj_player)"));

    drop(sender);
    handle.join().expect("editor loop exits");
}
