#[cfg(test)]
mod tests;

use super::*;
use crate::controller::{RemoteCompletion, RemoteResult};
use crossbeam_channel::RecvTimeoutError;
use std::path::PathBuf;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const SHUTDOWN_REMOTE_WAIT: Duration = Duration::from_secs(5);

/// Reply owed to a handler once its project API call finishes.
enum AwaitingRemote {
    Create(Reply<Result<ProjectSummary, String>>),
    List(Reply<Result<Vec<ProjectSummary>, String>>),
}

/// Single-threaded owner of the open project. API handlers reach it only
/// through [`ApiCommand`]s.
pub struct EditorRuntime {
    builder: ProjectBuilder,
    receiver: Receiver<ApiCommand>,
    export_dir: PathBuf,
    awaiting: HashMap<u64, AwaitingRemote>,
}

impl EditorRuntime {
    pub fn new(
        builder: ProjectBuilder,
        export_dir: impl Into<PathBuf>,
    ) -> (Self, Sender<ApiCommand>) {
        let (tx, rx) = crossbeam_channel::unbounded::<ApiCommand>();
        (
            Self {
                builder,
                receiver: rx,
                export_dir: export_dir.into(),
                awaiting: HashMap::new(),
            },
            tx,
        )
    }

    #[cfg(test)]
    pub fn builder(&self) -> &ProjectBuilder {
        &self.builder
    }

    /// Handles every queued command, then folds in finished API calls.
    #[cfg(test)]
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(cmd) = self.receiver.try_recv() {
            self.handle(cmd);
            handled += 1;
        }
        self.poll_remote();
        handled
    }

    /// Runs until every sender is dropped, then waits briefly for API calls
    /// still in flight.
    pub fn run(mut self) {
        info!("[Palace] editor loop started");
        loop {
            match self.receiver.recv_timeout(POLL_INTERVAL) {
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.poll_remote();
        }
        while self.builder.remote_in_flight() > 0 {
            match self.builder.wait_remote(SHUTDOWN_REMOTE_WAIT) {
                Some(done) => self.answer(done),
                None => {
                    warn!("[Palace store] giving up on unfinished project API calls");
                    break;
                }
            }
        }
        info!("[Palace] editor loop stopped");
    }

    fn poll_remote(&mut self) {
        for done in self.builder.poll_remote() {
            self.answer(done);
        }
    }

    fn answer(&mut self, done: RemoteCompletion) {
        let Some(awaiting) = self.awaiting.remove(&done.ticket) else {
            return;
        };
        match (awaiting, done.result) {
            (AwaitingRemote::Create(tx), RemoteResult::Created(result)) => {
                let _ = tx.send(result);
            }
            (AwaitingRemote::List(tx), RemoteResult::Listed(result)) => {
                let _ = tx.send(result);
            }
            (_, other) => {
                warn!("[Palace store] unexpected result for ticket {}: {other:?}", done.ticket);
            }
        }
    }

    fn handle(&mut self, cmd: ApiCommand) {
        let builder = &mut self.builder;
        match cmd {
            ApiCommand::GetProject(tx) => {
                let _ = tx.send(builder.config().clone());
            }
            ApiCommand::GetScene(tx) => {
                let view = builder.current_scene().cloned().map(|scene| SceneView {
                    scene,
                    selected_entity_id: builder.selected_entity().map(|e| e.id.clone()),
                });
                let _ = tx.send(view);
            }
            ApiCommand::SelectScene(id, tx) => {
                let _ = tx.send(builder.select_scene(&id));
            }
            ApiCommand::AddScene(name, tx) => {
                let _ = tx.send(builder.add_scene(&name));
            }
            ApiCommand::SetMainScene(id, tx) => {
                let _ = tx.send(builder.set_main_scene(&id));
            }
            ApiCommand::ListEntities(tx) => {
                let entities = builder
                    .current_scene()
                    .map(|scene| scene.entities.clone())
                    .unwrap_or_default();
                let _ = tx.send(entities);
            }
            ApiCommand::GetEntity(id, tx) => {
                let _ = tx.send(builder.entity(&id).cloned());
            }
            ApiCommand::CreateEntity(req, tx) => {
                let _ = tx.send(builder.place_entity(entity_from_request(req)));
            }
            ApiCommand::EditEntity(id, edits, tx) => {
                let _ = tx.send(builder.edit_entity(&id, &edits));
            }
            ApiCommand::DeleteEntity(id, tx) => {
                let _ = tx.send(builder.delete_entity(&id));
            }
            ApiCommand::DuplicateEntity(id, tx) => {
                let _ = tx.send(builder.duplicate_entity(&id));
            }
            ApiCommand::SelectEntity(id, tx) => {
                let _ = tx.send(builder.select_entity(id.as_deref()));
            }
            ApiCommand::AddBehavior(entity_id, req, tx) => {
                let result =
                    builder.add_behavior(&entity_id, req.kind, req.trigger, req.parameters);
                let _ = tx.send(result);
            }
            ApiCommand::EditBehavior(entity_id, behavior_id, edits, tx) => {
                let _ = tx.send(builder.edit_behavior(&entity_id, &behavior_id, &edits));
            }
            ApiCommand::RemoveBehavior(entity_id, behavior_id, tx) => {
                let _ = tx.send(builder.remove_behavior(&entity_id, &behavior_id));
            }
            ApiCommand::Undo(tx) => {
                let applied = builder.undo();
                let _ = tx.send(UndoResponse {
                    applied,
                    history: builder.history_summary(),
                });
            }
            ApiCommand::Redo(tx) => {
                let applied = builder.redo();
                let _ = tx.send(UndoResponse {
                    applied,
                    history: builder.history_summary(),
                });
            }
            ApiCommand::GetHistory(tx) => {
                let _ = tx.send(builder.history_summary());
            }
            ApiCommand::SetComponentChoice(req, tx) => {
                builder.set_component_choice(&req.component_id, req.choice);
                let _ = tx.send(());
            }
            ApiCommand::UpdateSettings(patch, tx) => {
                let _ = tx.send(builder.update_settings(&patch));
            }
            ApiCommand::GetCode(tx) => {
                let _ = tx.send(builder.generate_code());
            }
            ApiCommand::Export(tx) => {
                let export = builder.export();
                let result = builder
                    .write_export(&self.export_dir)
                    .map(|path| ExportResponse {
                        file_name: export.file_name,
                        path: path.display().to_string(),
                        contents: export.contents,
                    });
                let _ = tx.send(result);
            }
            ApiCommand::Save(tx) => {
                let _ = tx.send(builder.save().map(|_| ()));
            }
            ApiCommand::CreateProject(body, tx) => {
                let dispatched = match body.template {
                    Some(template) => {
                        let name = body
                            .name
                            .filter(|n| !n.trim().is_empty())
                            .unwrap_or_else(|| builder.config().name.clone());
                        builder.create_from_template(&template, &name)
                    }
                    None => builder.create_remote(templates::DEFAULT_TEMPLATE),
                };
                match dispatched {
                    Ok(ticket) => {
                        self.awaiting.insert(ticket, AwaitingRemote::Create(tx));
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                    }
                }
            }
            ApiCommand::ListProjects(tx) => {
                let ticket = builder.list_remote();
                self.awaiting.insert(ticket, AwaitingRemote::List(tx));
            }
            ApiCommand::DrainNotifications(tx) => {
                let _ = tx.send(builder.drain_notifications());
            }
        }
    }
}
