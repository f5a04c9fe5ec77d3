//! Project persistence: the remote project API, fire-and-poll save dispatch,
//! the local editor-state cache and export files.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::GameConfig;

/// Serialized editor state inside a project's file set.
pub const CONFIG_FILE: &str = ".gameconfig.json";
/// Fixed key of the local editor-state cache.
pub const CACHE_FILE: &str = "pixel-palace-editor-state.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
}

/// Body of `PUT /projects/{id}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProjectPayload {
    pub files: Vec<ProjectFile>,
    #[serde(default)]
    pub assets: Vec<serde_json::Value>,
}

impl ProjectPayload {
    pub fn file(&self, path: &str) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Body of `POST /projects`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateProjectRequest {
    pub name: String,
    pub template: String,
    pub files: Vec<ProjectFile>,
    #[serde(default)]
    pub assets: Vec<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "project id must be a string or number, got {other}"
        ))),
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("rate limited, try again later")]
    RateLimited,
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(e.to_string()),
            _ => StoreError::Io(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e.to_string())
    }
}

/// The external project API. Calls block; the controller runs them on
/// worker threads through [`StoreDispatcher`].
pub trait ProjectStore: Send + Sync {
    fn list(&self) -> Result<Vec<ProjectSummary>, StoreError>;
    fn create(&self, request: &CreateProjectRequest) -> Result<ProjectSummary, StoreError>;
    fn update(&self, project_id: &str, payload: &ProjectPayload) -> Result<(), StoreError>;
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for `GET /projects`, `POST /projects` and `PUT /projects/{id}`.
pub struct HttpProjectStore {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpProjectStore {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(READ_TIMEOUT)
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            agent,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// `PUT` target for a project. The id is a single path segment.
    fn project_url(&self, project_id: &str) -> String {
        self.url(&format!("/projects/{}", urlencoding::encode(project_id)))
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }

    fn convert_error(e: ureq::Error) -> StoreError {
        match e {
            ureq::Error::Status(401, _) | ureq::Error::Status(403, _) => StoreError::Unauthorized,
            ureq::Error::Status(404, response) => StoreError::NotFound(response.get_url().to_string()),
            ureq::Error::Status(429, _) => StoreError::RateLimited,
            ureq::Error::Status(status, response) => StoreError::Http {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            other => StoreError::Network(other.to_string()),
        }
    }
}

/// Accepts a bare value or one wrapped in a `data` / `project` / `projects`
/// envelope.
fn unwrap_envelope(mut value: serde_json::Value, key: &str) -> serde_json::Value {
    for wrapper in ["data", key] {
        if let Some(inner) = value.get_mut(wrapper) {
            return inner.take();
        }
    }
    value
}

impl ProjectStore for HttpProjectStore {
    fn list(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        let response = self
            .authorize(self.agent.get(&self.url("/projects")))
            .call()
            .map_err(Self::convert_error)?;
        let json: serde_json::Value = response.into_json()?;
        Ok(serde_json::from_value(unwrap_envelope(json, "projects"))?)
    }

    fn create(&self, request: &CreateProjectRequest) -> Result<ProjectSummary, StoreError> {
        let response = self
            .authorize(self.agent.post(&self.url("/projects")))
            .set("Content-Type", "application/json")
            .send_json(request)
            .map_err(Self::convert_error)?;
        let json: serde_json::Value = response.into_json()?;
        Ok(serde_json::from_value(unwrap_envelope(json, "project"))?)
    }

    fn update(&self, project_id: &str, payload: &ProjectPayload) -> Result<(), StoreError> {
        self.authorize(self.agent.put(&self.project_url(project_id)))
            .set("Content-Type", "application/json")
            .send_json(payload)
            .map_err(Self::convert_error)?;
        Ok(())
    }
}

/// In-process store used when no persistence URL is configured, and by tests.
#[derive(Default)]
pub struct MemoryProjectStore {
    projects: Mutex<Vec<(ProjectSummary, ProjectPayload)>>,
    failure: Mutex<Option<StoreError>>,
    next_id: Mutex<u64>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<StoreError>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = error;
        }
    }

    pub fn payload(&self, project_id: &str) -> Option<ProjectPayload> {
        let projects = self.projects.lock().ok()?;
        projects
            .iter()
            .find(|(summary, _)| summary.id == project_id)
            .map(|(_, payload)| payload.clone())
    }

    fn check(&self) -> Result<(), StoreError> {
        match self.failure.lock() {
            Ok(failure) => failure.clone().map_or(Ok(()), Err),
            Err(_) => Err(StoreError::Io("store lock poisoned".to_string())),
        }
    }

    fn lock_projects(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, Vec<(ProjectSummary, ProjectPayload)>>, StoreError> {
        self.projects
            .lock()
            .map_err(|_| StoreError::Io("store lock poisoned".to_string()))
    }
}

impl ProjectStore for MemoryProjectStore {
    fn list(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        self.check()?;
        Ok(self
            .lock_projects()?
            .iter()
            .map(|(summary, _)| summary.clone())
            .collect())
    }

    fn create(&self, request: &CreateProjectRequest) -> Result<ProjectSummary, StoreError> {
        self.check()?;
        let id = {
            let mut next = self
                .next_id
                .lock()
                .map_err(|_| StoreError::Io("store lock poisoned".to_string()))?;
            *next += 1;
            next.to_string()
        };
        let summary = ProjectSummary {
            id,
            name: request.name.clone(),
            template: Some(request.template.clone()),
            updated_at: None,
        };
        let payload = ProjectPayload {
            files: request.files.clone(),
            assets: request.assets.clone(),
        };
        self.lock_projects()?.push((summary.clone(), payload));
        Ok(summary)
    }

    fn update(&self, project_id: &str, payload: &ProjectPayload) -> Result<(), StoreError> {
        self.check()?;
        let mut projects = self.lock_projects()?;
        match projects.iter_mut().find(|(summary, _)| summary.id == project_id) {
            Some((_, stored)) => {
                *stored = payload.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("project {project_id}"))),
        }
    }
}

/// One blocking call against the project API.
#[derive(Debug, Clone)]
pub enum StoreOp {
    List,
    Create(CreateProjectRequest),
    Update {
        project_id: String,
        payload: ProjectPayload,
    },
}

impl StoreOp {
    fn describe(&self) -> String {
        match self {
            StoreOp::List => "GET /projects".to_string(),
            StoreOp::Create(_) => "POST /projects".to_string(),
            StoreOp::Update { project_id, .. } => format!("PUT /projects/{project_id}"),
        }
    }

    fn run(self, store: &dyn ProjectStore) -> StoreReply {
        match self {
            StoreOp::List => StoreReply::Listed(store.list()),
            StoreOp::Create(request) => StoreReply::Created(store.create(&request)),
            StoreOp::Update {
                project_id,
                payload,
            } => StoreReply::Updated(store.update(&project_id, &payload)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreReply {
    Listed(Result<Vec<ProjectSummary>, StoreError>),
    Created(Result<ProjectSummary, StoreError>),
    Updated(Result<(), StoreError>),
}

impl StoreReply {
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            StoreReply::Listed(r) => r.as_ref().err(),
            StoreReply::Created(r) => r.as_ref().err(),
            StoreReply::Updated(r) => r.as_ref().err(),
        }
    }
}

/// Result of one background call, tagged with the ticket
/// [`StoreDispatcher::dispatch`] returned for it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOutcome {
    pub ticket: u64,
    pub reply: StoreReply,
}

/// Runs project API calls on worker threads and hands results back to the
/// single-threaded editor through [`StoreDispatcher::poll`].
pub struct StoreDispatcher {
    tx: Sender<StoreOutcome>,
    rx: Receiver<StoreOutcome>,
    in_flight: usize,
    next_ticket: u64,
}

impl Default for StoreDispatcher {
    fn default() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            in_flight: 0,
            next_ticket: 0,
        }
    }
}

impl StoreDispatcher {
    pub fn dispatch(&mut self, store: Arc<dyn ProjectStore>, op: StoreOp) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let tx = self.tx.clone();
        self.in_flight += 1;
        std::thread::spawn(move || {
            let what = op.describe();
            let reply = op.run(store.as_ref());
            match reply.error() {
                Some(err) => warn!("[Palace store] {what} failed: {err}"),
                None => debug!("[Palace store] {what} done"),
            }
            // The receiver lives as long as the dispatcher; a send error only
            // means the editor already shut down.
            let _ = tx.send(StoreOutcome { ticket, reply });
        });
        ticket
    }

    /// Completed calls since the last poll, in completion order.
    pub fn poll(&mut self) -> Vec<StoreOutcome> {
        let done: Vec<StoreOutcome> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Blocks until one call finishes or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Option<StoreOutcome> {
        let outcome = self.rx.recv_timeout(timeout).ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }
}

/// Convenience mirror of the editor state, overwritten on every change.
/// Not a store of record.
#[derive(Clone, Debug)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    pub fn store(&self, config: &GameConfig) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(config)?;
        let tmp = self.dir.join(format!("{CACHE_FILE}.tmp"));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, self.path())?;
        debug!("[Palace] cached editor state to {}", self.path().display());
        Ok(())
    }

    /// Raw cached document, `None` when nothing has been cached yet.
    pub fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path()) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes an export file into `dir`, creating it when missing.
pub fn write_export(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents)?;
    Ok(path)
}
