//! Undo/redo history over scene entity collections.
//!
//! [`EditorHistory`] keeps a linear stack of full before/after snapshots.
//! Recording a new entry after undoing discards the redo tail. The undo stack
//! is bounded; the oldest entry is dropped once `max_depth` is exceeded.

use serde::Serialize;
use std::collections::VecDeque;

use crate::model::Entity;

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOp {
    Add,
    Delete,
    Modify,
    Batch,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneChange {
    pub scene_id: String,
    pub before: Vec<Entity>,
    pub after: Vec<Entity>,
}

/// Entity collection to install into a scene after undo or redo.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub scene_id: String,
    pub entities: Vec<Entity>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub op: HistoryOp,
    pub description: String,
    pub changes: Vec<SceneChange>,
    #[serde(skip)]
    serial: u64,
}

impl HistoryEntry {
    pub fn new(
        op: HistoryOp,
        scene_id: impl Into<String>,
        before: Vec<Entity>,
        after: Vec<Entity>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            op,
            description: description.into(),
            changes: vec![SceneChange {
                scene_id: scene_id.into(),
                before,
                after,
            }],
            serial: 0,
        }
    }
}

/// Undo/redo stacks for one editor session.
pub struct EditorHistory {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_depth: usize,
    next_serial: u64,
    /// Serial identifying the state at the bottom of the undo stack.
    base_serial: u64,
    /// Serial of the state last persisted, if it is still reachable.
    saved_serial: Option<u64>,
}

impl Default for EditorHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl EditorHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            next_serial: 1,
            base_serial: 0,
            saved_serial: Some(0),
        }
    }

    pub fn record_add(
        &mut self,
        scene_id: &str,
        before: Vec<Entity>,
        after: Vec<Entity>,
        description: impl Into<String>,
    ) {
        self.record(HistoryEntry::new(HistoryOp::Add, scene_id, before, after, description));
    }

    pub fn record_delete(
        &mut self,
        scene_id: &str,
        before: Vec<Entity>,
        after: Vec<Entity>,
        description: impl Into<String>,
    ) {
        self.record(HistoryEntry::new(
            HistoryOp::Delete,
            scene_id,
            before,
            after,
            description,
        ));
    }

    /// Argument order follows the editor call sites: new state first.
    pub fn record_modify(
        &mut self,
        scene_id: &str,
        new_entities: Vec<Entity>,
        old_entities: Vec<Entity>,
        description: impl Into<String>,
    ) {
        self.record(HistoryEntry::new(
            HistoryOp::Modify,
            scene_id,
            old_entities,
            new_entities,
            description,
        ));
    }

    /// Folds several entries into one undo step. An empty batch records nothing.
    pub fn record_batch(&mut self, entries: Vec<HistoryEntry>, description: impl Into<String>) {
        let changes: Vec<SceneChange> = entries.into_iter().flat_map(|e| e.changes).collect();
        if changes.is_empty() {
            return;
        }
        self.record(HistoryEntry {
            op: HistoryOp::Batch,
            description: description.into(),
            changes,
            serial: 0,
        });
    }

    /// Pushes an entry and clears the redo stack.
    pub fn record(&mut self, mut entry: HistoryEntry) {
        entry.serial = self.next_serial;
        self.next_serial += 1;
        if self.saved_serial.is_some_and(|saved| {
            self.redo_stack.iter().any(|e| e.serial == saved)
        }) {
            // The saved state lived in the discarded redo branch.
            self.saved_serial = None;
        }
        self.redo_stack.clear();
        self.undo_stack.push_back(entry);
        self.trim();
    }

    /// Pops the latest entry and returns the "before" snapshots to install,
    /// or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Vec<SceneSnapshot>> {
        let entry = self.undo_stack.pop_back()?;
        let snapshots = entry
            .changes
            .iter()
            .rev()
            .map(|c| SceneSnapshot {
                scene_id: c.scene_id.clone(),
                entities: c.before.clone(),
            })
            .collect();
        self.redo_stack.push(entry);
        Some(snapshots)
    }

    /// Re-applies the latest undone entry and returns its "after" snapshots.
    pub fn redo(&mut self) -> Option<Vec<SceneSnapshot>> {
        let entry = self.redo_stack.pop()?;
        let snapshots = entry
            .changes
            .iter()
            .map(|c| SceneSnapshot {
                scene_id: c.scene_id.clone(),
                entities: c.after.clone(),
            })
            .collect();
        self.undo_stack.push_back(entry);
        self.trim();
        Some(snapshots)
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                if self.saved_serial == Some(self.base_serial) {
                    self.saved_serial = None;
                }
                self.base_serial = dropped.serial;
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Undo descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|e| e.description.as_str())
    }

    /// Redo descriptions, next redo first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|e| e.description.as_str())
    }

    /// Identifies the current document state for save tracking.
    pub fn save_point(&self) -> u64 {
        self.undo_stack
            .back()
            .map(|e| e.serial)
            .unwrap_or(self.base_serial)
    }

    pub fn mark_saved(&mut self) {
        self.saved_serial = Some(self.save_point());
    }

    /// Marks a state captured earlier with [`save_point`](Self::save_point)
    /// as persisted, e.g. when a background save completes.
    pub fn mark_saved_at(&mut self, save_point: u64) {
        self.saved_serial = Some(save_point);
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.saved_serial != Some(self.save_point())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.base_serial = self.next_serial;
        self.next_serial += 1;
        self.saved_serial = None;
    }
}
