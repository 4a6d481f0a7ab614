//! Board view state.
//!
//! [`Board`] is the single state object behind the board screen: the loaded
//! tasks, the current filter, the drag state and pending notices. Every
//! backend failure is turned into a [`Notice`] here before it is handed back.

pub mod drag;
pub mod filter;
pub mod store;

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::backend::TaskBackend;
use crate::error::BoardError;
use crate::models::{Task, TaskDraft, TaskPatch, TaskStatus};

pub use drag::{DragEvent, DragState, DraggedTask, StatusChange};
pub use filter::{Column, QuickFilter, SortKey, TaskFilter};
pub use store::{Snapshot, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Dismissible user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub code: Option<&'static str>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            code: None,
        }
    }
}

impl From<&BoardError> for Notice {
    fn from(err: &BoardError) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: err.message.clone(),
            code: Some(err.code.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dropped on the column it was already in; nothing was sent.
    Unchanged(Task),
    Moved { task: Task, from: TaskStatus },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The backend no longer had the task.
    AlreadyDeleted,
}

#[derive(Debug, Default)]
pub struct Board {
    store: TaskStore,
    pub filter: TaskFilter,
    drag: DragState,
    notices: Vec<Notice>,
}

impl Board {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            store: TaskStore::new(tasks),
            ..Self::default()
        }
    }

    /// Fetch the collection. A failed fetch leaves the board empty with an
    /// error notice; no placeholder tasks are substituted.
    pub fn load<B: TaskBackend>(backend: &B) -> Self {
        let mut board = Self::default();
        // The failure is kept as a notice.
        let _ = board.reload(backend);
        board
    }

    /// On failure the store is emptied and the error is both recorded as a
    /// notice and returned.
    pub fn reload<B: TaskBackend>(&mut self, backend: &B) -> Result<(), BoardError> {
        match backend.list_tasks() {
            Ok(tasks) => {
                debug!(count = tasks.len(), "board loaded");
                self.store.replace_all(tasks);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load tasks");
                self.store.replace_all(Vec::new());
                Err(self.report(e))
            }
        }
    }

    pub fn tasks(&self) -> &[Task] {
        self.store.tasks()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.store.get(id)
    }

    pub fn columns(&self, today: NaiveDate) -> Vec<Column<'_>> {
        self.filter.partition(self.store.tasks(), today)
    }

    pub fn column(&self, status: TaskStatus, today: NaiveDate) -> Vec<&Task> {
        self.filter.column(self.store.tasks(), status, today)
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Feed one drag event through the state machine.
    pub fn dispatch(&mut self, event: DragEvent) -> Option<StatusChange> {
        let (next, change) = std::mem::take(&mut self.drag).on(event);
        self.drag = next;
        change
    }

    pub fn drag_start(&mut self, id: &str) -> Result<(), BoardError> {
        let task = self.store.get(id).ok_or_else(|| BoardError::task_not_found(id))?;
        let dragged = DraggedTask::from(task);
        self.dispatch(DragEvent::Start(dragged));
        Ok(())
    }

    /// Optimistically apply a requested status change, confirm it with the
    /// backend, and undo it if the backend refuses.
    pub fn commit_status_change<B: TaskBackend>(
        &mut self,
        backend: &B,
        change: &StatusChange,
    ) -> Result<Task, BoardError> {
        let snapshot = self
            .store
            .set_status(&change.id, change.to)
            .ok_or_else(|| self.report(BoardError::task_not_found(&change.id)))?;

        match backend.update_task(&change.id, &TaskPatch::status(change.to)) {
            Ok(task) => {
                info!(id = %task.id, from = change.from.as_str(), to = task.status.as_str(), "task moved");
                self.store.upsert(task.clone());
                Ok(task)
            }
            Err(e) => {
                warn!(id = %change.id, error = %e, "status change failed, rolling back");
                self.store.restore(snapshot);
                Err(self.report(e))
            }
        }
    }

    /// Drag a task onto a column: start, enter, drop.
    pub fn move_task<B: TaskBackend>(
        &mut self,
        backend: &B,
        id: &str,
        column: TaskStatus,
    ) -> Result<MoveOutcome, BoardError> {
        self.drag_start(id).map_err(|e| self.report(e))?;
        self.dispatch(DragEvent::EnterColumn(column));
        match self.dispatch(DragEvent::Drop(column)) {
            None => {
                let task = self
                    .store
                    .get(id)
                    .cloned()
                    .ok_or_else(|| self.report(BoardError::task_not_found(id)))?;
                debug!(id = %task.id, "dropped on its own column");
                Ok(MoveOutcome::Unchanged(task))
            }
            Some(change) => {
                let task = self.commit_status_change(backend, &change)?;
                Ok(MoveOutcome::Moved { task, from: change.from })
            }
        }
    }

    /// Validate locally, then create. The board only shows the task once the
    /// backend has confirmed it.
    pub fn create_task<B: TaskBackend>(&mut self, backend: &B, draft: &TaskDraft) -> Result<Task, BoardError> {
        draft.validate().map_err(|e| self.report(e))?;
        let task = backend.create_task(draft).map_err(|e| self.report(e))?;
        self.store.upsert(task.clone());
        Ok(task)
    }

    pub fn update_task<B: TaskBackend>(
        &mut self,
        backend: &B,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, BoardError> {
        patch.validate().map_err(|e| self.report(e))?;
        let task = backend.update_task(id, patch).map_err(|e| self.report(e))?;
        self.store.upsert(task.clone());
        Ok(task)
    }

    /// Deleting a task the backend no longer has is not an error.
    pub fn delete_task<B: TaskBackend>(&mut self, backend: &B, id: &str) -> Result<DeleteOutcome, BoardError> {
        let outcome = match backend.delete_task(id) {
            Ok(()) => DeleteOutcome::Deleted,
            Err(e) if e.is_not_found() => {
                debug!(%id, "task already deleted");
                DeleteOutcome::AlreadyDeleted
            }
            Err(e) => return Err(self.report(e)),
        };
        self.store.remove(id);
        Ok(outcome)
    }

    pub fn upload_image<B: TaskBackend>(&mut self, backend: &B, file: &Path) -> Result<String, BoardError> {
        backend.upload_image(file).map_err(|e| self.report(e))
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn dismiss(&mut self, index: usize) -> Option<Notice> {
        (index < self.notices.len()).then(|| self.notices.remove(index))
    }

    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.level == NoticeLevel::Error)
    }

    fn report(&mut self, err: BoardError) -> BoardError {
        self.notices.push(Notice::from(&err));
        err
    }
}
