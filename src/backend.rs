//! Persistence collaborator.
//!
//! The board never talks to storage directly; it goes through [`TaskBackend`].
//! [`SqliteBackend`] is the local adapter the CLI uses.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::{connection, image_store, task_repo};
use crate::error::BoardError;
use crate::models::{Task, TaskDraft, TaskPatch};

pub trait TaskBackend {
    /// Every task, in collection order.
    fn list_tasks(&self) -> Result<Vec<Task>, BoardError>;

    /// Persist a draft; the backend assigns `id` and `created_at`.
    fn create_task(&self, draft: &TaskDraft) -> Result<Task, BoardError>;

    /// Apply a partial update and return the stored record.
    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, BoardError>;

    fn delete_task(&self, id: &str) -> Result<(), BoardError>;

    /// Store an image file and return a URL referencing it.
    fn upload_image(&self, file: &Path) -> Result<String, BoardError>;
}

pub struct SqliteBackend {
    conn: Connection,
    images_dir: PathBuf,
}

impl SqliteBackend {
    pub fn new(conn: Connection, images_dir: PathBuf) -> Self {
        Self { conn, images_dir }
    }

    /// Open the board stored at the enclosing git repository.
    pub fn open() -> Result<Self, BoardError> {
        let conn = connection::open_db()?;
        Ok(Self::new(conn, connection::images_dir()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drop an uploaded image whose task was never saved.
    pub fn discard_image(&self, url: &str) {
        if let Err(e) = image_store::discard_image(&self.images_dir, url) {
            warn!(%url, error = %e, "could not remove orphaned image");
        }
    }

    /// Exact ID or unique prefix.
    pub fn resolve(&self, reference: &str) -> Result<Task, BoardError> {
        task_repo::resolve_task(&self.conn, reference)
    }

    /// Create every draft or none of them.
    pub fn import(&self, drafts: &[TaskDraft]) -> Result<Vec<Task>, BoardError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        let result = (|| -> Result<_, BoardError> {
            let mut created = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let id = ulid::Ulid::new().to_string();
                created.push(task_repo::create_task(&self.conn, &id, draft)?);
            }
            Ok(created)
        })();

        match result {
            Ok(created) => {
                self.conn.execute_batch("COMMIT")?;
                info!(count = created.len(), "tasks imported");
                Ok(created)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

impl TaskBackend for SqliteBackend {
    fn list_tasks(&self) -> Result<Vec<Task>, BoardError> {
        let tasks = task_repo::list_tasks(&self.conn)?;
        debug!(count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    fn create_task(&self, draft: &TaskDraft) -> Result<Task, BoardError> {
        draft.validate()?;
        let id = ulid::Ulid::new().to_string();
        let task = task_repo::create_task(&self.conn, &id, draft)?;
        info!(id = %task.id, "task created");
        Ok(task)
    }

    fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, BoardError> {
        patch.validate()?;
        let task = task_repo::update_task(&self.conn, id, patch)?;
        info!(id = %task.id, status = task.status.as_str(), "task updated");
        Ok(task)
    }

    fn delete_task(&self, id: &str) -> Result<(), BoardError> {
        task_repo::delete_task(&self.conn, id)?;
        info!(%id, "task deleted");
        Ok(())
    }

    fn upload_image(&self, file: &Path) -> Result<String, BoardError> {
        image_store::store_image(&self.images_dir, file)
    }
}
