use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;

use crate::error::BoardError;
use crate::models::{FieldUpdate, Priority, Task, TaskDraft, TaskPatch, TaskStatus};

const TASK_COLUMNS: &str = "id, title, description, status, priority, assignee, due_date,
                            image_url, created_at, updated_at";

pub fn create_task(conn: &Connection, id: &str, draft: &TaskDraft) -> Result<Task, BoardError> {
    let next_seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), -1) + 1 FROM tasks",
        [],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO tasks (id, title, description, status, priority, assignee, due_date, image_url, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            draft.title.trim(),
            draft.description,
            draft.initial_status().as_str(),
            draft.priority.as_str(),
            draft.assignee,
            draft.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            draft.image_url,
            next_seq,
        ],
    )?;
    get_task_by_id(conn, id)
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Task, BoardError> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => BoardError::task_not_found(id),
        _ => BoardError::from(e),
    })
}

/// Resolve a task by exact ID, then by ID prefix.
/// The prefix is compared literally, so `%` and `_` are not wildcards.
pub fn resolve_task(conn: &Connection, reference: &str) -> Result<Task, BoardError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(BoardError::validation("Task reference must not be empty"));
    }
    if let Ok(task) = get_task_by_id(conn, reference) {
        return Ok(task);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE substr(id, 1, length(?1)) = ?1 ORDER BY seq ASC"
    ))?;
    let mut tasks: Vec<Task> = stmt
        .query_map(params![reference], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;

    match tasks.len() {
        0 => Err(BoardError::task_not_found(reference)),
        1 => Ok(tasks.remove(0)),
        _ => {
            let candidates: Vec<String> = tasks.iter().map(|t| format!("{} ({})", t.title, t.id)).collect();
            Err(BoardError::ambiguous_ref(reference, &candidates))
        }
    }
}

/// All tasks in insertion order.
pub fn list_tasks(conn: &Connection) -> Result<Vec<Task>, BoardError> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY seq ASC"))?;
    let tasks = stmt
        .query_map([], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn update_task(conn: &Connection, id: &str, patch: &TaskPatch) -> Result<Task, BoardError> {
    let mut sets: Vec<&'static str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(ref title) = patch.title {
        sets.push("title = ?");
        values.push(Value::Text(title.trim().to_string()));
    }
    if let Some(status) = patch.status {
        sets.push("status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(priority) = patch.priority {
        sets.push("priority = ?");
        values.push(Value::Text(priority.as_str().to_string()));
    }
    push_optional(&mut sets, &mut values, "description = ?", &patch.description, |s| s.clone());
    push_optional(&mut sets, &mut values, "assignee = ?", &patch.assignee, |s| s.clone());
    push_optional(&mut sets, &mut values, "due_date = ?", &patch.due_date, |d| {
        d.format("%Y-%m-%d").to_string()
    });
    push_optional(&mut sets, &mut values, "image_url = ?", &patch.image_url, |s| s.clone());

    sets.push("updated_at = datetime('now')");
    values.push(Value::Text(id.to_string()));

    let sql = format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", "));
    debug!(%sql, "updating task");
    let changed = conn.execute(&sql, params_from_iter(values.iter()))?;
    if changed == 0 {
        return Err(BoardError::task_not_found(id));
    }
    get_task_by_id(conn, id)
}

fn push_optional<T>(
    sets: &mut Vec<&'static str>,
    values: &mut Vec<Value>,
    clause: &'static str,
    update: &FieldUpdate<T>,
    to_text: impl Fn(&T) -> String,
) {
    match update {
        FieldUpdate::Keep => {}
        FieldUpdate::Set(v) => {
            sets.push(clause);
            values.push(Value::Text(to_text(v)));
        }
        FieldUpdate::Clear => {
            sets.push(clause);
            values.push(Value::Null);
        }
    }
}

pub fn delete_task(conn: &Connection, id: &str) -> Result<(), BoardError> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(BoardError::task_not_found(id));
    }
    Ok(())
}

/// Task counts per column.
pub fn task_progress(conn: &Connection) -> Result<TaskProgress, BoardError> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM tasks GROUP BY status")?;
    let mut progress = TaskProgress::default();
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (status, count) = row?;
        match TaskStatus::from_str(&status) {
            Some(TaskStatus::Proposed) => progress.proposed = count,
            Some(TaskStatus::InProgress) => progress.in_progress = count,
            Some(TaskStatus::Testing) => progress.testing = count,
            Some(TaskStatus::Done) => progress.done = count,
            None => return Err(BoardError::unknown_status(&status)),
        }
    }
    progress.total = progress.proposed + progress.in_progress + progress.testing + progress.done;
    progress.percentage = if progress.total > 0 {
        (progress.done as f64 / progress.total as f64) * 100.0
    } else {
        0.0
    };
    Ok(progress)
}

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct TaskProgress {
    pub total: i64,
    pub proposed: i64,
    pub in_progress: i64,
    pub testing: i64,
    pub done: i64,
    pub percentage: f64,
}

fn conversion_error(column: usize, err: BoardError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

// Unknown enum values in a row fail the read instead of being coerced.
fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let due_date: Option<String> = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: TaskStatus::parse(&status).map_err(|e| conversion_error(3, e))?,
        priority: Priority::parse(&priority).map_err(|e| conversion_error(4, e))?,
        assignee: row.get(5)?,
        due_date: due_date
            .as_deref()
            .map(crate::models::parse_due_date)
            .transpose()
            .map_err(|e| conversion_error(6, e))?,
        image_url: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
