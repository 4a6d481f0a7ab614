use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::board::Column;
use crate::db::task_repo::TaskProgress;
use crate::error::BoardError;
use crate::models::Task;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &BoardError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

/// Pretty-printed envelope. Values built with `json!` always serialize.
pub fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn progress_json(p: &TaskProgress, overdue: usize) -> Value {
    json!({
        "total": p.total,
        "proposed": p.proposed,
        "in_progress": p.in_progress,
        "testing": p.testing,
        "done": p.done,
        "overdue": overdue,
        "percentage": (p.percentage * 10.0).round() / 10.0
    })
}

pub fn task_summary(t: &Task, today: NaiveDate) -> Value {
    let mut v = json!({
        "id": t.id,
        "title": t.title,
        "status": t.status.as_str(),
        "priority": t.priority.as_str(),
        "overdue": t.is_overdue(today)
    });
    if let Some(ref assignee) = t.assignee {
        v["assignee"] = json!(assignee);
    }
    if let Some(due) = t.due_date {
        v["due_date"] = json!(due.format("%Y-%m-%d").to_string());
    }
    v
}

pub fn task_detail(t: &Task, today: NaiveDate) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "description": t.description,
        "status": t.status.as_str(),
        "priority": t.priority.as_str(),
        "assignee": t.assignee,
        "due_date": t.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        "image_url": t.image_url,
        "overdue": t.is_overdue(today),
        "created_at": t.created_at,
        "updated_at": t.updated_at
    })
}

pub fn column_json(column: &Column<'_>, today: NaiveDate) -> Value {
    json!({
        "status": column.status.as_str(),
        "count": column.tasks.len(),
        "tasks": column.tasks.iter().map(|t| task_summary(t, today)).collect::<Vec<_>>()
    })
}
