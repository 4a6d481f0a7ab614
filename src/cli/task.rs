use std::io::{self, Read};
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::json;

use crate::backend::{SqliteBackend, TaskBackend};
use crate::board::{Board, DeleteOutcome, MoveOutcome};
use crate::cli::commands::{FilterArgs, TaskCommands};
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::models::{parse_due_date, FieldUpdate, Priority, TaskDraft, TaskPatch, TaskStatus};
use crate::output;

pub fn run(cmd: TaskCommands, json_output: bool, user_flag: Option<&str>) -> i32 {
    let result = match cmd {
        TaskCommands::Add { title, description, priority, assignee, due, image } => {
            run_add(title, description, &priority, assignee, due.as_deref(), image, json_output)
        }
        TaskCommands::List { filters } => run_list(&filters, json_output, user_flag),
        TaskCommands::Show { id } => run_show(&id, json_output),
        TaskCommands::Edit {
            id,
            title,
            description,
            clear_description,
            status,
            priority,
            assignee,
            clear_assignee,
            due,
            clear_due,
            image,
            clear_image,
        } => {
            let edit = EditArgs {
                title,
                description: FieldUpdate::from_flags(description, clear_description),
                status,
                priority,
                assignee: FieldUpdate::from_flags(assignee, clear_assignee),
                due: FieldUpdate::from_flags(due, clear_due),
                image: FieldUpdate::from_flags(image, clear_image),
            };
            run_edit(&id, edit, json_output)
        }
        TaskCommands::Move { id, status } => run_move(&id, &status, json_output),
        TaskCommands::Delete { id, yes } => run_delete(&id, yes, json_output),
        TaskCommands::Export => run_export(json_output),
        TaskCommands::Import => run_import(json_output),
    };
    super::finish(result, json_output)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn run_add(
    title: String,
    description: Option<String>,
    priority: &str,
    assignee: Option<String>,
    due: Option<&str>,
    image: Option<PathBuf>,
    json_output: bool,
) -> Result<i32, BoardError> {
    // Everything the form can check is checked before the backend is opened.
    let mut draft = TaskDraft {
        title,
        description: non_empty(description),
        priority: Priority::parse(priority)?,
        assignee: non_empty(assignee),
        due_date: due.map(parse_due_date).transpose()?,
        image_url: None,
        status: None,
    };
    draft.validate()?;

    let backend = SqliteBackend::open()?;
    let mut board = Board::default();
    if let Some(path) = image {
        draft.image_url = Some(board.upload_image(&backend, &path)?);
    }
    let task = board.create_task(&backend, &draft).inspect_err(|_| {
        if let Some(ref url) = draft.image_url {
            backend.discard_image(url);
        }
    })?;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_detail(&task, super::today())
            })))
        );
    } else {
        println!("Added task: {} ({})", task.title, task.id);
    }
    Ok(0)
}

fn run_list(filters: &FilterArgs, json_output: bool, user_flag: Option<&str>) -> Result<i32, BoardError> {
    let current_user = BoardConfig::load()?.effective_user(user_flag);
    let filter = filters.to_filter(current_user)?;
    let backend = SqliteBackend::open()?;
    let tasks = backend.list_tasks()?;
    let today = super::today();
    let visible = filter.apply(&tasks, today);

    if json_output {
        let tasks_json: Vec<_> = visible
            .iter()
            .map(|t| output::json::task_summary(t, today))
            .collect();
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "tasks": tasks_json,
                "count": visible.len()
            })))
        );
    } else {
        output::text::print_task_list(&visible, today);
    }
    Ok(0)
}

fn run_show(id: &str, json_output: bool) -> Result<i32, BoardError> {
    let backend = SqliteBackend::open()?;
    let task = backend.resolve(id)?;
    let today = super::today();
    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_detail(&task, today)
            })))
        );
    } else {
        output::text::print_task(&task, today);
    }
    Ok(0)
}

struct EditArgs {
    title: Option<String>,
    description: FieldUpdate<String>,
    status: Option<String>,
    priority: Option<String>,
    assignee: FieldUpdate<String>,
    due: FieldUpdate<String>,
    image: FieldUpdate<PathBuf>,
}

fn run_edit(id: &str, edit: EditArgs, json_output: bool) -> Result<i32, BoardError> {
    let mut patch = TaskPatch {
        title: edit.title,
        description: edit.description,
        status: edit.status.as_deref().map(TaskStatus::parse).transpose()?,
        priority: edit.priority.as_deref().map(Priority::parse).transpose()?,
        assignee: edit.assignee,
        due_date: match edit.due {
            FieldUpdate::Keep => FieldUpdate::Keep,
            FieldUpdate::Set(s) => FieldUpdate::Set(parse_due_date(&s)?),
            FieldUpdate::Clear => FieldUpdate::Clear,
        },
        image_url: FieldUpdate::Keep,
    };
    patch.validate()?;
    if patch.is_empty() && edit.image.is_keep() {
        return Err(BoardError::validation("Nothing to change. Pass at least one field flag."));
    }

    let backend = SqliteBackend::open()?;
    let task = backend.resolve(id)?;
    let mut board = Board::new(vec![task.clone()]);
    patch.image_url = match edit.image {
        FieldUpdate::Keep => FieldUpdate::Keep,
        FieldUpdate::Set(path) => FieldUpdate::Set(board.upload_image(&backend, &path)?),
        FieldUpdate::Clear => FieldUpdate::Clear,
    };
    let updated = board.update_task(&backend, &task.id, &patch).inspect_err(|_| {
        if let FieldUpdate::Set(ref url) = patch.image_url {
            backend.discard_image(url);
        }
    })?;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_detail(&updated, super::today())
            })))
        );
    } else {
        println!("Updated task: {} ({})", updated.title, updated.id);
    }
    Ok(0)
}

fn run_move(id: &str, status: &str, json_output: bool) -> Result<i32, BoardError> {
    let column = TaskStatus::parse(status)?;
    let backend = SqliteBackend::open()?;
    let task = backend.resolve(id)?;
    let mut board = Board::new(backend.list_tasks()?);

    let (task, from, moved) = match board.move_task(&backend, &task.id, column)? {
        MoveOutcome::Unchanged(task) => {
            let from = task.status;
            (task, from, false)
        }
        MoveOutcome::Moved { task, from } => (task, from, true),
    };

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "task": output::json::task_summary(&task, super::today()),
                "from": from.as_str(),
                "to": task.status.as_str(),
                "moved": moved
            })))
        );
    } else if moved {
        println!("Task {} {} → {}", task.id, from.as_str(), task.status.as_str());
    } else {
        println!("Task {} already in {}", task.id, task.status.as_str());
    }
    Ok(0)
}

fn run_delete(reference: &str, yes: bool, json_output: bool) -> Result<i32, BoardError> {
    if !yes {
        return Err(BoardError::validation("Refusing to delete without --yes"));
    }
    let backend = SqliteBackend::open()?;
    let id = match backend.resolve(reference) {
        Ok(task) => task.id,
        Err(e) if e.is_not_found() => reference.to_string(),
        Err(e) => return Err(e),
    };

    let mut board = Board::default();
    let outcome = board.delete_task(&backend, &id)?;
    let already_deleted = outcome == DeleteOutcome::AlreadyDeleted;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "deleted": { "id": id },
                "already_deleted": already_deleted
            })))
        );
    } else if already_deleted {
        println!("Task {id} was already deleted");
    } else {
        println!("Deleted task {id}");
    }
    Ok(0)
}

fn run_export(json_output: bool) -> Result<i32, BoardError> {
    let backend = SqliteBackend::open()?;
    let tasks = backend.list_tasks()?;
    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({ "tasks": tasks })))
        );
    } else {
        println!("{}", output::json::render(&json!(tasks)));
    }
    Ok(0)
}

#[derive(Deserialize)]
struct ImportDocument {
    tasks: Vec<TaskDraft>,
}

/// Accepts a bare array or `{"tasks": [...]}`, picked by the top-level shape.
fn parse_import(input: &str) -> Result<Vec<TaskDraft>, BoardError> {
    let invalid = |e: serde_json::Error| BoardError::validation(format!("Invalid JSON: {e}"));
    let value: serde_json::Value = serde_json::from_str(input).map_err(invalid)?;
    let drafts = if value.is_array() {
        serde_json::from_value::<Vec<TaskDraft>>(value).map_err(invalid)?
    } else {
        serde_json::from_value::<ImportDocument>(value).map_err(invalid)?.tasks
    };
    for (i, draft) in drafts.iter().enumerate() {
        draft
            .validate()
            .map_err(|e| BoardError::validation(format!("Task #{}: {}", i + 1, e.message)))?;
    }
    Ok(drafts)
}

fn run_import(json_output: bool) -> Result<i32, BoardError> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| BoardError::validation(e.to_string()))?;
    let drafts = parse_import(&input)?;

    let backend = SqliteBackend::open()?;
    let created = backend.import(&drafts)?;

    if json_output {
        let today = super::today();
        let tasks_json: Vec<_> = created
            .iter()
            .map(|t| output::json::task_summary(t, today))
            .collect();
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "imported": created.len(),
                "tasks": tasks_json
            })))
        );
    } else {
        println!("Imported {} tasks", created.len());
    }
    Ok(0)
}
