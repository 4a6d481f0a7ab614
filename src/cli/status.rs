use serde_json::json;

use crate::backend::{SqliteBackend, TaskBackend};
use crate::board::filter::overdue_count;
use crate::db::task_repo;
use crate::error::BoardError;
use crate::output;

pub fn run(json_output: bool) -> i32 {
    super::finish(run_inner(json_output), json_output)
}

fn run_inner(json_output: bool) -> Result<i32, BoardError> {
    let backend = SqliteBackend::open()?;
    let progress = task_repo::task_progress(backend.connection())?;
    let tasks = backend.list_tasks()?;
    let overdue = overdue_count(&tasks, super::today());

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "progress": output::json::progress_json(&progress, overdue)
            })))
        );
    } else {
        output::text::print_progress(&progress, overdue);
    }
    Ok(0)
}
