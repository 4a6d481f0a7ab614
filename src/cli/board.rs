use serde_json::json;

use crate::backend::SqliteBackend;
use crate::board::Board;
use crate::cli::commands::FilterArgs;
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::models::TaskStatus;
use crate::output;

pub fn run(filters: &FilterArgs, column: Option<&str>, json_output: bool, user_flag: Option<&str>) -> i32 {
    super::finish(run_inner(filters, column, json_output, user_flag), json_output)
}

fn run_inner(
    filters: &FilterArgs,
    column: Option<&str>,
    json_output: bool,
    user_flag: Option<&str>,
) -> Result<i32, BoardError> {
    let current_user = BoardConfig::load()?.effective_user(user_flag);
    let filter = filters.to_filter(current_user)?;
    let only = column.map(TaskStatus::parse).transpose()?;

    let backend = SqliteBackend::open()?;
    let mut board = Board::default();
    board.reload(&backend)?;
    board.filter = filter;

    let today = super::today();
    let mut columns = board.columns(today);
    if let Some(status) = only {
        columns.retain(|c| c.status == status);
    }

    if json_output {
        let columns_json: Vec<_> = columns
            .iter()
            .map(|c| output::json::column_json(c, today))
            .collect();
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "columns": columns_json,
                "filter": {
                    "search": board.filter.search,
                    "priority": board.filter.priority.map(|p| p.as_str()),
                    "assignee": board.filter.assignee,
                    "status": board.filter.status.map(|s| s.as_str()),
                    "quick": board.filter.quick.as_str(),
                    "current_user": board.filter.current_user,
                }
            })))
        );
    } else {
        output::text::print_board(&columns, today);
    }
    Ok(0)
}
