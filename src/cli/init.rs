use serde_json::json;

use crate::db::connection;
use crate::error::BoardError;
use crate::output;

pub fn run(json_output: bool) -> i32 {
    super::finish(run_inner(json_output), json_output)
}

fn run_inner(json_output: bool) -> Result<i32, BoardError> {
    let path = connection::init_db()?;
    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "path": path.to_string_lossy()
            })))
        );
    } else {
        println!("Initialized board at {}", path.display());
    }
    Ok(0)
}
