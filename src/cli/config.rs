use serde_json::json;

use crate::cli::commands::ConfigCommands;
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::output;

pub fn run(cmd: ConfigCommands, json_output: bool, user_flag: Option<&str>) -> i32 {
    let result = match cmd {
        ConfigCommands::Show => run_show(json_output, user_flag),
        ConfigCommands::SetUser { user } => run_set_user(Some(user), json_output),
        ConfigCommands::ClearUser => run_set_user(None, json_output),
    };
    super::finish(result, json_output)
}

fn run_show(json_output: bool, user_flag: Option<&str>) -> Result<i32, BoardError> {
    let config = BoardConfig::load()?;
    let effective = config.effective_user(user_flag);
    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "current_user": config.current_user,
                "effective_user": effective,
            })))
        );
    } else {
        println!("Current user: {}", config.current_user.as_deref().unwrap_or("(none)"));
        if effective != config.current_user {
            println!("Effective user: {}", effective.as_deref().unwrap_or("(none)"));
        }
    }
    Ok(0)
}

fn run_set_user(user: Option<String>, json_output: bool) -> Result<i32, BoardError> {
    let user = user.map(|u| u.trim().to_string());
    if user.as_deref() == Some("") {
        return Err(BoardError::validation("User must not be empty"));
    }
    let mut config = BoardConfig::load()?;
    config.current_user = user;
    config.save()?;

    if json_output {
        println!(
            "{}",
            output::json::render(&output::json::success(json!({
                "current_user": config.current_user
            })))
        );
    } else {
        match config.current_user {
            Some(ref u) => println!("Current user set to {u}"),
            None => println!("Current user cleared"),
        }
    }
    Ok(0)
}
