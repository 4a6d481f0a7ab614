pub mod board;
pub mod commands;
pub mod config;
pub mod init;
pub mod status;
pub mod task;

pub use commands::*;

use chrono::NaiveDate;

use crate::error::BoardError;
use crate::output;

/// Print the error the way the caller asked for and map it to an exit code.
pub fn finish(result: Result<i32, BoardError>, json_output: bool) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                println!("{}", output::json::render(&output::json::error(&e)));
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
