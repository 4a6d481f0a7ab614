use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;
use tracing::debug;

use crate::error::{BoardError, ErrorCode};

use super::migrations;

/// Find the .git root by walking up from current directory.
pub fn find_git_root() -> Result<PathBuf, BoardError> {
    let mut dir = env::current_dir()?;
    loop {
        if dir.join(".git").exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(BoardError::new(
                ErrorCode::NotInitialized,
                "Not inside a git repository. The board is stored at the repository root.",
            ));
        }
    }
}

/// Directory holding the database, config and uploaded images.
pub fn board_dir() -> Result<PathBuf, BoardError> {
    let root = find_git_root()?;
    Ok(root.join(".lectio").join("board"))
}

pub fn db_path() -> Result<PathBuf, BoardError> {
    Ok(board_dir()?.join("board.db"))
}

pub fn config_path() -> Result<PathBuf, BoardError> {
    Ok(board_dir()?.join("config.json"))
}

pub fn images_dir() -> Result<PathBuf, BoardError> {
    Ok(board_dir()?.join("images"))
}

/// Open a connection to the database. Returns error if not initialized.
pub fn open_db() -> Result<Connection, BoardError> {
    let path = db_path()?;
    if !path.exists() {
        return Err(BoardError::not_initialized());
    }
    debug!(path = %path.display(), "opening board database");
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Initialize the database: create directories, database, and run migrations.
pub fn init_db() -> Result<PathBuf, BoardError> {
    let path = db_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(path)
}

pub(crate) fn configure_connection(conn: &Connection) -> Result<(), BoardError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(())
}
