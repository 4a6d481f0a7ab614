pub mod connection;
pub mod image_store;
pub mod migrations;
pub mod task_repo;

pub use connection::*;
