pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, resolve_database_url, sqlite_file_path, DbPool};
pub use repositories::{
    InMemoryRunRecordRepository, RepositoryError, RunRecordRepository, SqlRunRecordRepository,
};
