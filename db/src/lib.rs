pub mod analytics;
pub mod checkin;
pub mod models;
pub mod test_utils;

use sea_orm::{Database, DatabaseConnection};
use std::path::Path;
use util::config;

/// Opens the application database from `DATABASE_PATH`.
///
/// Accepts either a full DSN or a bare SQLite file path; bare paths get their
/// parent directory created and are opened in read-write-create mode.
pub async fn connect() -> DatabaseConnection {
    let url = database_url(&config::database_path());

    Database::connect(&url)
        .await
        .expect("Failed to connect to database")
}

fn database_url(path_or_url: &str) -> String {
    let is_dsn = ["sqlite:", "postgres://", "mysql://"]
        .iter()
        .any(|p| path_or_url.starts_with(p));
    if is_dsn {
        return path_or_url.to_owned();
    }

    // SQLite won't create intermediate directories on its own.
    if let Some(parent) = Path::new(path_or_url).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    format!("sqlite://{path_or_url}?mode=rwc")
}
