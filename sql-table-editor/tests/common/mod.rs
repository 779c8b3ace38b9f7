#![allow(dead_code)]

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a database file in a fresh temporary directory and run `statements` on it
pub async fn create_database(statements: &[&str]) -> (TempDir, PathBuf) {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("editor.db");

    let mut connection = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();

    for statement in statements {
        sqlx::query(statement).execute(&mut connection).await.unwrap();
    }
    connection.close().await.unwrap();

    (directory, path)
}

pub const PEOPLE_TABLE: &str = "CREATE TABLE people (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    active BOOLEAN,
    status TEXT,
    email TEXT UNIQUE
)";

pub const LOG_TABLE: &str = "CREATE TABLE log (message TEXT, level INTEGER)";
