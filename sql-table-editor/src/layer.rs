//! TableEditorLayer - Main Axum integration layer
//!
//! This module provides the main entry point for integrating sql-table-editor
//! into an Axum application.

use crate::api::{create_api_router, EditorState};
use crate::bookmarks::{BookmarkRegistry, JsonFileRegistry};
use crate::config::EditorConfig;
use crate::database::traits::DatabaseProvider;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[cfg(feature = "sqlite")]
use crate::database::sqlite::SqliteProvider;

/// Main layer for integrating the table editor into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use sql_table_editor::TableEditorLayer;
///
/// let editor = TableEditorLayer::sqlite("/table-editor", "./data/example.db", "bookmarks.json");
/// let app: Router = Router::new().merge(editor.into_router());
/// ```
pub struct TableEditorLayer<DB: DatabaseProvider> {
    base_path: String,
    database: Arc<DB>,
    bookmarks: Arc<dyn BookmarkRegistry>,
}

impl<DB: DatabaseProvider> TableEditorLayer<DB> {
    /// Create a new table editor at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the editor will be mounted (e.g., "/table-editor")
    /// * `database` - The database provider implementation
    /// * `bookmarks` - Where bookmarks are persisted
    pub fn new(
        base_path: impl Into<String>,
        database: DB,
        bookmarks: impl BookmarkRegistry,
    ) -> Self {
        Self {
            base_path: base_path.into().trim_end_matches('/').to_string(),
            database: Arc::new(database),
            bookmarks: Arc::new(bookmarks),
        }
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router serves the API endpoints at `{base_path}/api/*`
    /// behind permissive CORS, for a local UI.
    pub fn into_router(self) -> Router {
        tracing::info!(
            base_path = %self.base_path,
            database = %self.database.location(),
            "Mounting table editor"
        );

        let state = Arc::new(EditorState::new(self.database, self.bookmarks));

        Router::new()
            .nest(&format!("{}/api", self.base_path), create_api_router(state))
            .layer(CorsLayer::permissive())
    }
}

#[cfg(feature = "sqlite")]
impl TableEditorLayer<SqliteProvider> {
    /// Create a new table editor for a SQLite file
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the editor will be mounted
    /// * `database_path` - The SQLite database file (must already exist)
    /// * `bookmark_path` - The JSON file bookmarks are kept in
    pub fn sqlite(
        base_path: impl Into<String>,
        database_path: impl Into<PathBuf>,
        bookmark_path: impl Into<PathBuf>,
    ) -> Self {
        Self::new(
            base_path,
            SqliteProvider::new(database_path.into()),
            JsonFileRegistry::new(bookmark_path),
        )
    }

    /// Create a table editor from configuration
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::sqlite(
            config.base_path.clone(),
            config.database_path.clone(),
            config.bookmark_path.clone(),
        )
    }
}
