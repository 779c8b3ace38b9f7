//! REST API endpoints
//!
//! This module contains all API endpoint handlers for the table editor, plus
//! the per-layer session state they share.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::bookmarks::BookmarkRegistry;
use crate::crud;
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::RowSet;
use crate::view::TableView;
use crate::{Error, Result};

pub mod bookmarks;
pub mod form;
pub mod rows;
pub mod tables;
pub mod write;

/// Shared state behind every handler
///
/// Holds the snapshot each table's view projects over. The core itself keeps
/// nothing between calls; this is the UI side of the boundary.
pub struct EditorState<DB: DatabaseProvider> {
    pub database: Arc<DB>,
    pub bookmarks: Arc<dyn BookmarkRegistry>,
    bookmark_lock: Mutex<()>,
    views: RwLock<HashMap<String, TableView>>,
}

impl<DB: DatabaseProvider> EditorState<DB> {
    pub fn new(database: Arc<DB>, bookmarks: Arc<dyn BookmarkRegistry>) -> Self {
        Self {
            database,
            bookmarks,
            bookmark_lock: Mutex::new(()),
            views: RwLock::new(HashMap::new()),
        }
    }

    /// Load a table afresh and make it the view's snapshot
    pub async fn load(&self, table: &str) -> Result<RowSet> {
        let loaded = crud::load_rows(self.database.as_ref(), table).await?;
        self.views
            .write()
            .await
            .insert(table.to_string(), TableView::new(loaded.clone()));
        Ok(loaded)
    }

    /// Reload after a write; a failure here is reported, never raised
    pub async fn reload_after_write(&self, table: &str) -> (Option<RowSet>, Option<String>) {
        match self.load(table).await {
            Ok(rows) => (Some(rows), None),
            Err(error) => {
                tracing::warn!(table = %table, %error, "Reload after write failed");
                self.views.write().await.remove(table);
                (None, Some(error.to_string()))
            }
        }
    }

    /// Run `action` on a table's view, loading it first if needed
    pub async fn with_view<T>(
        &self,
        table: &str,
        action: impl FnOnce(&mut TableView) -> Result<T>,
    ) -> Result<T> {
        let loaded = self.views.read().await.contains_key(table);

        // Load outside the lock; a snapshot stored meanwhile wins
        let fresh = if loaded {
            None
        } else {
            Some(crud::load_rows(self.database.as_ref(), table).await?)
        };

        let mut views = self.views.write().await;
        if let Some(fresh) = fresh {
            views
                .entry(table.to_string())
                .or_insert_with(|| TableView::new(fresh));
        }

        match views.get_mut(table) {
            Some(view) => action(view),
            None => Err(Error::Database(DatabaseError::TableNotFound(table.to_string()))),
        }
    }
}

/// Create the API router with all endpoints
///
/// # Arguments
///
/// * `state` - Shared editor state
///
/// # Returns
///
/// An Axum Router configured with all API routes
pub fn create_api_router<DB: DatabaseProvider>(state: Arc<EditorState<DB>>) -> Router {
    // Axum 0.8 uses {param} syntax instead of :param
    Router::new()
        .route("/tables", get(tables::list_tables_handler::<DB>))
        .route("/tables/{name}", get(tables::get_table_schema_handler::<DB>))
        .route(
            "/tables/{name}/rows",
            get(rows::get_rows_handler::<DB>)
                .post(write::insert_row_handler::<DB>)
                .put(write::update_row_handler::<DB>)
                .delete(write::delete_row_handler::<DB>),
        )
        .route("/tables/{name}/view", post(rows::apply_view_handler::<DB>))
        .route("/tables/{name}/view/reset", post(rows::reset_view_handler::<DB>))
        .route(
            "/tables/{name}/columns/{column}/values",
            get(rows::column_values_handler::<DB>),
        )
        .route(
            "/tables/{name}/form",
            get(form::new_form_handler::<DB>).post(form::edit_form_handler::<DB>),
        )
        .route("/tables/{name}/identity", post(write::capture_identity_handler::<DB>))
        .route(
            "/bookmarks",
            get(bookmarks::list_bookmarks_handler::<DB>)
                .post(bookmarks::add_bookmark_handler::<DB>)
                .delete(bookmarks::delete_bookmark_handler::<DB>),
        )
        .with_state(state)
}

/// Map an error onto a status code and a `{ error, kind }` body
pub(crate) fn error_response(error: Error) -> Response {
    let status = match &error {
        Error::Database(source) | Error::Write { source, .. } => match source {
            DatabaseError::TableNotFound(_) => StatusCode::NOT_FOUND,
            DatabaseError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            DatabaseError::Constraint(_) => StatusCode::CONFLICT,
            DatabaseError::Catalog(_) | DatabaseError::Schema { .. } | DatabaseError::Query(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        Error::UnknownColumn { .. } => StatusCode::NOT_FOUND,
        Error::AutoGeneratedColumn { .. }
        | Error::NothingToUpdate(_)
        | Error::EmptyIdentity(_)
        | Error::AmbiguousFieldName { .. }
        | Error::UnknownField(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::AlreadyBookmarked { .. } => StatusCode::CONFLICT,
        Error::Io(_) | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(%error, kind = error.kind(), "Request failed");
    } else {
        tracing::warn!(%error, kind = error.kind(), "Request rejected");
    }

    (
        status,
        Json(serde_json::json!({
            "error": error.to_string(),
            "kind": error.kind(),
        })),
    )
        .into_response()
}
