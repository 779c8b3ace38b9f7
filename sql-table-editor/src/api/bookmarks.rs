//! Bookmark endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{error_response, EditorState};
use crate::bookmarks::{Bookmark, BookmarkGroup, Bookmarks};
use crate::database::traits::DatabaseProvider;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarksResponse {
    pub bookmarks: Bookmarks,
    pub groups: Vec<BookmarkGroup>,
}

impl From<Bookmarks> for BookmarksResponse {
    fn from(bookmarks: Bookmarks) -> Self {
        let groups = bookmarks.grouped();
        Self { bookmarks, groups }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookmarkRequest {
    pub table_name: String,

    /// Defaults to the database this editor has open
    #[serde(default)]
    pub database_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveBookmarkResponse {
    pub removed: bool,
    pub bookmarks: Bookmarks,
}

async fn load_bookmarks<DB: DatabaseProvider>(state: &EditorState<DB>) -> Result<Bookmarks> {
    Ok(Bookmarks::from_stored(state.bookmarks.load().await?))
}

/// Handler for GET /api/bookmarks
///
/// Returns all bookmarks, plus the same list grouped by database file name.
pub async fn list_bookmarks_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
) -> Response {
    match load_bookmarks(&state).await {
        Ok(bookmarks) => {
            (StatusCode::OK, Json(BookmarksResponse::from(bookmarks))).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Handler for POST /api/bookmarks
///
/// Bookmarks a table. A table of the open database must exist; the same
/// (database, table) pair can only be bookmarked once.
///
/// Request body:
/// ```json
/// { "tableName": "orders" }
/// ```
pub async fn add_bookmark_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Json(request): Json<AddBookmarkRequest>,
) -> Response {
    let result: Result<Bookmarks> = async {
        let database_path = request
            .database_path
            .unwrap_or_else(|| state.database.location().to_string());
        if database_path == state.database.location() {
            state.database.get_table_schema(&request.table_name).await?;
        }

        let _guard = state.bookmark_lock.lock().await;
        let mut bookmarks = load_bookmarks(&state).await?;
        bookmarks.add(Bookmark::new(database_path, request.table_name))?;
        state.bookmarks.save(bookmarks.as_slice()).await?;
        Ok(bookmarks)
    }
    .await;

    match result {
        Ok(bookmarks) => {
            tracing::info!(count = bookmarks.len(), "Bookmark added");
            (StatusCode::CREATED, Json(BookmarksResponse::from(bookmarks))).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Handler for DELETE /api/bookmarks
///
/// Removes a bookmark given as `{ "databasePath": ..., "tableName": ... }`.
pub async fn delete_bookmark_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Json(bookmark): Json<Bookmark>,
) -> Response {
    let result: Result<(bool, Bookmarks)> = async {
        let _guard = state.bookmark_lock.lock().await;
        let mut bookmarks = load_bookmarks(&state).await?;
        let removed = bookmarks.remove(&bookmark);
        if removed {
            state.bookmarks.save(bookmarks.as_slice()).await?;
        }
        Ok((removed, bookmarks))
    }
    .await;

    match result {
        Ok((removed, bookmarks)) => {
            let status = if removed {
                StatusCode::OK
            } else {
                StatusCode::NOT_FOUND
            };
            (status, Json(RemoveBookmarkResponse { removed, bookmarks })).into_response()
        }
        Err(error) => error_response(error),
    }
}
