//! Row loading and view projection endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{error_response, EditorState};
use crate::database::traits::DatabaseProvider;
use crate::schema::RowSet;
use crate::view::ViewState;

/// Rows after projection together with the state that produced them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub rows: RowSet,

    pub state: ViewState,

    /// Row count of the snapshot before filtering
    pub loaded_rows: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesQuery {
    /// Case-insensitive substring narrowing the candidates
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesResponse {
    pub column: String,
    pub values: Vec<String>,
}

/// Handler for GET /api/tables/:name/rows
///
/// Loads every row of the table from the store and makes it the snapshot
/// later view requests work on. Any filter or sort is dropped.
pub async fn get_rows_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
) -> Response {
    match state.load(&table_name).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Handler for POST /api/tables/:name/view
///
/// Replaces the view's filters and sort and returns the projected rows.
/// Works on the loaded snapshot; the store is only read if nothing is loaded yet.
///
/// Request body:
/// ```json
/// {
///   "filters": { "status": ["open"] },
///   "sort": { "column": "id", "order": "descending" }
/// }
/// ```
pub async fn apply_view_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
    Json(request): Json<ViewState>,
) -> Response {
    let result = state
        .with_view(&table_name, |view| {
            view.set_state(request)?;
            Ok(ViewResponse {
                rows: view.project(),
                state: view.state().clone(),
                loaded_rows: view.loaded().rows.len(),
            })
        })
        .await;

    match result {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Handler for POST /api/tables/:name/view/reset
///
/// Drops all filters and the sort, returning the snapshot as loaded.
pub async fn reset_view_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
) -> Response {
    match state
        .with_view(&table_name, |view| Ok(view.reset().clone()))
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Handler for GET /api/tables/:name/columns/:column/values
///
/// Distinct rendered values of a column across all loaded rows, sorted
/// ascending, for the column filter popup.
///
/// Query parameters:
/// - search: narrows candidates by case-insensitive substring (optional)
pub async fn column_values_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path((table_name, column)): Path<(String, String)>,
    Query(query): Query<ValuesQuery>,
) -> Response {
    let result = state
        .with_view(&table_name, |view| {
            view.distinct_values(&column, query.search.as_deref())
        })
        .await;

    match result {
        Ok(values) => (StatusCode::OK, Json(ValuesResponse { column, values })).into_response(),
        Err(error) => error_response(error),
    }
}
