//! Table listing and schema endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use crate::api::{error_response, EditorState};
use crate::database::traits::DatabaseProvider;
use crate::schema::TablesResponse;

/// Handler for GET /api/tables
///
/// Returns the user tables of the open database file.
///
/// # Arguments
///
/// * `state` - Editor state
///
/// # Returns
///
/// JSON response containing the database path and table names
pub async fn list_tables_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
) -> Response {
    match state.database.list_tables().await {
        Ok(tables) => (
            StatusCode::OK,
            Json(TablesResponse {
                database_path: state.database.location().to_string(),
                tables,
            }),
        )
            .into_response(),
        Err(error) => error_response(error.into()),
    }
}

/// Handler for GET /api/tables/:name
///
/// Returns the freshly discovered schema of a table: columns, data types,
/// auto-generated flags and primary key.
///
/// # Arguments
///
/// * `state` - Editor state
/// * `table_name` - Name of the table to get schema for
pub async fn get_table_schema_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
) -> Response {
    match state.database.get_table_schema(&table_name).await {
        Ok(schema) => (StatusCode::OK, Json(schema)).into_response(),
        Err(error) => error_response(error.into()),
    }
}
