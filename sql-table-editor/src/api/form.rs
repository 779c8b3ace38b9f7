//! Add/edit form description endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{error_response, EditorState};
use crate::database::traits::DatabaseProvider;
use crate::form::{build_fields, FieldSpec};
use crate::schema::Row;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub table: String,
    pub fields: Vec<FieldSpec>,
}

/// A row as currently displayed in the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRequest {
    pub row: Row,
}

async fn describe_form<DB: DatabaseProvider>(
    state: &EditorState<DB>,
    table_name: &str,
    existing: Option<&Row>,
) -> Result<FormResponse> {
    let schema = state.database.get_table_schema(table_name).await?;
    let fields = build_fields(&schema, existing)?;
    Ok(FormResponse {
        table: schema.name,
        fields,
    })
}

/// Handler for GET /api/tables/:name/form
///
/// Describes the empty form for adding a row: one field per writable
/// column, in column order.
pub async fn new_form_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
) -> Response {
    match describe_form(&state, &table_name, None).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Handler for POST /api/tables/:name/form
///
/// Describes the form for editing a row, seeded from the row in the body.
///
/// Request body:
/// ```json
/// { "row": { "id": 3, "name": "Ada", "active": true } }
/// ```
pub async fn edit_form_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
    Json(request): Json<RowRequest>,
) -> Response {
    match describe_form(&state, &table_name, Some(&request.row)).await {
        Ok(form) => (StatusCode::OK, Json(form)).into_response(),
        Err(error) => error_response(error),
    }
}
