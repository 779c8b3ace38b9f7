//! Insert, update and delete endpoints
//!
//! Every write rediscovers the schema, runs exactly one statement and then
//! reloads the table. A failed reload is reported next to the write's
//! result; it never turns a successful write into a failure.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::form::RowRequest;
use crate::api::{error_response, EditorState};
use crate::crud::{self, WriteOutcome, FULL_ROW_IDENTITY_WARNING};
use crate::database::traits::DatabaseProvider;
use crate::form::{build_fields, collect_values, FieldInput};
use crate::schema::{FieldValueMap, IdentityStrategy, RowIdentity, RowSet, TableSchema};
use crate::Result;

/// Submitted form values keyed by field identifier
pub type SubmittedFields = BTreeMap<String, Option<FieldInput>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub identity: RowIdentity,

    /// Set when the identity is a full-row match
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    #[serde(default)]
    pub fields: SubmittedFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub identity: RowIdentity,

    #[serde(default)]
    pub fields: SubmittedFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub identity: RowIdentity,
}

/// Result of a write plus the reload that followed it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse {
    /// Match outcome (update and delete only)
    pub outcome: Option<WriteOutcome>,

    /// No-match or ambiguous-match warning
    pub warning: Option<String>,

    /// Freshly loaded rows, if the reload succeeded
    pub rows: Option<RowSet>,

    /// Why the reload failed, if it did
    pub reload_error: Option<String>,
}

async fn submitted_values<DB: DatabaseProvider>(
    state: &EditorState<DB>,
    table_name: &str,
    submitted: &SubmittedFields,
) -> Result<(TableSchema, FieldValueMap)> {
    let schema = state.database.get_table_schema(table_name).await?;
    let fields = build_fields(&schema, None)?;
    let values = collect_values(&fields, submitted)?;
    Ok((schema, values))
}

async fn finish<DB: DatabaseProvider>(
    state: &EditorState<DB>,
    table_name: &str,
    outcome: Option<WriteOutcome>,
) -> Response {
    let (rows, reload_error) = state.reload_after_write(table_name).await;
    let warning = outcome.and_then(|outcome| outcome.warning());

    (
        StatusCode::OK,
        Json(WriteResponse {
            outcome,
            warning,
            rows,
            reload_error,
        }),
    )
        .into_response()
}

/// Handler for POST /api/tables/:name/identity
///
/// Captures the identity of a displayed row when the user opens the edit or
/// delete action. The identity is sent back unchanged with the update or
/// delete request.
pub async fn capture_identity_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
    Json(request): Json<RowRequest>,
) -> Response {
    let result: Result<RowIdentity> = async {
        let schema = state.database.get_table_schema(&table_name).await?;
        crud::capture_identity(&schema, &request.row)
    }
    .await;

    match result {
        Ok(identity) => {
            let warning = (identity.strategy == IdentityStrategy::FullRow)
                .then(|| FULL_ROW_IDENTITY_WARNING.to_string());
            (StatusCode::OK, Json(IdentityResponse { identity, warning })).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Handler for POST /api/tables/:name/rows
///
/// Inserts a row from submitted form fields.
///
/// Request body:
/// ```json
/// { "fields": { "name": "Ada", "active": true } }
/// ```
pub async fn insert_row_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
    Json(request): Json<InsertRequest>,
) -> Response {
    let result: Result<()> = async {
        let (schema, values) = submitted_values(&state, &table_name, &request.fields).await?;
        crud::insert(state.database.as_ref(), &schema, &values).await
    }
    .await;

    match result {
        Ok(()) => finish(&state, &table_name, None).await,
        Err(error) => error_response(error),
    }
}

/// Handler for PUT /api/tables/:name/rows
///
/// Updates the row(s) matching a captured identity.
///
/// Request body:
/// ```json
/// {
///   "identity": { "strategy": "primaryKey", "columns": [{ "column": "id", "value": 3 }] },
///   "fields": { "name": "Grace", "active": false }
/// }
/// ```
pub async fn update_row_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Response {
    let result: Result<WriteOutcome> = async {
        let (schema, values) = submitted_values(&state, &table_name, &request.fields).await?;
        crud::update(state.database.as_ref(), &schema, &request.identity, &values).await
    }
    .await;

    match result {
        Ok(outcome) => finish(&state, &table_name, Some(outcome)).await,
        Err(error) => error_response(error),
    }
}

/// Handler for DELETE /api/tables/:name/rows
///
/// Deletes the row(s) matching a captured identity.
pub async fn delete_row_handler<DB: DatabaseProvider>(
    State(state): State<Arc<EditorState<DB>>>,
    Path(table_name): Path<String>,
    Json(request): Json<DeleteRequest>,
) -> Response {
    let result: Result<WriteOutcome> = async {
        let schema = state.database.get_table_schema(&table_name).await?;
        crud::delete(state.database.as_ref(), &schema, &request.identity).await
    }
    .await;

    match result {
        Ok(outcome) => finish(&state, &table_name, Some(outcome)).await,
        Err(error) => error_response(error),
    }
}
