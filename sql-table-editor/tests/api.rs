//! HTTP API behavior through the mounted router

mod common;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{create_database, LOG_TABLE, PEOPLE_TABLE};
use serde_json::{json, Value as Json};
use sql_table_editor::api::{create_api_router, EditorState};
use sql_table_editor::sql::Statement;
use sql_table_editor::{
    DatabaseError, DatabaseProvider, JsonFileRegistry, Row, SqliteProvider, TableEditorLayer,
    TableSchema,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// SQLite provider whose reads can be made to fail on demand
struct FlakyReads {
    inner: SqliteProvider,
    failing: AtomicBool,
}

#[async_trait]
impl DatabaseProvider for FlakyReads {
    fn location(&self) -> &str {
        self.inner.location()
    }

    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        self.inner.list_tables().await
    }

    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError> {
        self.inner.get_table_schema(table).await
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("disk I/O error".to_string()));
        }
        self.inner.query(statement).await
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DatabaseError> {
        self.inner.execute(statement).await
    }
}

fn editor(database: &Path) -> Router {
    let bookmarks = database.with_file_name("bookmarks.json");
    TableEditorLayer::new(
        "/table-editor/",
        SqliteProvider::new(database),
        JsonFileRegistry::new(bookmarks),
    )
    .into_router()
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header("content-type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_list_tables_and_schema() {
    let (_directory, path) = create_database(&[PEOPLE_TABLE, LOG_TABLE]).await;
    let app = editor(&path);

    let (status, body) = send(&app, Method::GET, "/table-editor/api/tables", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"], json!(["log", "people"]));

    let (status, body) = send(&app, Method::GET, "/table-editor/api/tables/people", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["primaryKey"], json!(["id"]));
    assert_eq!(body["columns"][0]["isAutoGenerated"], json!(true));

    let (status, body) = send(&app, Method::GET, "/table-editor/api/tables/missing/rows", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], json!("unknown-table"));
}

#[tokio::test]
async fn test_insert_edit_and_delete_round() {
    let (_directory, path) = create_database(&[PEOPLE_TABLE]).await;
    let app = editor(&path);

    let (status, form) = send(&app, Method::GET, "/table-editor/api/tables/people/form", None).await;
    assert_eq!(status, StatusCode::OK);
    let identifiers: Vec<_> = form["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["identifier"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(identifiers, vec!["name", "active", "status", "email"]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/table-editor/api/tables/people/rows",
        Some(json!({ "fields": { "name": "Ada", "active": true } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"]["rows"][0]["name"], json!("Ada"));
    assert!(body["reloadError"].is_null());

    let row = body["rows"]["rows"][0].clone();
    let (status, captured) = send(
        &app,
        Method::POST,
        "/table-editor/api/tables/people/identity",
        Some(json!({ "row": row })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(captured["identity"]["strategy"], json!("primaryKey"));
    assert!(captured["warning"].is_null());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/table-editor/api/tables/people/rows",
        Some(json!({
            "identity": captured["identity"],
            "fields": { "name": "Ada Lovelace", "active": false }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["status"], json!("matched"));
    assert_eq!(body["rows"]["rows"][0]["name"], json!("Ada Lovelace"));

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/table-editor/api/tables/people/rows",
        Some(json!({ "identity": captured["identity"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["affectedRows"], json!(1));
    assert_eq!(body["rows"]["rows"], json!([]));

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/table-editor/api/tables/people/rows",
        Some(json!({ "identity": captured["identity"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["status"], json!("noMatch"));
    assert!(body["warning"].is_string());
}

#[tokio::test]
async fn test_rejected_writes() {
    let (_directory, path) = create_database(&[
        PEOPLE_TABLE,
        "INSERT INTO people (name, email) VALUES ('Ada', 'ada@example.com')",
    ])
    .await;
    let app = editor(&path);

    let (status, body) = send(
        &app,
        Method::POST,
        "/table-editor/api/tables/people/rows",
        Some(json!({ "fields": { "nickname": "x" } })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], json!("unknown-field"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/table-editor/api/tables/people/rows",
        Some(json!({ "fields": { "name": "Copy", "email": "ada@example.com" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], json!("constraint"));
}

#[tokio::test]
async fn test_keyless_table_warns_on_identity() {
    let (_directory, path) = create_database(&[
        LOG_TABLE,
        "INSERT INTO log VALUES ('boot', 1)",
        "INSERT INTO log VALUES ('boot', 1)",
    ])
    .await;
    let app = editor(&path);

    let (_, rows) = send(&app, Method::GET, "/table-editor/api/tables/log/rows", None).await;
    let (status, captured) = send(
        &app,
        Method::POST,
        "/table-editor/api/tables/log/identity",
        Some(json!({ "row": rows["rows"][0] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(captured["identity"]["strategy"], json!("fullRow"));
    assert!(captured["warning"].is_string());

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/table-editor/api/tables/log/rows",
        Some(json!({ "identity": captured["identity"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["status"], json!("ambiguous"));
    assert_eq!(body["outcome"]["affectedRows"], json!(2));
}

#[tokio::test]
async fn test_view_filter_sort_and_values() {
    let (_directory, path) = create_database(&[
        PEOPLE_TABLE,
        "INSERT INTO people (name, status) VALUES ('Ada', 'open')",
        "INSERT INTO people (name, status) VALUES ('Grace', 'Closed')",
        "INSERT INTO people (name, status) VALUES ('Alan', 'open')",
    ])
    .await;
    let app = editor(&path);

    let (status, body) = send(
        &app,
        Method::POST,
        "/table-editor/api/tables/people/view",
        Some(json!({
            "filters": { "status": ["open"] },
            "sort": { "column": "name", "order": "ascending" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loadedRows"], json!(3));
    let names: Vec<_> = body["rows"]["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Ada", "Alan"]);

    let (status, body) = send(
        &app,
        Method::GET,
        "/table-editor/api/tables/people/columns/status/values?search=CLO",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["values"], json!(["Closed"]));

    let (status, body) = send(
        &app,
        Method::POST,
        "/table-editor/api/tables/people/view",
        Some(json!({ "sort": { "column": "nickname", "order": "ascending" } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], json!("unknown-column"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/table-editor/api/tables/people/view/reset",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_bookmarks_persist() {
    let (directory, path) = create_database(&[PEOPLE_TABLE]).await;
    let app = editor(&path);

    let (status, body) = send(&app, Method::GET, "/table-editor/api/bookmarks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bookmarks"], json!([]));

    let request = json!({ "tableName": "people" });
    let (status, body) = send(&app, Method::POST, "/table-editor/api/bookmarks", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["groups"][0]["databaseFile"], json!("editor.db"));

    let (status, body) = send(&app, Method::POST, "/table-editor/api/bookmarks", Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], json!("already-bookmarked"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/table-editor/api/bookmarks",
        Some(json!({ "tableName": "missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A second editor over the same files sees the stored bookmark
    let reopened = editor(&path);
    let (_, body) = send(&reopened, Method::GET, "/table-editor/api/bookmarks", None).await;
    assert_eq!(body["bookmarks"][0]["tableName"], json!("people"));
    assert!(directory.path().join("bookmarks.json").exists());

    let bookmark = body["bookmarks"][0].clone();
    let (status, body) = send(&reopened, Method::DELETE, "/table-editor/api/bookmarks", Some(bookmark.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], json!(true));

    let (status, body) = send(&reopened, Method::DELETE, "/table-editor/api/bookmarks", Some(bookmark)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["removed"], json!(false));
}

#[tokio::test]
async fn test_failed_reload_keeps_write_result() {
    let (_directory, path) = create_database(&[
        PEOPLE_TABLE,
        "INSERT INTO people (name) VALUES ('Ada')",
    ])
    .await;
    let provider = Arc::new(FlakyReads {
        inner: SqliteProvider::new(&path),
        failing: AtomicBool::new(false),
    });
    let state = Arc::new(EditorState::new(
        provider.clone(),
        Arc::new(JsonFileRegistry::new(path.with_file_name("bookmarks.json"))),
    ));
    let app = create_api_router(state);

    let (status, rows) = send(&app, Method::GET, "/tables/people/rows", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, captured) = send(
        &app,
        Method::POST,
        "/tables/people/identity",
        Some(json!({ "row": rows["rows"][0] })),
    )
    .await;

    provider.failing.store(true, Ordering::SeqCst);
    let (status, body) = send(
        &app,
        Method::PUT,
        "/tables/people/rows",
        Some(json!({
            "identity": captured["identity"],
            "fields": { "name": "Ada Lovelace" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["status"], json!("matched"));
    assert!(body["rows"].is_null());
    assert!(body["reloadError"].as_str().unwrap().contains("disk I/O error"));

    // The stale snapshot is gone, so the view has to read the store again
    let (status, body) = send(&app, Method::POST, "/tables/people/view", Some(json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["kind"], json!("query"));

    provider.failing.store(false, Ordering::SeqCst);
    let (status, body) = send(&app, Method::POST, "/tables/people/view", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"]["rows"][0]["name"], json!("Ada Lovelace"));
}
