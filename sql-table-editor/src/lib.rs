//! # sql-table-editor
//!
//! A schema-agnostic browser and editor for tables in file-based SQL
//! databases, easily integrable as an Axum layer.
//!
//! ## Features
//!
//! - Runtime discovery of user tables, column types and primary keys
//! - Parameterized insert/update/delete for tables whose columns are not
//!   known ahead of time
//! - Row identity by primary key, falling back to a full-row match
//! - In-memory column filtering and sorting over the loaded rows
//! - Typed form descriptions for add/edit dialogs
//! - Bookmarks of (database, table) pairs
//!
//! ## Security Warning
//!
//! **This is a local tool!**
//!
//! - No authentication/authorization built-in
//! - Exposes the full schema and data of the opened database file
//! - Allows arbitrary row edits and deletions
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use sql_table_editor::TableEditorLayer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let editor = TableEditorLayer::sqlite("/editor", "./data/example.db", "bookmarks.json");
//!
//!     let app = Router::new()
//!         .route("/", get(|| async { "Hello, World!" }))
//!         .merge(editor.into_router());
//!
//!     // Serve the application...
//! }
//! ```

pub mod api;
pub mod bookmarks;
pub mod config;
pub mod crud;
pub mod database;
pub mod form;
pub mod layer;
pub mod schema;
pub mod sql;
pub mod view;

pub use bookmarks::{Bookmark, BookmarkRegistry, Bookmarks, JsonFileRegistry};
pub use config::EditorConfig;
pub use crud::{MatchStatus, WriteOutcome};
pub use form::{FieldInput, FieldKind, FieldSpec};
pub use layer::TableEditorLayer;
pub use schema::{
    ColumnDefinition, DataType, FieldValue, FieldValueMap, IdentityStrategy, Row, RowIdentity,
    RowSet, SortOrder, TableSchema, Value,
};
pub use view::{TableView, ViewState};

pub use database::traits::{DatabaseError, DatabaseProvider};

#[cfg(feature = "sqlite")]
pub use database::sqlite::SqliteProvider;

use std::fmt;
use thiserror::Error;

/// Write operation a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// A write statement failed; carries the table and operation for messaging
    #[error("{operation} on table '{table}' failed: {source}")]
    Write {
        table: String,
        operation: Operation,
        #[source]
        source: DatabaseError,
    },

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Column '{column}' in table '{table}' is assigned by the database and cannot be written")]
    AutoGeneratedColumn { table: String, column: String },

    #[error("No values to update in table '{0}'")]
    NothingToUpdate(String),

    #[error("Table '{0}' has no columns usable to identify a row")]
    EmptyIdentity(String),

    #[error("Columns '{first}' and '{second}' both map to form field '{identifier}'")]
    AmbiguousFieldName {
        identifier: String,
        first: String,
        second: String,
    },

    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Table '{table_name}' of '{database_path}' is already bookmarked")]
    AlreadyBookmarked {
        database_path: String,
        table_name: String,
    },

    #[error("Bookmark storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable kebab-case name of the error category, for UI presentation
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Database(source) | Error::Write { source, .. } => source.kind(),
            Error::UnknownColumn { .. } => "unknown-column",
            Error::AutoGeneratedColumn { .. } => "auto-generated-column",
            Error::NothingToUpdate(_) => "nothing-to-update",
            Error::EmptyIdentity(_) => "empty-identity",
            Error::AmbiguousFieldName { .. } => "ambiguous-field-name",
            Error::UnknownField(_) => "unknown-field",
            Error::AlreadyBookmarked { .. } => "already-bookmarked",
            Error::Io(_) => "bookmark-storage",
            Error::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
