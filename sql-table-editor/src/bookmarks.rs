//! Bookmarks of (database file, table) pairs
//!
//! Stored as a JSON array of `{ "databasePath": ..., "tableName": ... }`
//! records. Readers ignore unknown fields and default missing ones to the
//! empty string.

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default bookmark file name
pub const DEFAULT_BOOKMARK_FILE: &str = "bookmarks.json";

/// A remembered table; equal when both path and table are equal
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    #[serde(default)]
    pub database_path: String,

    #[serde(default)]
    pub table_name: String,
}

impl Bookmark {
    pub fn new(database_path: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            table_name: table_name.into(),
        }
    }

    /// File name part of the database path
    pub fn database_file_name(&self) -> String {
        Path::new(&self.database_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.database_path.clone())
    }
}

impl fmt::Display for Bookmark {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} → {}", self.database_file_name(), self.table_name)
    }
}

/// Persistence for the bookmark list
#[async_trait]
pub trait BookmarkRegistry: Send + Sync + 'static {
    async fn load(&self) -> Result<Vec<Bookmark>>;

    async fn save(&self, bookmarks: &[Bookmark]) -> Result<()>;
}

/// Bookmark registry backed by a JSON file
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BookmarkRegistry for JsonFileRegistry {
    async fn load(&self) -> Result<Vec<Bookmark>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(error) => return Err(Error::Io(error)),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let bookmarks: Vec<Bookmark> = serde_json::from_str(&contents)?;
        tracing::debug!(path = %self.path.display(), count = bookmarks.len(), "Loaded bookmarks");
        Ok(bookmarks)
    }

    async fn save(&self, bookmarks: &[Bookmark]) -> Result<()> {
        let contents = serde_json::to_string_pretty(bookmarks)?;
        tokio::fs::write(&self.path, contents).await?;
        tracing::debug!(path = %self.path.display(), count = bookmarks.len(), "Saved bookmarks");
        Ok(())
    }
}

/// Ordered, duplicate-free bookmark list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bookmarks(Vec<Bookmark>);

impl Bookmarks {
    /// Build from stored records, dropping later duplicates
    pub fn from_stored(stored: Vec<Bookmark>) -> Self {
        let mut bookmarks = Self::default();
        for bookmark in stored {
            if !bookmarks.contains(&bookmark) {
                bookmarks.0.push(bookmark);
            }
        }
        bookmarks
    }

    pub fn contains(&self, bookmark: &Bookmark) -> bool {
        self.0.contains(bookmark)
    }

    /// Append a bookmark unless the same pair is already present
    pub fn add(&mut self, bookmark: Bookmark) -> Result<()> {
        if self.contains(&bookmark) {
            return Err(Error::AlreadyBookmarked {
                database_path: bookmark.database_path,
                table_name: bookmark.table_name,
            });
        }
        self.0.push(bookmark);
        Ok(())
    }

    /// Remove a bookmark; returns whether it was present
    pub fn remove(&mut self, bookmark: &Bookmark) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != bookmark);
        self.0.len() != before
    }

    pub fn as_slice(&self) -> &[Bookmark] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Group by database file name, in order of first appearance
    pub fn grouped(&self) -> Vec<BookmarkGroup> {
        let mut groups: Vec<BookmarkGroup> = Vec::new();
        for bookmark in &self.0 {
            let name = bookmark.database_file_name();
            match groups.iter_mut().find(|group| group.database_file == name) {
                Some(group) => group.bookmarks.push(bookmark.clone()),
                None => groups.push(BookmarkGroup {
                    database_file: name,
                    bookmarks: vec![bookmark.clone()],
                }),
            }
        }
        groups
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkGroup {
    pub database_file: String,
    pub bookmarks: Vec<Bookmark>,
}
