//! Editor configuration

use crate::bookmarks::DEFAULT_BOOKMARK_FILE;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BASE_PATH: &str = "/table-editor";

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

/// Settings for mounting and serving the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Database file to browse
    pub database_path: PathBuf,

    /// JSON file holding bookmarks
    #[serde(default = "default_bookmark_path")]
    pub bookmark_path: PathBuf,

    /// URL path the editor is mounted under (e.g. "/table-editor")
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Address the standalone server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
}

impl EditorConfig {
    /// Configuration for a database file with every other setting defaulted
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            bookmark_path: default_bookmark_path(),
            base_path: default_base_path(),
            bind_address: default_bind_address(),
        }
    }

    pub fn with_bookmark_path(mut self, bookmark_path: impl Into<PathBuf>) -> Self {
        self.bookmark_path = bookmark_path.into();
        self
    }

    /// Set the mount path; a trailing slash is dropped
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        self.base_path = base_path.trim_end_matches('/').to_string();
        self
    }

    pub fn with_bind_address(mut self, bind_address: SocketAddr) -> Self {
        self.bind_address = bind_address;
        self
    }
}

fn default_bookmark_path() -> PathBuf {
    PathBuf::from(DEFAULT_BOOKMARK_FILE)
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}
