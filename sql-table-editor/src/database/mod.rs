//! Database abstraction layer
//!
//! This module provides a database-agnostic interface for schema discovery
//! and parameterized row access.

pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use traits::{DatabaseError, DatabaseProvider};
