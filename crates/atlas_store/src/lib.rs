//! Durable storage for the shared-world atlas
//!
//! This crate provides the repository abstraction over coordinates, projects
//! and tasks. Backends include an in-memory store (tests), JSON document
//! files, SQLite, and an HTTP client for a remote atlas server.
//!
//! Backends translate between the storage row shape in [`rows`] and the
//! application shape in the `entities` crate.

mod error;
mod http;
mod json_file;
mod memory;
pub mod rows;
mod sqlite;
mod traits;

pub use error::*;
pub use http::HttpStore;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, SCHEMA_SQL};
pub use traits::*;
