//! basement-lab - Personal workout tracker
//!
//! Phased training program on a running day counter, per-exercise log and
//! weekly weight progression.

pub mod db;
pub mod error;
pub mod exercise_log;
pub mod program;
pub mod progress;
pub mod schedule;
pub mod session;
pub mod suggest;
pub mod tui;

pub use db::{BlobStore, Database, MemoryStore};
pub use error::{CatalogError, SessionError, StorageError};
pub use program::Catalog;
pub use session::Session;
