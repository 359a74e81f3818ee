//! todos - a local task list with due dates and an archive
//!
//! The task store owns the active and archived collections and rewrites
//! them to a key-value store after every change; views over them are
//! computed on demand.

pub mod cli;
pub mod commands;
pub mod config;
pub mod edit;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;
pub mod ui;
pub mod view;

pub use edit::EditSession;
pub use model::{Task, TaskId, ValidationError};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{StoreError, TaskStore};
pub use view::Filter;
