//! homekeep - household maintenance task tracker
//!
//! This library holds the core of the homekeep CLI: the task collection for
//! a handful of fixed places, its persistence, the filter/sort pipeline and
//! the recurring-task rule applied when a task is completed.
//!
//! # Core Concepts
//!
//! - **Places**: fixed locations every task belongs to
//! - **Tasks**: chores with type, category, priority, status, due date and cost
//! - **Recurrence**: completing a recurring task schedules its next occurrence
//! - **Backups**: the whole state exports to, and imports from, one JSON document
//!
//! # Module Organization
//!
//! - `model`: Places, tasks, the persisted `AppState` and input coercion
//! - `storage`: The state document and its stores (file, in-memory)
//! - `lock`: File locking and atomic writes
//! - `repo`: The task repository with write-through and change notifications
//! - `filter`: Visible-task filtering, ordering and place summaries
//! - `recurrence`: Successor scheduling for recurring tasks
//! - `draft`: Mapping user input onto tasks
//! - `templates`: Built-in starter tasks
//! - `transfer`: Backup export and import
//! - `config`: Configuration loading from `config.toml`
//! - `events`: JSONL change events
//! - `output`: Human and JSON command output
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface using clap

pub mod cli;
pub mod config;
pub mod draft;
pub mod error;
pub mod events;
pub mod filter;
pub mod lock;
pub mod model;
pub mod output;
pub mod recurrence;
pub mod repo;
pub mod storage;
pub mod templates;
pub mod transfer;

pub use error::{Error, Result};
