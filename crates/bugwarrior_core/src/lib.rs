//! Core of bugwarrior: local task mutations and sync notifications.
//!
//! Pulled issues become tasks in a local SQLite store through
//! [`TaskMutator`], which honors dry-run and timid (confirm-each) policies.
//! Task changes and finished pulls are announced as events that a
//! [`Notifier`] turns into desktop notifications.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError, GeneralConfig, NotificationConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::notification::{Notification, SyncStats};
pub use model::task::{Task, TaskId, TaskStatus, TaskValidationError};
pub use notify::backend::{
    notification_backend, BackendKind, NotificationBackend, NotifyError, NotifyResult,
};
pub use notify::events::{Event, EventBus, EventHandler, EventKind};
pub use notify::notifier::{Notifier, TaskChange};
pub use notify::setup::{setup, setup_with_backend};
pub use repo::task_repo::{RepoError, RepoResult, SqliteTaskStore, TaskListQuery, TaskStore};
pub use service::merge::{merge_left, ListField};
pub use service::prompt::{ConfirmPrompt, StdinPrompt, TimidChoice};
#[cfg(any(test, feature = "test-util"))]
pub use service::prompt::ScriptedPrompt;
pub use service::sync::synchronize;
pub use service::task_mutator::{
    CompletionHook, MutationError, MutationOptions, MutationOutcome, MutationResult, TaskMutator,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
