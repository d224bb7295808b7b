//! Repository layer for the local task store.
//!
//! # Responsibility
//! - Define the task store contract used by mutation helpers.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Writes enforce `Task::validate()` before persistence.
//! - Missing rows surface as `RepoError::NotFound`, not as silent no-ops.

pub mod task_repo;
