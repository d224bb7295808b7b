//! Task domain model.
//!
//! # Responsibility
//! - Define the task record shared by the local store, the mutation helpers
//!   and notification formatting.
//! - Validate fields before they reach persistence.
//!
//! # Invariants
//! - `description` is never blank.
//! - `uuid` is assigned by the store on insert and never reused.
//! - `id` is a working-set number and is only set for pending tasks.
//! - `tags` keep insertion order; an empty list means "no tags".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a stored task.
pub type TaskId = Uuid;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s,]+$").expect("valid tag regex"));

const PRIORITIES: &[&str] = &["H", "M", "L"];

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Open task, visible in the working set.
    #[default]
    Pending,
    /// Marked done.
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Validation failures for task records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyDescription,
    InvalidPriority(String),
    InvalidTag(String),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "task description must not be empty"),
            Self::InvalidPriority(value) => {
                write!(f, "invalid task priority `{value}`; expected H|M|L")
            }
            Self::InvalidTag(value) => {
                write!(f, "invalid tag `{value}`; tags must not contain whitespace or commas")
            }
        }
    }
}

impl Error for TaskValidationError {}

/// Task record, either pulled from an issue tracker or loaded from the store.
///
/// Issues pulled from remote services are represented by the same shape with
/// `uuid` and `id` unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub uuid: Option<TaskId>,
    /// Working-set number shown to the operator.
    pub id: Option<i64>,
    pub description: String,
    pub project: Option<String>,
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub status: TaskStatus,
    /// Service-specific attributes carried over from the issue.
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

impl Task {
    /// Creates a pending task with only a description set.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Checks field-level invariants.
    ///
    /// # Errors
    /// - `EmptyDescription` when the description is blank.
    /// - `InvalidPriority` when priority is not one of `H`, `M`, `L`.
    /// - `InvalidTag` for the first tag containing whitespace or commas.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.description.trim().is_empty() {
            return Err(TaskValidationError::EmptyDescription);
        }
        if let Some(priority) = self.priority.as_deref() {
            if !PRIORITIES.contains(&priority) {
                return Err(TaskValidationError::InvalidPriority(priority.to_string()));
            }
        }
        if let Some(tag) = self.tags.iter().find(|tag| !TAG_RE.is_match(tag)) {
            return Err(TaskValidationError::InvalidTag(tag.clone()));
        }
        Ok(())
    }
}
