//! Notification formatting and dispatch.
//!
//! # Invariants
//! - Every `on_*` call sends exactly one notification through the backend.
//! - `sticky` comes from the configured category flag only, never from the
//!   task or stats content.
//! - Backend errors are returned unchanged.

use crate::model::notification::{Notification, SyncStats};
use crate::model::task::Task;
use crate::notify::backend::{NotificationBackend, NotifyResult};
use crate::notify::events::{Event, EventHandler};
use crate::notify::logo_path;
use log::{error, info};
use std::path::PathBuf;

/// Summary shared by every notification.
pub const APP_SUMMARY: &str = "Bugwarrior";
/// Summary suffix for finished sync runs.
pub const PULL_FINISHED_SUMMARY: &str = "Finished querying for new issues.";

/// Kind of task change being announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskChange {
    Create,
    Update,
    Complete,
}

impl TaskChange {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Complete => "Complete",
        }
    }
}

/// Routes sync events to a notification backend.
pub struct Notifier {
    backend: Box<dyn NotificationBackend>,
    icon: PathBuf,
    finished_querying_sticky: bool,
    task_crud_sticky: bool,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("icon", &self.icon)
            .field("finished_querying_sticky", &self.finished_querying_sticky)
            .field("task_crud_sticky", &self.task_crud_sticky)
            .finish_non_exhaustive()
    }
}

impl Notifier {
    pub fn new(
        backend: Box<dyn NotificationBackend>,
        finished_querying_sticky: bool,
        task_crud_sticky: bool,
    ) -> Self {
        Self {
            backend,
            icon: logo_path(),
            finished_querying_sticky,
            task_crud_sticky,
        }
    }

    /// Overrides the icon attached to every notification.
    pub fn with_icon(mut self, icon: impl Into<PathBuf>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Builds a notification; `summary` is appended to the app name when given.
    pub fn make_notification(
        &self,
        body: impl Into<String>,
        sticky: bool,
        summary: Option<&str>,
    ) -> Notification {
        let summary = match summary {
            Some(suffix) => format!("{APP_SUMMARY}: {suffix}"),
            None => APP_SUMMARY.to_string(),
        };
        Notification {
            summary,
            body: body.into(),
            icon: self.icon.clone(),
            sticky,
        }
    }

    pub fn on_pull_finished(&self, stats: &SyncStats) -> NotifyResult<()> {
        let notification = self.make_notification(
            format_stats(stats),
            self.finished_querying_sticky,
            Some(PULL_FINISHED_SUMMARY),
        );
        self.send("pull_finished", &notification)
    }

    pub fn on_task_created(&self, task: &Task) -> NotifyResult<()> {
        self.task_change(TaskChange::Create, task)
    }

    pub fn on_task_updated(&self, task: &Task) -> NotifyResult<()> {
        self.task_change(TaskChange::Update, task)
    }

    pub fn on_task_completed(&self, task: &Task) -> NotifyResult<()> {
        self.task_change(TaskChange::Complete, task)
    }

    fn task_change(&self, change: TaskChange, task: &Task) -> NotifyResult<()> {
        let notification = self.make_notification(
            format_task_change(change, task),
            self.task_crud_sticky,
            None,
        );
        self.send(change.verb(), &notification)
    }

    fn send(&self, event: &str, notification: &Notification) -> NotifyResult<()> {
        let backend = self.backend.name();
        match self.backend.notify(notification) {
            Ok(()) => {
                info!(
                    "event=notify module=notify status=ok backend={backend} kind={event} sticky={}",
                    notification.sticky
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=notify module=notify status=error backend={backend} kind={event} error={err}"
                );
                Err(err)
            }
        }
    }
}

impl EventHandler for Notifier {
    fn handle(&self, event: &Event) -> NotifyResult<()> {
        match event {
            Event::TaskCreated(task) => self.on_task_created(task),
            Event::TaskUpdated(task) => self.on_task_updated(task),
            Event::TaskCompleted(task) => self.on_task_completed(task),
            Event::PullFinished(stats) => self.on_pull_finished(stats),
        }
    }
}

/// Formats the body of a task change notification.
///
/// Layout: `"<Verb> task: <description>"`, then optional `Project`, `Priority`
/// and `Tags` lines, in that order.
pub fn format_task_change(change: TaskChange, task: &Task) -> String {
    let mut message = format!("{} task: {}", change.verb(), task.description);
    if let Some(project) = &task.project {
        message.push_str(&format!("\nProject: {project}"));
    }
    if let Some(priority) = &task.priority {
        message.push_str(&format!("\nPriority: {priority}"));
    }
    if !task.tags.is_empty() {
        message.push_str(&format!("\nTags: {}", task.tags.join(", ")));
    }
    message
}

/// Formats sync counters as `"New: 3, Changed: 1"`, keeping stats order.
pub fn format_stats(stats: &SyncStats) -> String {
    stats
        .iter()
        .map(|(name, count)| format!("{}: {count}", capitalize(name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{capitalize, format_task_change, TaskChange};
    use crate::model::task::Task;

    #[test]
    fn capitalize_lowercases_the_tail() {
        assert_eq!(capitalize("new"), "New");
        assert_eq!(capitalize("cHANGED"), "Changed");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn empty_tags_add_no_line() {
        let task = Task::new("towel").with_tags(Vec::<String>::new());
        assert_eq!(
            format_task_change(TaskChange::Update, &task),
            "Update task: towel"
        );
    }
}
