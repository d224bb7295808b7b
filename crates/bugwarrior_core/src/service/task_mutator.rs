//! Create/modify/close mutations against the task store.
//!
//! # Responsibility
//! - Gate each mutation behind dry-run and timid (interactive) policies.
//! - Emit task events for requested notifications.
//!
//! # Invariants
//! - Dry run never calls a mutating store method.
//! - A skipped mutation neither mutates nor notifies.
//! - Notification, when requested, follows any non-skipped mutation,
//!   including dry runs.
//! - Store, prompt and notification failures are returned unchanged; nothing
//!   is retried.

use crate::model::task::{Task, TaskId};
use crate::notify::backend::NotifyError;
use crate::notify::events::{Event, EventBus};
use crate::repo::task_repo::{RepoError, TaskStore};
use crate::service::prompt::{ConfirmPrompt, TimidChoice};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MutationResult<T> = Result<T, MutationError>;

/// Called with the resulting task after a mutation was applied.
pub type CompletionHook<'h> = &'h mut dyn FnMut(&Task);

/// Failure of one mutation call.
#[derive(Debug)]
pub enum MutationError {
    Repo(RepoError),
    Notify(NotifyError),
    Prompt(std::io::Error),
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Notify(err) => write!(f, "{err}"),
            Self::Prompt(err) => write!(f, "failed to read confirmation: {err}"),
        }
    }
}

impl Error for MutationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Notify(err) => Some(err),
            Self::Prompt(err) => Some(err),
        }
    }
}

impl From<RepoError> for MutationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<NotifyError> for MutationError {
    fn from(value: NotifyError) -> Self {
        Self::Notify(value)
    }
}

/// Per-call mutation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationOptions {
    pub dry_run: bool,
    pub timid: bool,
    /// Ignored by `modify`.
    pub notify: bool,
}

/// Terminal state of one mutation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    DryRun,
    Skipped,
}

/// Applies task mutations with confirmation and notification side effects.
pub struct TaskMutator<'bus, S, P> {
    store: S,
    prompt: P,
    events: &'bus EventBus,
}

impl<'bus, S: TaskStore, P: ConfirmPrompt> TaskMutator<'bus, S, P> {
    pub fn new(store: S, prompt: P, events: &'bus EventBus) -> Self {
        Self {
            store,
            prompt,
            events,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &'bus EventBus {
        self.events
    }

    /// Adds `issue` to the store.
    ///
    /// With `notify`, emits `task-created` carrying the stored task (or the
    /// issue itself on dry run).
    pub fn create(
        &self,
        issue: &Task,
        options: MutationOptions,
        completion_hook: Option<CompletionHook<'_>>,
    ) -> MutationResult<MutationOutcome> {
        let subject = format!("Create task: {}", issue.description);
        if !self.confirm("task_create", &subject, options.timid)? {
            return Ok(MutationOutcome::Skipped);
        }

        let (task, outcome) = if options.dry_run {
            (issue.clone(), MutationOutcome::DryRun)
        } else {
            let stored = self
                .store
                .task_add(issue)
                .map_err(|err| log_failure("task_create", err))?;
            if let Some(hook) = completion_hook {
                hook(&stored);
            }
            (stored, MutationOutcome::Applied)
        };
        log_outcome("task_create", outcome, task.uuid);

        if options.notify {
            self.events.emit(&Event::TaskCreated(task))?;
        }
        Ok(outcome)
    }

    /// Writes the full, already merged `task` back to the store.
    ///
    /// Never notifies; callers announce updates themselves.
    pub fn modify(&self, task: &Task, options: MutationOptions) -> MutationResult<MutationOutcome> {
        let subject = format!("Modify task: {}", task.description);
        if !self.confirm("task_modify", &subject, options.timid)? {
            return Ok(MutationOutcome::Skipped);
        }

        let outcome = if options.dry_run {
            MutationOutcome::DryRun
        } else {
            self.store
                .task_update(task)
                .map_err(|err| log_failure("task_modify", err))?;
            MutationOutcome::Applied
        };
        log_outcome("task_modify", outcome, task.uuid);
        Ok(outcome)
    }

    /// Marks the task `uuid` done.
    ///
    /// With `notify`, re-reads the task and emits `task-completed`.
    pub fn close(
        &self,
        uuid: TaskId,
        options: MutationOptions,
        completion_hook: Option<CompletionHook<'_>>,
    ) -> MutationResult<MutationOutcome> {
        let subject = format!("Close task: {uuid}");
        if !self.confirm("task_close", &subject, options.timid)? {
            return Ok(MutationOutcome::Skipped);
        }

        let outcome = if options.dry_run {
            MutationOutcome::DryRun
        } else {
            self.store
                .task_done(uuid)
                .map_err(|err| log_failure("task_close", err))?;
            MutationOutcome::Applied
        };
        log_outcome("task_close", outcome, Some(uuid));

        let wants_hook = completion_hook.is_some() && outcome == MutationOutcome::Applied;
        if !(options.notify || wants_hook) {
            return Ok(outcome);
        }

        let task = self
            .store
            .get_task(uuid)?
            .ok_or(RepoError::NotFound(uuid))?;
        if let Some(hook) = completion_hook.filter(|_| wants_hook) {
            hook(&task);
        }
        if options.notify {
            self.events.emit(&Event::TaskCompleted(task))?;
        }
        Ok(outcome)
    }

    fn confirm(&self, event: &str, subject: &str, timid: bool) -> MutationResult<bool> {
        if !timid {
            return Ok(true);
        }
        match self.prompt.confirm(subject).map_err(MutationError::Prompt)? {
            TimidChoice::Apply => Ok(true),
            TimidChoice::Skip => {
                info!("event={event} module=service status=skipped");
                Ok(false)
            }
        }
    }
}

fn log_outcome(event: &str, outcome: MutationOutcome, uuid: Option<TaskId>) {
    let status = match outcome {
        MutationOutcome::Applied => "ok",
        MutationOutcome::DryRun => "dry_run",
        MutationOutcome::Skipped => "skipped",
    };
    match uuid {
        Some(uuid) => info!("event={event} module=service status={status} uuid={uuid}"),
        None => info!("event={event} module=service status={status}"),
    }
}

fn log_failure(event: &str, err: RepoError) -> RepoError {
    error!("event={event} module=service status=error error={err}");
    err
}
