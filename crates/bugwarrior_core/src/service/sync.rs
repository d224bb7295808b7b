//! One pull run: reconcile pulled issues with the pending tasks in the store.
//!
//! # Invariants
//! - Only pending tasks carrying `key_field` in `extra` are managed; others
//!   are never modified or closed.
//! - When several pending tasks share a key, only the one with the lowest
//!   working id is managed; the rest are reported and left alone.
//! - Every mutation goes through `TaskMutator`, so dry-run and timid policies
//!   apply per task.
//! - `pull_finished` is emitted once per run, after all mutations, with
//!   counters in `new`, `changed`, `completed` order.

use crate::model::notification::SyncStats;
use crate::model::task::Task;
use crate::notify::events::Event;
use crate::repo::task_repo::{TaskListQuery, TaskStore};
use crate::service::merge::{merge_left, ListField};
use crate::service::prompt::ConfirmPrompt;
use crate::service::task_mutator::{MutationOptions, MutationOutcome, MutationResult, TaskMutator};
use log::{info, warn};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};

pub const STAT_NEW: &str = "new";
pub const STAT_CHANGED: &str = "changed";
pub const STAT_COMPLETED: &str = "completed";

/// Applies `issues` to the store and returns the run counters.
///
/// Issues match stored tasks by the value of `extra[key_field]`. Matches are
/// merged and modified when anything differs (announced as `task-updated`
/// when `options.notify`), unmatched issues are created, and managed tasks
/// with no matching issue are closed.
pub fn synchronize<S: TaskStore, P: ConfirmPrompt>(
    mutator: &TaskMutator<'_, S, P>,
    issues: &[Task],
    key_field: &str,
    options: MutationOptions,
) -> MutationResult<SyncStats> {
    let mut stats: SyncStats = [(STAT_NEW, 0), (STAT_CHANGED, 0), (STAT_COMPLETED, 0)]
        .into_iter()
        .collect();

    // Listing is ordered by working id; the lowest one owns a shared key.
    let mut managed: BTreeMap<String, Task> = BTreeMap::new();
    for task in mutator.store().list_tasks(&TaskListQuery::pending())? {
        let Some(key) = issue_key(&task, key_field) else {
            continue;
        };
        match managed.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(task);
            }
            Entry::Occupied(owner) => warn!(
                "event=sync_task module=service status=ignored reason=duplicate_key key={} uuid={} owner={}",
                owner.key(),
                display_uuid(&task),
                display_uuid(owner.get())
            ),
        }
    }

    let mut seen = HashSet::new();
    for issue in issues {
        let Some(key) = issue_key(issue, key_field) else {
            warn!(
                "event=sync_issue module=service status=skipped reason=missing_key key_field={key_field}"
            );
            continue;
        };
        if !seen.insert(key.clone()) {
            warn!("event=sync_issue module=service status=skipped reason=duplicate_key key={key}");
            continue;
        }

        match managed.get(&key) {
            Some(existing) => {
                let merged = merge_issue(existing, issue);
                if merged == *existing {
                    continue;
                }
                if mutator.modify(&merged, options)? != MutationOutcome::Skipped {
                    stats.increment(STAT_CHANGED);
                    if options.notify {
                        mutator.events().emit(&Event::TaskUpdated(merged))?;
                    }
                }
            }
            None => {
                if mutator.create(issue, options, None)? != MutationOutcome::Skipped {
                    stats.increment(STAT_NEW);
                }
            }
        }
    }

    for (key, task) in &managed {
        if seen.contains(key) {
            continue;
        }
        let Some(uuid) = task.uuid else {
            continue;
        };
        if mutator.close(uuid, options, None)? != MutationOutcome::Skipped {
            stats.increment(STAT_COMPLETED);
        }
    }

    info!(
        "event=sync_run module=service status=ok new={} changed={} completed={} dry_run={}",
        stats.get(STAT_NEW).unwrap_or(0),
        stats.get(STAT_CHANGED).unwrap_or(0),
        stats.get(STAT_COMPLETED).unwrap_or(0),
        options.dry_run
    );
    mutator.events().emit(&Event::PullFinished(stats.clone()))?;
    Ok(stats)
}

fn display_uuid(task: &Task) -> String {
    task.uuid.map_or_else(|| "-".to_string(), |uuid| uuid.to_string())
}

fn issue_key(task: &Task, key_field: &str) -> Option<String> {
    task.extra.get(key_field).map(|value| value.to_string())
}

/// Local task updated with the issue's scalar fields and list values.
fn merge_issue(existing: &Task, issue: &Task) -> Task {
    let mut merged = existing.clone();
    merged.description = issue.description.clone();
    merged.project = issue.project.clone();
    merged.priority = issue.priority.clone();
    merge_left(ListField::Tags, &mut merged, issue);
    merge_left(ListField::Annotations, &mut merged, issue);
    for (name, value) in &issue.extra {
        merged.extra.insert(name.clone(), value.clone());
    }
    merged
}
