//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the add/update/done/get/list surface used by task mutations.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Task::validate()` before SQL mutations.
//! - Tags and annotations are replaced as a whole, in one transaction with
//!   the task row, and read back in their stored order.
//! - Pending tasks hold a unique working id; completing a task clears it.

use crate::model::task::{Task, TaskId, TaskStatus, TaskValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    working_id,
    description,
    project,
    priority,
    status,
    extra
FROM tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Task store failure.
#[derive(Debug)]
pub enum RepoError {
    Validation(TaskValidationError),
    Sqlite(rusqlite::Error),
    /// The database was written by a newer build.
    SchemaTooNew {
        found: u32,
        supported: u32,
    },
    NotFound(TaskId),
    /// Update requested for a task that was never stored.
    MissingUuid,
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "task database is at schema {found}; this build understands up to {supported}"
            ),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::MissingUuid => write!(f, "task has no uuid; it was never stored"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. }
            | Self::NotFound(_)
            | Self::MissingUuid
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Filter for listing tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    /// `None` lists every status.
    pub status: Option<TaskStatus>,
    pub project: Option<String>,
}

impl TaskListQuery {
    pub fn pending() -> Self {
        Self {
            status: Some(TaskStatus::Pending),
            project: None,
        }
    }
}

/// Local task store used by the mutation helpers.
pub trait TaskStore {
    /// Inserts a new pending task and returns it as stored (uuid and working
    /// id assigned).
    fn task_add(&self, task: &Task) -> RepoResult<Task>;
    /// Replaces every field of an already stored task.
    fn task_update(&self, task: &Task) -> RepoResult<()>;
    /// Marks a task completed.
    fn task_done(&self, uuid: TaskId) -> RepoResult<()>;
    fn get_task(&self, uuid: TaskId) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>>;
}

impl<T: TaskStore + ?Sized> TaskStore for &T {
    fn task_add(&self, task: &Task) -> RepoResult<Task> {
        (**self).task_add(task)
    }

    fn task_update(&self, task: &Task) -> RepoResult<()> {
        (**self).task_update(task)
    }

    fn task_done(&self, uuid: TaskId) -> RepoResult<()> {
        (**self).task_done(uuid)
    }

    fn get_task(&self, uuid: TaskId) -> RepoResult<Option<Task>> {
        (**self).get_task(uuid)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        (**self).list_tasks(query)
    }
}

/// SQLite-backed task store.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn task_add(&self, task: &Task) -> RepoResult<Task> {
        task.validate()?;

        let uuid = task.uuid.unwrap_or_else(Uuid::new_v4);
        let tx = self.conn.unchecked_transaction()?;
        let working_id = next_working_id(&tx)?;

        tx.execute(
            "INSERT INTO tasks (
                uuid,
                working_id,
                description,
                project,
                priority,
                status,
                extra
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6);",
            params![
                uuid.to_string(),
                working_id,
                task.description.as_str(),
                task.project.as_deref(),
                task.priority.as_deref(),
                extra_to_db(&task.extra)?,
            ],
        )?;
        replace_lists(&tx, uuid, task)?;
        tx.commit()?;

        Ok(Task {
            uuid: Some(uuid),
            id: Some(working_id),
            status: TaskStatus::Pending,
            ..task.clone()
        })
    }

    fn task_update(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;
        let uuid = task.uuid.ok_or(RepoError::MissingUuid)?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE tasks
             SET
                description = ?1,
                project = ?2,
                priority = ?3,
                extra = ?4,
                modified_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?5;",
            params![
                task.description.as_str(),
                task.project.as_deref(),
                task.priority.as_deref(),
                extra_to_db(&task.extra)?,
                uuid.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(uuid));
        }

        replace_lists(&tx, uuid, task)?;
        tx.commit()?;
        Ok(())
    }

    fn task_done(&self, uuid: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                status = 'completed',
                working_id = NULL,
                end_at = COALESCE(end_at, strftime('%s', 'now') * 1000),
                modified_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [uuid.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(uuid));
        }

        Ok(())
    }

    fn get_task(&self, uuid: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let row = stmt
            .query_row([uuid.to_string()], |row| Ok(parse_task_row(row)))
            .optional()?;

        match row {
            Some(task) => {
                let mut task = task?;
                load_lists(self.conn, &mut task)?;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR project = ?2)
             ORDER BY working_id IS NULL, working_id ASC, entry_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            query.status.map(TaskStatus::as_str),
            query.project.as_deref(),
        ])?;

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        for task in &mut tasks {
            load_lists(self.conn, task)?;
        }

        Ok(tasks)
    }
}

fn next_working_id(tx: &Transaction<'_>) -> RepoResult<i64> {
    let current: Option<i64> = tx.query_row(
        "SELECT MAX(working_id) FROM tasks WHERE status = 'pending';",
        [],
        |row| row.get(0),
    )?;
    Ok(current.unwrap_or(0) + 1)
}

fn replace_lists(tx: &Transaction<'_>, uuid: TaskId, task: &Task) -> RepoResult<()> {
    let uuid_text = uuid.to_string();

    tx.execute("DELETE FROM task_tags WHERE task_uuid = ?1;", [&uuid_text])?;
    for (position, tag) in task.tags.iter().enumerate() {
        tx.execute(
            "INSERT INTO task_tags (task_uuid, position, tag) VALUES (?1, ?2, ?3);",
            params![uuid_text, position as i64, tag],
        )?;
    }

    tx.execute(
        "DELETE FROM task_annotations WHERE task_uuid = ?1;",
        [&uuid_text],
    )?;
    for (position, body) in task.annotations.iter().enumerate() {
        tx.execute(
            "INSERT INTO task_annotations (task_uuid, position, body) VALUES (?1, ?2, ?3);",
            params![uuid_text, position as i64, body],
        )?;
    }

    Ok(())
}

fn load_lists(conn: &Connection, task: &mut Task) -> RepoResult<()> {
    let Some(uuid) = task.uuid else {
        return Ok(());
    };
    let uuid_text = uuid.to_string();

    let mut tags = conn.prepare("SELECT tag FROM task_tags WHERE task_uuid = ?1 ORDER BY position;")?;
    task.tags = tags
        .query_map([&uuid_text], |row| row.get::<_, String>(0))?
        .collect::<Result<_, _>>()?;

    let mut annotations = conn.prepare(
        "SELECT body FROM task_annotations WHERE task_uuid = ?1 ORDER BY position;",
    )?;
    task.annotations = annotations
        .query_map([&uuid_text], |row| row.get::<_, String>(0))?
        .collect::<Result<_, _>>()?;

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in tasks.uuid"))
    })?;

    let status_text: String = row.get("status")?;
    let status = TaskStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let extra_text: String = row.get("extra")?;
    let extra = serde_json::from_str::<BTreeMap<String, Value>>(&extra_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid json in tasks.extra for {uuid}: {err}"))
    })?;

    Ok(Task {
        uuid: Some(uuid),
        id: row.get("working_id")?,
        description: row.get("description")?,
        project: row.get("project")?,
        priority: row.get("priority")?,
        tags: Vec::new(),
        annotations: Vec::new(),
        status,
        extra,
    })
}

fn extra_to_db(extra: &BTreeMap<String, Value>) -> RepoResult<String> {
    serde_json::to_string(extra)
        .map_err(|err| RepoError::InvalidData(format!("cannot serialize task extra: {err}")))
}
