use bugwarrior_core::{
    Event, EventBus, EventKind, MutationError, MutationOptions, MutationOutcome, NotifyResult,
    RepoError, RepoResult, ScriptedPrompt, Task, TaskId, TaskListQuery, TaskMutator, TaskStatus,
    TaskStore,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use uuid::Uuid;

/// In-memory store recording every mutating call.
#[derive(Default)]
struct RecordingStore {
    tasks: RefCell<BTreeMap<TaskId, Task>>,
    added: RefCell<Vec<Task>>,
    updated: RefCell<Vec<Task>>,
    done: RefCell<Vec<TaskId>>,
}

impl RecordingStore {
    fn with_task(task: Task) -> Self {
        let store = Self::default();
        let uuid = task.uuid.expect("seeded task needs a uuid");
        store.tasks.borrow_mut().insert(uuid, task);
        store
    }

    fn mutating_calls(&self) -> usize {
        self.added.borrow().len() + self.updated.borrow().len() + self.done.borrow().len()
    }
}

impl TaskStore for RecordingStore {
    fn task_add(&self, task: &Task) -> RepoResult<Task> {
        self.added.borrow_mut().push(task.clone());
        let mut stored = task.clone();
        let uuid = Uuid::new_v4();
        stored.uuid = Some(uuid);
        stored.id = Some(self.added.borrow().len() as i64);
        self.tasks.borrow_mut().insert(uuid, stored.clone());
        Ok(stored)
    }

    fn task_update(&self, task: &Task) -> RepoResult<()> {
        self.updated.borrow_mut().push(task.clone());
        Ok(())
    }

    fn task_done(&self, uuid: TaskId) -> RepoResult<()> {
        self.done.borrow_mut().push(uuid);
        match self.tasks.borrow_mut().get_mut(&uuid) {
            Some(task) => {
                task.status = TaskStatus::Completed;
                Ok(())
            }
            None => Err(RepoError::NotFound(uuid)),
        }
    }

    fn get_task(&self, uuid: TaskId) -> RepoResult<Option<Task>> {
        Ok(self.tasks.borrow().get(&uuid).cloned())
    }

    fn list_tasks(&self, _query: &TaskListQuery) -> RepoResult<Vec<Task>> {
        Ok(self.tasks.borrow().values().cloned().collect())
    }
}

fn recording_bus() -> (EventBus, Rc<RefCell<Vec<Event>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut bus = EventBus::new();
    for kind in EventKind::ALL {
        let events = Rc::clone(&events);
        bus.connect(
            kind,
            Rc::new(move |event: &Event| -> NotifyResult<()> {
                events.borrow_mut().push(event.clone());
                Ok(())
            }),
        );
    }
    (bus, events)
}

fn issue() -> Task {
    Task::new("foobar").with_extra("myattr", 42)
}

fn stored_task() -> Task {
    let mut task = Task::new("foobar").with_extra("myattr", 43);
    task.uuid = Some(Uuid::parse_str("12345678123456781234567812345678").unwrap());
    task.id = Some(1);
    task
}

fn options(dry_run: bool, timid: bool, notify: bool) -> MutationOptions {
    MutationOptions {
        dry_run,
        timid,
        notify,
    }
}

mod create {
    use super::*;

    #[test]
    fn adds_issue_to_store() {
        let store = RecordingStore::default();
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        let outcome = mutator
            .create(&issue(), options(false, false, false), None)
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(*store.added.borrow(), vec![issue()]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn dry_run_does_not_touch_store() {
        let store = RecordingStore::default();
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        let outcome = mutator
            .create(&issue(), options(true, false, false), None)
            .unwrap();

        assert_eq!(outcome, MutationOutcome::DryRun);
        assert_eq!(store.mutating_calls(), 0);
    }

    #[test]
    fn notify_emits_one_created_event_with_stored_task() {
        let store = RecordingStore::default();
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        mutator
            .create(&issue(), options(false, false, true), None)
            .unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::TaskCreated(task) => {
                assert_eq!(task.description, "foobar");
                assert!(task.uuid.is_some());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn dry_run_still_notifies_with_issue() {
        let store = RecordingStore::default();
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        mutator
            .create(&issue(), options(true, false, true), None)
            .unwrap();

        assert_eq!(store.mutating_calls(), 0);
        assert_eq!(*events.borrow(), vec![Event::TaskCreated(issue())]);
    }

    #[test]
    fn timid_apply_adds_once() {
        let store = RecordingStore::default();
        let (bus, _) = recording_bus();
        let prompt = ScriptedPrompt::new(["a"]);
        let mutator = TaskMutator::new(&store, &prompt, &bus);

        let outcome = mutator
            .create(&issue(), options(false, true, false), None)
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(*store.added.borrow(), vec![issue()]);
        assert_eq!(prompt.asked(), vec!["Create task: foobar"]);
    }

    #[test]
    fn timid_skip_neither_adds_nor_notifies() {
        let store = RecordingStore::default();
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::new(["s"]), &bus);

        let outcome = mutator
            .create(&issue(), options(false, true, true), None)
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Skipped);
        assert_eq!(store.mutating_calls(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn timid_unrecognized_response_skips() {
        let store = RecordingStore::default();
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::new(["maybe"]), &bus);

        let outcome = mutator
            .create(&issue(), options(false, true, false), None)
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Skipped);
        assert_eq!(store.mutating_calls(), 0);
    }

    #[test]
    fn completion_hook_runs_only_when_applied() {
        let store = RecordingStore::default();
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);
        let mut seen = Vec::new();

        let mut hook = |task: &Task| seen.push(task.uuid);
        mutator
            .create(&issue(), options(true, false, false), Some(&mut hook))
            .unwrap();
        mutator
            .create(&issue(), options(false, false, false), Some(&mut hook))
            .unwrap();

        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_some());
    }
}

mod modify {
    use super::*;

    #[test]
    fn updates_with_full_task() {
        let store = RecordingStore::default();
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        let outcome = mutator
            .modify(&stored_task(), options(false, false, false))
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(*store.updated.borrow(), vec![stored_task()]);
    }

    #[test]
    fn dry_run_does_not_update() {
        let store = RecordingStore::default();
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        mutator
            .modify(&stored_task(), options(true, false, false))
            .unwrap();

        assert_eq!(store.mutating_calls(), 0);
    }

    #[test]
    fn timid_apply_updates_once() {
        let store = RecordingStore::default();
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::new(["a"]), &bus);

        mutator
            .modify(&stored_task(), options(false, true, false))
            .unwrap();

        assert_eq!(*store.updated.borrow(), vec![stored_task()]);
    }

    #[test]
    fn timid_skip_does_not_update() {
        let store = RecordingStore::default();
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::new(["s"]), &bus);

        let outcome = mutator
            .modify(&stored_task(), options(false, true, false))
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Skipped);
        assert_eq!(store.mutating_calls(), 0);
    }

    #[test]
    fn never_notifies() {
        let store = RecordingStore::default();
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        mutator
            .modify(&stored_task(), options(false, false, true))
            .unwrap();

        assert!(events.borrow().is_empty());
    }
}

mod close {
    use super::*;

    fn uuid() -> TaskId {
        stored_task().uuid.unwrap()
    }

    #[test]
    fn marks_task_done_by_uuid() {
        let store = RecordingStore::with_task(stored_task());
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        let outcome = mutator
            .close(uuid(), options(false, false, false), None)
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(*store.done.borrow(), vec![uuid()]);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn dry_run_does_not_mark_done() {
        let store = RecordingStore::with_task(stored_task());
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        mutator
            .close(uuid(), options(true, false, false), None)
            .unwrap();

        assert_eq!(store.mutating_calls(), 0);
    }

    #[test]
    fn notify_emits_completed_event_with_fetched_task() {
        let store = RecordingStore::with_task(stored_task());
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        mutator
            .close(uuid(), options(false, false, true), None)
            .unwrap();

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::TaskCompleted(task) => {
                assert_eq!(task.uuid, Some(uuid()));
                assert_eq!(task.status, TaskStatus::Completed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn timid_apply_marks_done_once() {
        let store = RecordingStore::with_task(stored_task());
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::new(["apply"]), &bus);

        mutator
            .close(uuid(), options(false, true, false), None)
            .unwrap();

        assert_eq!(*store.done.borrow(), vec![uuid()]);
    }

    #[test]
    fn timid_skip_does_not_mark_done_or_notify() {
        let store = RecordingStore::with_task(stored_task());
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::new(["s"]), &bus);

        let outcome = mutator
            .close(uuid(), options(false, true, true), None)
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Skipped);
        assert_eq!(store.mutating_calls(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn store_failure_surfaces_without_notification() {
        let store = RecordingStore::default();
        let (bus, events) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);

        let err = mutator
            .close(uuid(), options(false, false, true), None)
            .unwrap_err();

        assert!(matches!(err, MutationError::Repo(RepoError::NotFound(_))));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn completion_hook_receives_closed_task() {
        let store = RecordingStore::with_task(stored_task());
        let (bus, _) = recording_bus();
        let mutator = TaskMutator::new(&store, ScriptedPrompt::default(), &bus);
        let mut closed = Vec::new();

        let mut hook = |task: &Task| closed.push(task.status);
        mutator
            .close(uuid(), options(false, false, false), Some(&mut hook))
            .unwrap();

        assert_eq!(closed, vec![TaskStatus::Completed]);
    }
}
