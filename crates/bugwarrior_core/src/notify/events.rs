//! Named sync events and their in-process dispatch.
//!
//! # Invariants
//! - Handlers run on the calling thread in registration order.
//! - The first handler error stops dispatch and is returned to the emitter.

use crate::model::notification::SyncStats;
use crate::model::task::Task;
use crate::notify::backend::NotifyResult;
use log::debug;
use std::rc::Rc;

/// Event channel names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    PullFinished,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        Self::TaskCreated,
        Self::TaskUpdated,
        Self::TaskCompleted,
        Self::PullFinished,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TaskCreated => "task-created",
            Self::TaskUpdated => "task-updated",
            Self::TaskCompleted => "task-completed",
            Self::PullFinished => "pull_finished",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// One sync event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    TaskCreated(Task),
    TaskUpdated(Task),
    TaskCompleted(Task),
    PullFinished(SyncStats),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TaskCreated(_) => EventKind::TaskCreated,
            Self::TaskUpdated(_) => EventKind::TaskUpdated,
            Self::TaskCompleted(_) => EventKind::TaskCompleted,
            Self::PullFinished(_) => EventKind::PullFinished,
        }
    }
}

/// Receiver of dispatched events.
pub trait EventHandler {
    fn handle(&self, event: &Event) -> NotifyResult<()>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> NotifyResult<()>,
{
    fn handle(&self, event: &Event) -> NotifyResult<()> {
        self(event)
    }
}

/// Synchronous event dispatcher.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(EventKind, Rc<dyn EventHandler>)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `handler` to one event kind.
    pub fn connect(&mut self, kind: EventKind, handler: Rc<dyn EventHandler>) {
        debug!(
            "event=event_connect module=notify status=ok kind={}",
            kind.name()
        );
        self.handlers.push((kind, handler));
    }

    /// Number of handlers subscribed to `kind`.
    pub fn receivers(&self, kind: EventKind) -> usize {
        self.handlers
            .iter()
            .filter(|(subscribed, _)| *subscribed == kind)
            .count()
    }

    /// Delivers `event` to every matching handler and returns how many ran.
    pub fn emit(&self, event: &Event) -> NotifyResult<usize> {
        let kind = event.kind();
        let mut delivered = 0;
        for (_, handler) in self
            .handlers
            .iter()
            .filter(|(subscribed, _)| *subscribed == kind)
        {
            handler.handle(event)?;
            delivered += 1;
        }
        debug!(
            "event=event_emit module=notify status=ok kind={} delivered={delivered}",
            kind.name()
        );
        Ok(delivered)
    }
}
