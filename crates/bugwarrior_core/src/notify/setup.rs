//! Config-driven notifier wiring.

use crate::config::{AppConfig, ConfigError};
use crate::notify::backend::{notification_backend, NotificationBackend};
use crate::notify::events::{EventBus, EventKind};
use crate::notify::notifier::Notifier;
use log::{error, info};
use std::rc::Rc;

const CONFIG_SECTION: &str = "notifications";

/// Builds a notifier from `[notifications]` and subscribes it to `bus`.
///
/// Returns `Ok(None)` when notifications are disabled or incompletely
/// configured; those cases are logged, not fatal.
///
/// # Errors
/// - `ConfigError::UnknownBackend` when `backend` names no known backend.
pub fn setup(config: &AppConfig, bus: &mut EventBus) -> Result<Option<Rc<Notifier>>, ConfigError> {
    setup_with_backend(config, bus, notification_backend)
}

/// Same as [`setup`], with the backend factory supplied by the caller.
pub fn setup_with_backend<F>(
    config: &AppConfig,
    bus: &mut EventBus,
    make_backend: F,
) -> Result<Option<Rc<Notifier>>, ConfigError>
where
    F: FnOnce(&str) -> Result<Box<dyn NotificationBackend>, ConfigError>,
{
    let Some(section) = config.notifications.as_ref() else {
        return Ok(None);
    };
    let Some(enabled) = section.notifications else {
        error!(
            "event=notify_setup module=notify status=disabled reason=missing_option option=notifications section={CONFIG_SECTION}"
        );
        return Ok(None);
    };
    if !enabled {
        return Ok(None);
    }
    let Some(backend_name) = section.backend.as_deref() else {
        error!(
            "event=notify_setup module=notify status=disabled reason=missing_option option=backend section={CONFIG_SECTION}"
        );
        return Ok(None);
    };

    let backend = make_backend(backend_name)?;
    let notifier = Rc::new(Notifier::new(
        backend,
        section.finished_querying_sticky,
        section.task_crud_sticky,
    ));

    for kind in EventKind::ALL {
        if kind == EventKind::PullFinished && section.only_on_new_tasks {
            continue;
        }
        bus.connect(kind, notifier.clone());
    }

    info!(
        "event=notify_setup module=notify status=ok backend={} only_on_new_tasks={}",
        notifier.backend_name(),
        section.only_on_new_tasks
    );
    Ok(Some(notifier))
}
