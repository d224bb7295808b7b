//! Desktop notification backends.
//!
//! `gobject` talks to the freedesktop notification service through
//! `notify-rust`; `growlnotify` and `pynotify` hand the notification to an
//! external program. Failures surface as `NotifyError` and are never retried.

use crate::config::ConfigError;
use crate::model::notification::Notification;
use log::debug;
use notify_rust::Timeout;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::Command;

const APP_NAME: &str = "Bugwarrior";

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Notification delivery failure.
#[derive(Debug)]
pub enum NotifyError {
    /// The notifier program could not be started.
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },
    /// The notifier program ran and reported failure.
    CommandFailed {
        program: &'static str,
        code: Option<i32>,
        stderr: String,
    },
    /// The desktop notification service rejected or never received the call.
    Desktop(notify_rust::error::Error),
    /// Backend-specific failure without an underlying process.
    Unavailable(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn { program, source } => write!(f, "failed to run `{program}`: {source}"),
            Self::CommandFailed {
                program,
                code,
                stderr,
            } => match code {
                Some(code) => write!(f, "`{program}` exited with status {code}: {stderr}"),
                None => write!(f, "`{program}` was terminated by a signal: {stderr}"),
            },
            Self::Desktop(err) => write!(f, "desktop notification failed: {err}"),
            Self::Unavailable(message) => write!(f, "notification backend unavailable: {message}"),
        }
    }
}

impl Error for NotifyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Desktop(err) => Some(err),
            Self::CommandFailed { .. } | Self::Unavailable(_) => None,
        }
    }
}

/// Capability to display one notification.
pub trait NotificationBackend {
    /// Configuration name of this backend.
    fn name(&self) -> &'static str;
    fn notify(&self, notification: &Notification) -> NotifyResult<()>;
}

/// Backends selectable by the `backend` configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Growl,
    Pynotify,
    Gobject,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Growl => "growlnotify",
            Self::Pynotify => "pynotify",
            Self::Gobject => "gobject",
        }
    }

    /// Parses a configured backend name. Names match exactly; surrounding
    /// whitespace or different case is an unknown backend.
    ///
    /// # Errors
    /// - `ConfigError::UnknownBackend` for any other name.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "growlnotify" => Ok(Self::Growl),
            "pynotify" => Ok(Self::Pynotify),
            "gobject" => Ok(Self::Gobject),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }

    pub fn build(self) -> Box<dyn NotificationBackend> {
        match self {
            Self::Growl => Box::new(GrowlNotificationBackend),
            Self::Pynotify => Box::new(PynotifyNotificationBackend),
            Self::Gobject => Box::new(GobjectNotificationBackend),
        }
    }
}

/// Selects a backend by configuration name.
pub fn notification_backend(name: &str) -> Result<Box<dyn NotificationBackend>, ConfigError> {
    BackendKind::parse(name).map(BackendKind::build)
}

/// Growl, through the `growlnotify` command.
#[derive(Debug, Default)]
pub struct GrowlNotificationBackend;

impl GrowlNotificationBackend {
    const PROGRAM: &'static str = "growlnotify";

    fn args(notification: &Notification) -> Vec<String> {
        let mut args = vec![
            "-n".to_string(),
            APP_NAME.to_string(),
            "-t".to_string(),
            notification.summary.clone(),
            "-m".to_string(),
            notification.body.clone(),
            "--image".to_string(),
            notification.icon.display().to_string(),
            "-p".to_string(),
            "1".to_string(),
        ];
        if notification.sticky {
            args.push("-s".to_string());
        }
        args
    }
}

impl NotificationBackend for GrowlNotificationBackend {
    fn name(&self) -> &'static str {
        BackendKind::Growl.as_str()
    }

    fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        run(Self::PROGRAM, &Self::args(notification))
    }
}

/// libnotify, through the `notify-send` command.
#[derive(Debug, Default)]
pub struct PynotifyNotificationBackend;

impl PynotifyNotificationBackend {
    const PROGRAM: &'static str = "notify-send";

    fn args(notification: &Notification) -> Vec<String> {
        let mut args = vec![
            "-a".to_string(),
            APP_NAME.to_string(),
            "-i".to_string(),
            notification.icon.display().to_string(),
        ];
        if notification.sticky {
            args.push("-u".to_string());
            args.push("critical".to_string());
        }
        args.push(notification.summary.clone());
        args.push(notification.body.clone());
        args
    }
}

impl NotificationBackend for PynotifyNotificationBackend {
    fn name(&self) -> &'static str {
        BackendKind::Pynotify.as_str()
    }

    fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        run(Self::PROGRAM, &Self::args(notification))
    }
}

/// Freedesktop notification service over the session bus.
#[derive(Debug, Default)]
pub struct GobjectNotificationBackend;

impl GobjectNotificationBackend {
    fn message(notification: &Notification) -> notify_rust::Notification {
        // Sticky stays until dismissed; otherwise the server picks the expiry.
        let timeout = if notification.sticky {
            Timeout::Never
        } else {
            Timeout::Default
        };
        let mut message = notify_rust::Notification::new();
        message
            .appname(APP_NAME)
            .summary(&notification.summary)
            .body(&notification.body)
            .icon(&notification.icon.display().to_string())
            .timeout(timeout);
        message
    }
}

impl NotificationBackend for GobjectNotificationBackend {
    fn name(&self) -> &'static str {
        BackendKind::Gobject.as_str()
    }

    fn notify(&self, notification: &Notification) -> NotifyResult<()> {
        debug!("event=notify_exec module=notify status=start program=dbus");
        Self::message(notification)
            .show()
            .map(drop)
            .map_err(NotifyError::Desktop)
    }
}

fn run(program: &'static str, args: &[String]) -> NotifyResult<()> {
    debug!("event=notify_exec module=notify status=start program={program}");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| NotifyError::Spawn { program, source })?;

    if output.status.success() {
        return Ok(());
    }
    Err(NotifyError::CommandFailed {
        program,
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{
        notification_backend, BackendKind, GobjectNotificationBackend, GrowlNotificationBackend,
        PynotifyNotificationBackend,
    };
    use notify_rust::Timeout;
    use crate::config::ConfigError;
    use crate::model::notification::Notification;
    use std::path::PathBuf;

    fn notification(sticky: bool) -> Notification {
        Notification {
            summary: "Bugwarrior".to_string(),
            body: "Create task: towel".to_string(),
            icon: PathBuf::from("/cache/bugwarrior/logo.png"),
            sticky,
        }
    }

    #[test]
    fn selects_each_known_backend_by_name() {
        for name in ["growlnotify", "pynotify", "gobject"] {
            let backend = notification_backend(name).expect("known backend");
            assert_eq!(backend.name(), name);
        }
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let err = BackendKind::parse("carrier-pigeon").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownBackend(name) if name == "carrier-pigeon"));
        assert!(notification_backend("").is_err());
    }

    #[test]
    fn growl_marks_sticky_notifications() {
        let args = GrowlNotificationBackend::args(&notification(true));
        assert!(args.contains(&"-s".to_string()));
        assert!(args.contains(&"/cache/bugwarrior/logo.png".to_string()));

        let args = GrowlNotificationBackend::args(&notification(false));
        assert!(!args.contains(&"-s".to_string()));
    }

    #[test]
    fn libnotify_puts_summary_and_body_last() {
        let args = PynotifyNotificationBackend::args(&notification(true));
        let tail = &args[args.len() - 2..];
        assert_eq!(tail, ["Bugwarrior", "Create task: towel"]);
        assert!(args.windows(2).any(|pair| pair == ["-u", "critical"]));
    }

    #[test]
    fn desktop_message_never_expires_when_sticky() {
        let message = GobjectNotificationBackend::message(&notification(true));
        assert_eq!(message.timeout, Timeout::Never);
        assert_eq!(message.appname, "Bugwarrior");
        assert_eq!(message.summary, "Bugwarrior");
        assert_eq!(message.body, "Create task: towel");
        assert_eq!(message.icon, "/cache/bugwarrior/logo.png");
    }

    #[test]
    fn desktop_message_uses_server_expiry_when_not_sticky() {
        let message = GobjectNotificationBackend::message(&notification(false));
        assert_eq!(message.timeout, Timeout::Default);
        assert_eq!(message.body, "Create task: towel");
    }

    #[test]
    fn backend_names_match_exactly() {
        for name in ["gobject ", " pynotify", "GrowlNotify"] {
            assert!(
                matches!(BackendKind::parse(name), Err(ConfigError::UnknownBackend(ref unknown)) if unknown == name),
                "{name:?} should be unknown"
            );
        }
    }
}
