//! Desktop notifications for sync events.
//!
//! # Responsibility
//! - Format task-change and sync-summary notifications.
//! - Dispatch named events to the configured backend.
//!
//! # Invariants
//! - One event produces at most one notification per subscribed notifier.
//! - Backend failures propagate to whoever emitted the event.

pub mod backend;
pub mod events;
pub mod notifier;
pub mod setup;

use std::path::PathBuf;

/// Location of the cached logo used as notification icon.
///
/// `$XDG_CACHE_HOME/bugwarrior/logo.png`, else `~/.cache/bugwarrior/logo.png`.
/// The file itself is optional; backends fall back to no icon.
pub fn logo_path() -> PathBuf {
    let cache_dir = std::env::var_os("XDG_CACHE_HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"));
    cache_dir.join("bugwarrior").join("logo.png")
}
