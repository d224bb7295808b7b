//! Domain model for synced tasks and the notifications they produce.
//!
//! # Responsibility
//! - Define canonical data structures used by mutation and notification logic.
//!
//! # Invariants
//! - Every stored task is identified by a stable `TaskId`.
//! - Notifications are plain values with no identity beyond their fields.

pub mod notification;
pub mod task;
