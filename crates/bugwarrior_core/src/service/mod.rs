//! Task use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations with confirmation and notification policy.
//! - Keep CLI callers decoupled from storage details.

pub mod merge;
pub mod prompt;
pub mod sync;
pub mod task_mutator;
