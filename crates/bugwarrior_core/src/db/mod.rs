//! Local task store: SQLite bootstrap and schema upgrades.
//!
//! Connections handed out here are always at [`SCHEMA_VERSION`]; failures are
//! reported as [`RepoError`](crate::repo::task_repo::RepoError) like every
//! other store failure.

mod open;
mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::SCHEMA_VERSION;
