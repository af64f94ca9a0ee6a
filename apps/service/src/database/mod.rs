/// Record store
///
/// Persists target identities and the append-only observation log
/// behind the [`RecordStore`] trait. The shipped backend is libSQL.

pub mod repository;
pub mod migrations;
pub mod models;

pub use models::{NewObservation, Observation, Target};
pub use repository::{LibsqlStore, RecordStore};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
